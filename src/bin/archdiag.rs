//! CLI binary for archdiag.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ClientConfig` and prints results.

use anyhow::{Context, Result};
use archdiag::{
    derive_uml, generate, generate_to_dir, resume, status, ArtifactKind, CancellationToken,
    ClientConfig, ExecutionHandle, ExecutionProgressCallback, ExecutionResult, ExecutionStatus,
    ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner that tracks the status query count
/// and prints one line per milestone above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Submitting");
        bar.set_message("uploading source…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExecutionProgressCallback for CliProgressCallback {
    fn on_submitted(&self, handle: &ExecutionHandle) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold("Execution started"),
            dim(handle.as_str())
        ));
        self.bar.set_prefix("Waiting");
    }

    fn on_poll(&self, attempt: u32, status: &ExecutionStatus) {
        self.bar.set_message(format!("{status}  (query #{attempt})"));
    }

    fn on_succeeded(&self, attempts: u32) {
        self.bar.println(format!(
            "  {} Execution succeeded  {}",
            green("✓"),
            dim(&format!("{attempts} status queries"))
        ));
        self.bar.set_prefix("Fetching");
        self.bar.set_message("artifacts…");
    }

    fn on_artifact_fetched(&self, kind: ArtifactKind, bytes: usize) {
        self.bar.println(format!(
            "  {} {:<11} {}",
            green("✓"),
            kind.to_string(),
            dim(&format!("{bytes:>6} bytes"))
        ));
    }

    fn on_failed(&self, message: &str) {
        self.bar.finish_and_clear();
        // Truncate very long error messages to keep output tidy.
        let msg = match message.char_indices().nth(100) {
            Some((idx, _)) => format!("{}\u{2026}", &message[..idx]),
            None => message.to_string(),
        };
        eprintln!("{} {}", red("✘"), red(&msg));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Submit a file and print pseudocode + PlantUML (stdout)
  archdiag --endpoint https://abc123.execute-api.us-east-1.amazonaws.com/prod app.py

  # Save diagram.svg, pseudocode.txt and uml_code.puml
  archdiag app.py -o out/

  # Give up after 5 minutes instead of the default 15
  archdiag --timeout 300 app.py

  # Keep polling a previously submitted execution
  archdiag --resume arn:aws:states:us-east-1:123456789012:execution:gen:abc

  # Single status query, JSON output
  archdiag --status-only --json arn:aws:states:us-east-1:123456789012:execution:gen:abc

  # Derive PlantUML from a pseudocode file locally (no network)
  archdiag --derive-uml out/pseudocode.txt

ENVIRONMENT VARIABLES:
  ARCHDIAG_ENDPOINT       Base URL of the workflow API (…/prod)
  ARCHDIAG_OUTPUT_DIR     Default for --output-dir
  RUST_LOG                Override log filter (e.g. archdiag=debug)
"#;

/// Generate architecture diagrams from source code via a remote workflow.
#[derive(Parser, Debug)]
#[command(
    name = "archdiag",
    version,
    about = "Generate architecture diagrams, pseudocode and PlantUML from source code",
    long_about = "Submit a source file to the architecture-diagram workflow, wait for the \
execution to finish, and print or save the generated pseudocode, PlantUML and SVG diagram.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source file to submit (an execution handle with --resume/--status-only,
    /// a pseudocode file with --derive-uml).
    input: String,

    /// Base URL of the workflow API.
    #[arg(long, env = "ARCHDIAG_ENDPOINT")]
    endpoint: Option<String>,

    /// Write diagram.svg, pseudocode.txt and uml_code.puml into this directory.
    #[arg(short, long, env = "ARCHDIAG_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Delay between status queries while the execution is running.
    #[arg(long, env = "ARCHDIAG_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Stop after this many status queries.
    #[arg(long, env = "ARCHDIAG_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Stop polling after this many seconds (0 = wait indefinitely).
    #[arg(long, env = "ARCHDIAG_TIMEOUT", default_value_t = 900)]
    timeout: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "ARCHDIAG_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Treat INPUT as an execution handle and resume polling it.
    #[arg(long, conflicts_with_all = ["status_only", "derive_uml"])]
    resume: bool,

    /// Treat INPUT as an execution handle and print its current status.
    #[arg(long, conflicts_with = "derive_uml")]
    status_only: bool,

    /// Treat INPUT as a pseudocode file and print derived PlantUML.
    #[arg(long)]
    derive_uml: bool,

    /// Output structured JSON instead of text.
    #[arg(long, env = "ARCHDIAG_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ARCHDIAG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ARCHDIAG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ARCHDIAG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active;
    // it already reports every milestone.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.derive_uml;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Offline UML derivation ───────────────────────────────────────────
    if cli.derive_uml {
        let pseudocode = tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read pseudocode from {:?}", cli.input))?;
        let uml = derive_uml(&pseudocode);
        if cli.json {
            println!("{}", serde_json::json!({ "uml_code": uml }));
        } else {
            println!("{uml}");
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let progress = if show_progress && !cli.status_only {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let config = build_config(
        &cli,
        cancel,
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    // ── Status-only mode ─────────────────────────────────────────────────
    if cli.status_only {
        let report = status(cli.input.as_str(), &config)
            .await
            .context("Status query failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise status")?
            );
        } else {
            println!("Execution:  {}", cli.input);
            println!("Status:     {}", report.status);
            if let Some(ref msg) = report.error_message {
                println!("Error:      {}", msg);
            }
            if let Some(ref urls) = report.output {
                println!("Diagram:    {}", urls.svg_diagram_url);
                println!("Pseudocode: {}", urls.pseudocode_url);
                println!("PlantUML:   {}", urls.uml_code_url);
            }
        }
        return Ok(());
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let outcome = run(&cli, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let (result, written) = outcome?;

    if cli.json {
        let json = serde_json::json!({ "result": result, "written": written });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if let Some(written) = written {
        if !cli.quiet {
            eprintln!(
                "{}  {} status queries  {}ms  →  {}",
                green("✔"),
                result.stats.status_queries,
                result.stats.poll_duration_ms + result.stats.fetch_duration_ms,
                bold(
                    &written
                        .diagram
                        .parent()
                        .unwrap_or(written.diagram.as_path())
                        .display()
                        .to_string()
                ),
            );
            for path in [&written.diagram, &written.pseudocode, &written.uml_code] {
                eprintln!("   {}", dim(&path.display().to_string()));
            }
        }
    } else {
        print_result(&result).context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Run a fresh submission or resume an existing handle.
async fn run(
    cli: &Cli,
    config: &ClientConfig,
) -> Result<(ExecutionResult, Option<archdiag::WrittenArtifacts>)> {
    if cli.resume {
        let result = resume(cli.input.as_str(), config)
            .await
            .context("Polling failed")?;
        let written = match cli.output_dir {
            Some(ref dir) => Some(
                archdiag::download_to_dir(&result, dir, config)
                    .await
                    .context("Failed to save artifacts")?,
            ),
            None => None,
        };
        return Ok((result, written));
    }

    match cli.output_dir {
        Some(ref dir) => {
            let (output, written) = generate_to_dir(&cli.input, dir, config)
                .await
                .context("Generation failed")?;
            Ok((output.result, Some(written)))
        }
        None => {
            let output = generate(&cli.input, config)
                .await
                .context("Generation failed")?;
            Ok((output.result, None))
        }
    }
}

/// Print the diagram URL and both text artifacts to stdout.
fn print_result(result: &ExecutionResult) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "Diagram: {}", result.diagram_url)?;
    writeln!(handle)?;
    writeln!(handle, "── Pseudocode ──────────────────────────────────────────")?;
    write_block(&mut handle, &result.pseudocode)?;
    writeln!(handle)?;
    writeln!(handle, "── PlantUML ────────────────────────────────────────────")?;
    write_block(&mut handle, &result.uml_code)
}

fn write_block(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    // Ensure a trailing newline on stdout.
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(
    cli: &Cli,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .poll_interval_ms(cli.poll_interval_ms)
        .poll_timeout_secs(if cli.timeout == 0 {
            None
        } else {
            Some(cli.timeout)
        })
        .request_timeout_secs(cli.request_timeout)
        .cancel_token(cancel);

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.base_url(endpoint.clone());
    }
    if let Some(n) = cli.max_attempts {
        builder = builder.max_poll_attempts(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
