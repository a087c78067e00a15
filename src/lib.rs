//! # archdiag
//!
//! Turn a source file into an architecture diagram, pseudocode and PlantUML
//! by submitting it to a remote asynchronous workflow and polling for the
//! result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source file
//!  │
//!  ├─ 1. Input    read the file, require non-empty UTF-8
//!  ├─ 2. Encode   bytes → base64
//!  ├─ 3. Submit   POST to the workflow, receive an execution handle
//!  ├─ 4. Poll     query status every 2 s until SUCCEEDED or a failure
//!  └─ 5. Fetch    download pseudocode + PlantUML; diagram returned by URL
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use archdiag::{generate, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://api.example.com/prod")
//!         .build()?;
//!     let output = generate("service.py", &config).await?;
//!     println!("diagram: {}", output.result.diagram_url);
//!     println!("{}", output.result.uml_code);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `archdiag` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod poller;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{HttpBackend, WorkflowBackend};
pub use config::{ClientConfig, ClientConfigBuilder, PollPolicy};
pub use error::ArchDiagError;
pub use generate::{
    download_to_dir, generate, generate_from_bytes, generate_sync, generate_to_dir, resume, status,
};
pub use output::{
    ArtifactKind, ArtifactUrls, ExecutionHandle, ExecutionResult, ExecutionStatus,
    GenerationOutput, PollStats, StatusReport,
};
pub use pipeline::artifacts::WrittenArtifacts;
pub use pipeline::uml::derive_uml;
pub use poller::{poll, Poller};
pub use progress::{ExecutionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use tokio_util::sync::CancellationToken;
