//! End-to-end entry points: source file in, artifacts out.
//!
//! [`generate`] runs every stage for one file. [`resume`] and [`status`]
//! operate on an execution submitted earlier, identified by its handle.

use crate::backend::{HttpBackend, WorkflowBackend};
use crate::config::ClientConfig;
use crate::error::ArchDiagError;
use crate::output::{ExecutionHandle, ExecutionResult, GenerationOutput, StatusReport};
use crate::pipeline::artifacts::{self, WrittenArtifacts};
use crate::pipeline::{encode, input, submit};
use crate::poller::Poller;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Submit a local source file and wait for its artifacts.
///
/// # Arguments
/// * `path`   — local source file
/// * `config` — client configuration
///
/// # Errors
/// Any stage failure is returned as-is: input validation, submission,
/// polling, or artifact download. Nothing is retried.
pub async fn generate(
    path: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<GenerationOutput, ArchDiagError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    info!("Starting generation: {}", path.display());

    // ── Step 1: Read and validate source ─────────────────────────────────
    let source = input::resolve_input(path).await?;

    // ── Step 2: Submit, poll, fetch ──────────────────────────────────────
    let result = run(&source.bytes, config).await?;

    Ok(GenerationOutput {
        source_bytes: source.len(),
        result,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    })
}

/// Submit in-memory source and wait for its artifacts.
///
/// Applies the same validation as a file on disk (non-empty, UTF-8).
pub async fn generate_from_bytes(
    bytes: &[u8],
    config: &ClientConfig,
) -> Result<GenerationOutput, ArchDiagError> {
    let total_start = Instant::now();
    input::validate_source(Path::new("<memory>"), bytes)?;
    let result = run(bytes, config).await?;
    Ok(GenerationOutput {
        source_bytes: bytes.len(),
        result,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    })
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    path: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<GenerationOutput, ArchDiagError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ArchDiagError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(path, config))
}

/// Generate and write `diagram.svg`, `pseudocode.txt` and `uml_code.puml`
/// into `dir`.
///
/// The diagram is downloaded only here; [`generate`] returns it by URL.
pub async fn generate_to_dir(
    path: impl AsRef<Path>,
    dir: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<(GenerationOutput, WrittenArtifacts), ArchDiagError> {
    let output = generate(path, config).await?;
    let written = download_to_dir(&output.result, dir.as_ref(), config).await?;
    Ok((output, written))
}

/// Download every artifact of a finished execution into `dir`.
pub async fn download_to_dir(
    result: &ExecutionResult,
    dir: &Path,
    config: &ClientConfig,
) -> Result<WrittenArtifacts, ArchDiagError> {
    let backend = resolve_backend(config)?;
    let diagram = artifacts::fetch_diagram(
        backend.as_ref(),
        &result.diagram_url,
        config.progress_callback.as_ref(),
    )
    .await?;
    artifacts::write_artifacts(dir, result, &diagram).await
}

/// Resume polling an execution submitted earlier.
pub async fn resume(
    handle: impl Into<ExecutionHandle>,
    config: &ClientConfig,
) -> Result<ExecutionResult, ArchDiagError> {
    let backend = resolve_backend(config)?;
    poller_for(backend, config).poll(&handle.into()).await
}

/// Issue a single status query without polling or fetching anything.
pub async fn status(
    handle: impl Into<ExecutionHandle>,
    config: &ClientConfig,
) -> Result<StatusReport, ArchDiagError> {
    let backend = resolve_backend(config)?;
    backend.status(&handle.into()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(bytes: &[u8], config: &ClientConfig) -> Result<ExecutionResult, ArchDiagError> {
    let backend = resolve_backend(config)?;

    let encoded = encode::encode_source(bytes);
    let handle =
        submit::submit_source(backend.as_ref(), &encoded, config.progress_callback.as_ref())
            .await?;

    poller_for(backend, config).poll(&handle).await
}

fn poller_for(backend: Arc<dyn WorkflowBackend>, config: &ClientConfig) -> Poller {
    Poller::new(backend, config.poll_policy())
        .with_cancel_token(config.cancel_token.clone())
        .with_progress(config.progress_callback.clone())
}

/// Resolve the backend, from most-specific to least-specific:
///
/// 1. **Pre-built backend** (`config.backend`), used as-is.
/// 2. **Base URL** (`config.base_url`, else `ARCHDIAG_ENDPOINT`) → [`HttpBackend`].
fn resolve_backend(config: &ClientConfig) -> Result<Arc<dyn WorkflowBackend>, ArchDiagError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    Ok(Arc::new(HttpBackend::from_config(config)?))
}
