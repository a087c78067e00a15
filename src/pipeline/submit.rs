//! Submission: hand encoded source to the workflow and obtain a handle.

use crate::backend::WorkflowBackend;
use crate::error::ArchDiagError;
use crate::output::ExecutionHandle;
use crate::progress::ProgressCallback;
use tracing::{info, warn};

/// Submit base64-encoded source.
///
/// Failures are terminal; the caller decides whether to resubmit.
pub async fn submit_source(
    backend: &dyn WorkflowBackend,
    encoded: &str,
    progress: Option<&ProgressCallback>,
) -> Result<ExecutionHandle, ArchDiagError> {
    match backend.submit(encoded).await {
        Ok(handle) => {
            info!("Execution started: {}", handle);
            if let Some(cb) = progress {
                cb.on_submitted(&handle);
            }
            Ok(handle)
        }
        Err(e) => {
            warn!("Submission failed: {}", e);
            if let Some(cb) = progress {
                cb.on_failed(&e.to_string());
            }
            Err(e)
        }
    }
}
