//! The execution poller: drive one handle to a terminal state.
//!
//! ## State machine
//!
//! ```text
//!             status query
//! PENDING ───────────────────▶ RUNNING ──(sleep interval)──┐
//!    │                           ▲                         │
//!    │                           └─────── status query ◀───┘
//!    ├──▶ SUCCEEDED  fetch pseudocode, fetch UML, return result
//!    └──▶ FAILED     any other status, HTTP error or malformed body
//! ```
//!
//! The next query is issued only after the previous answer has been
//! classified and the interval has elapsed, so one handle never has two
//! queries in flight. Nothing is retried: every error is terminal.
//!
//! ## Bounds
//!
//! [`PollPolicy`] caps the number of queries and the elapsed time; either
//! bound may be `None`. A [`CancellationToken`] stops the loop during the
//! sleep or an in-flight status query.

use crate::backend::WorkflowBackend;
use crate::config::PollPolicy;
use crate::error::ArchDiagError;
use crate::output::{ArtifactKind, ExecutionHandle, ExecutionResult, ExecutionStatus, PollStats};
use crate::pipeline::artifacts;
use crate::progress::ProgressCallback;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls executions through a [`WorkflowBackend`].
///
/// A `Poller` holds no per-execution state; one instance can drive any
/// number of handles, one after another or concurrently.
#[derive(Clone)]
pub struct Poller {
    backend: Arc<dyn WorkflowBackend>,
    policy: PollPolicy,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl Poller {
    pub fn new(backend: Arc<dyn WorkflowBackend>, policy: PollPolicy) -> Self {
        Self {
            backend,
            policy,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, cb: Option<ProgressCallback>) -> Self {
        self.progress = cb;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll `handle` until it succeeds or fails, then fetch the text
    /// artifacts.
    ///
    /// # Errors
    /// - [`ArchDiagError::ExecutionFailed`] — terminal status other than
    ///   `SUCCEEDED`; carries the server's `errorMessage` verbatim
    /// - [`ArchDiagError::RequestFailed`] / [`ArchDiagError::MalformedResponse`]
    ///   — the status query itself failed
    /// - [`ArchDiagError::ArtifactFetchFailed`] — the execution succeeded but
    ///   a document could not be downloaded
    /// - [`ArchDiagError::PollTimeout`] / [`ArchDiagError::Cancelled`]
    pub async fn poll(&self, handle: &ExecutionHandle) -> Result<ExecutionResult, ArchDiagError> {
        let result = self.run(handle).await;
        if let (Err(e), Some(cb)) = (&result, &self.progress) {
            cb.on_failed(&e.to_string());
        }
        result
    }

    async fn run(&self, handle: &ExecutionHandle) -> Result<ExecutionResult, ArchDiagError> {
        let start = Instant::now();
        let mut attempts = 0u32;
        info!(
            "Polling execution {} every {}ms",
            handle,
            self.policy.interval.as_millis()
        );

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(handle, attempts));
            }

            attempts += 1;
            let report = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(handle, attempts)),
                report = self.backend.status(handle) => report?,
            };
            debug!("Execution {}: query {} → {}", handle, attempts, report.status);

            if let Some(ref cb) = self.progress {
                cb.on_poll(attempts, &report.status);
            }

            match report.status {
                ExecutionStatus::Succeeded => {
                    let urls = report.output.ok_or_else(|| ArchDiagError::MalformedResponse {
                        context: "status",
                        detail: "SUCCEEDED without output".into(),
                    })?;
                    let poll_duration_ms = start.elapsed().as_millis() as u64;
                    info!(
                        "Execution {} succeeded after {} queries ({}ms)",
                        handle, attempts, poll_duration_ms
                    );
                    if let Some(ref cb) = self.progress {
                        cb.on_succeeded(attempts);
                    }

                    let fetch_start = Instant::now();
                    let backend = self.backend.as_ref();
                    let progress = self.progress.as_ref();
                    let pseudocode = artifacts::fetch_text_artifact(
                        backend,
                        ArtifactKind::Pseudocode,
                        &urls.pseudocode_url,
                        progress,
                    )
                    .await?;
                    let uml_code = artifacts::fetch_text_artifact(
                        backend,
                        ArtifactKind::UmlCode,
                        &urls.uml_code_url,
                        progress,
                    )
                    .await?;

                    return Ok(ExecutionResult {
                        handle: handle.clone(),
                        diagram_url: urls.svg_diagram_url.clone(),
                        pseudocode,
                        uml_code,
                        urls,
                        stats: PollStats {
                            status_queries: attempts,
                            poll_duration_ms,
                            fetch_duration_ms: fetch_start.elapsed().as_millis() as u64,
                        },
                    });
                }
                ExecutionStatus::Running => {
                    if self.limit_reached(attempts, start) {
                        warn!(
                            "Execution {} still running after {} queries; giving up",
                            handle, attempts
                        );
                        return Err(ArchDiagError::PollTimeout {
                            handle: handle.to_string(),
                            attempts,
                            elapsed_ms: start.elapsed().as_millis() as u64,
                        });
                    }
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(self.cancelled(handle, attempts)),
                        _ = sleep(self.policy.interval) => {}
                    }
                }
                ExecutionStatus::Other(status) => {
                    let message = report
                        .error_message
                        .unwrap_or_else(|| format!("Execution ended with status {status}"));
                    warn!("Execution {} ended with {}: {}", handle, status, message);
                    return Err(ArchDiagError::ExecutionFailed { status, message });
                }
            }
        }
    }

    /// Whether another query would exceed the policy.
    ///
    /// The elapsed-time bound is checked against the moment the next query
    /// would be issued, so the loop never sleeps only to give up afterwards.
    fn limit_reached(&self, attempts: u32, start: Instant) -> bool {
        if let Some(max) = self.policy.max_attempts {
            if attempts >= max {
                return true;
            }
        }
        if let Some(max) = self.policy.max_elapsed {
            if start.elapsed() + self.policy.interval > max {
                return true;
            }
        }
        false
    }

    fn cancelled(&self, handle: &ExecutionHandle, attempts: u32) -> ArchDiagError {
        info!("Polling of execution {} cancelled", handle);
        ArchDiagError::Cancelled {
            handle: handle.to_string(),
            attempts,
        }
    }
}

/// Poll `handle` with `policy` and no cancellation or progress reporting.
pub async fn poll(
    backend: Arc<dyn WorkflowBackend>,
    handle: &ExecutionHandle,
    policy: PollPolicy,
) -> Result<ExecutionResult, ArchDiagError> {
    Poller::new(backend, policy).poll(handle).await
}
