//! Error types for the archdiag library.
//!
//! Every failure is terminal for the execution it belongs to: nothing is
//! retried automatically. The variants follow the order in which a run can
//! fail:
//!
//! * **Input** — the local source file cannot be used (missing, unreadable,
//!   empty, not UTF-8).
//! * **Submission** — the workflow endpoint refused the upload.
//! * **Polling** — the status endpoint was unreachable, answered with a
//!   non-success HTTP status, reported a failed execution, or the poll
//!   policy ran out of attempts or time.
//! * **Artifacts** — a generated document could not be downloaded.
//! * **Output** — the artifacts could not be written to disk.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the archdiag library.
#[derive(Debug, Error)]
pub enum ArchDiagError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other read failure (a directory, an I/O error).
    #[error("Failed to read source file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but holds no bytes; the workflow rejects empty content.
    #[error("Source file '{path}' is empty; select a file with code in it.")]
    EmptyInput { path: PathBuf },

    /// The workflow decodes submissions as UTF-8 text.
    #[error("Source file '{path}' is not valid UTF-8 (first invalid byte at offset {offset})")]
    NotUtf8 { path: PathBuf, offset: usize },

    // ── Endpoint errors ───────────────────────────────────────────────────
    /// The configured base URL cannot be parsed or joined with a path.
    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The submission endpoint answered with a non-success HTTP status.
    #[error("Submission rejected (HTTP {status}): {message}")]
    SubmissionRejected { status: u16, message: String },

    /// The request never produced a usable response (DNS, TLS, timeout,
    /// non-success status on a status query).
    #[error("Request to '{url}' failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The execution reached a terminal state other than `SUCCEEDED`.
    ///
    /// `message` is the server-provided `errorMessage`, verbatim.
    #[error("{message}")]
    ExecutionFailed { status: String, message: String },

    /// A response body did not have the expected shape.
    #[error("Malformed {context} response: {detail}")]
    MalformedResponse { context: &'static str, detail: String },

    // ── Polling limits ────────────────────────────────────────────────────
    /// The execution was still `RUNNING` when the poll policy ran out.
    #[error("Execution '{handle}' still running after {attempts} status queries ({elapsed_ms}ms)\nIncrease --timeout or --max-attempts, or resume later with --resume.")]
    PollTimeout {
        handle: String,
        attempts: u32,
        elapsed_ms: u64,
    },

    /// Polling was cancelled through its `CancellationToken`.
    #[error("Polling of execution '{handle}' was cancelled after {attempts} status queries")]
    Cancelled { handle: String, attempts: u32 },

    // ── Artifact errors ───────────────────────────────────────────────────
    /// A generated document could not be downloaded.
    #[error("Failed to fetch artifact '{url}': {reason}")]
    ArtifactFetchFailed { url: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArchDiagError {
    /// The server-provided message for failures reported by the workflow,
    /// if this error carries one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ArchDiagError::SubmissionRejected { message, .. }
            | ArchDiagError::ExecutionFailed { message, .. } => Some(message),
            _ => None,
        }
    }
}
