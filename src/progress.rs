//! Progress-callback trait for execution events.
//!
//! Inject an [`Arc<dyn ExecutionProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to observe a run
//! as it moves from submission through polling to artifact download.
//!
//! # Example
//!
//! ```rust
//! use archdiag::{ClientConfig, ExecutionProgressCallback, ExecutionStatus};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct CountingCallback {
//!     polls: AtomicU32,
//! }
//!
//! impl ExecutionProgressCallback for CountingCallback {
//!     fn on_poll(&self, attempt: u32, status: &ExecutionStatus) {
//!         self.polls.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("query #{attempt}: {status}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { polls: AtomicU32::new(0) });
//!
//! let config = ClientConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExecutionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{ArtifactKind, ExecutionHandle, ExecutionStatus};
use std::sync::Arc;

/// Called by the client as an execution progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for one execution arrive in order: one
/// `on_submitted`, one `on_poll` per status query, then either
/// `on_succeeded` followed by `on_artifact_fetched` per download, or
/// `on_failed`.
pub trait ExecutionProgressCallback: Send + Sync {
    /// The workflow accepted the submission.
    fn on_submitted(&self, handle: &ExecutionHandle) {
        let _ = handle;
    }

    /// A status query returned.
    ///
    /// # Arguments
    /// * `attempt` — 1-indexed number of this status query
    /// * `status`  — the reported status
    fn on_poll(&self, attempt: u32, status: &ExecutionStatus) {
        let _ = (attempt, status);
    }

    /// The execution reached `SUCCEEDED` after `attempts` status queries.
    fn on_succeeded(&self, attempts: u32) {
        let _ = attempts;
    }

    /// An artifact was downloaded.
    fn on_artifact_fetched(&self, kind: ArtifactKind, bytes: usize) {
        let _ = (kind, bytes);
    }

    /// The run stopped with an error; `message` is human-readable.
    fn on_failed(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExecutionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn ExecutionProgressCallback>;
