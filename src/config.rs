//! Configuration types for submitting and polling workflow executions.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The poll loop itself only sees the narrower
//! [`PollPolicy`] derived from it.

use crate::backend::WorkflowBackend;
use crate::error::ArchDiagError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Environment variable consulted when no base URL is configured.
pub const ENDPOINT_ENV: &str = "ARCHDIAG_ENDPOINT";

/// Configuration for one client session.
///
/// # Example
/// ```rust
/// use archdiag::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com/prod")
///     .poll_interval_ms(2000)
///     .max_poll_attempts(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the workflow API, e.g. `https://host/prod`.
    /// If None, read from `ARCHDIAG_ENDPOINT`.
    pub base_url: Option<String>,

    /// Path of the submission endpoint relative to `base_url`. Default: `generate`.
    pub submit_path: String,

    /// Path of the status endpoint relative to `base_url`. Default: `execution-status`.
    pub status_path: String,

    /// Delay between a `RUNNING` answer and the next status query. Default: 2000.
    ///
    /// The delay is measured from the moment the previous answer was
    /// classified, so queries for one execution never overlap.
    pub poll_interval_ms: u64,

    /// Give up after this many status queries. Default: None (no cap).
    pub max_poll_attempts: Option<u32>,

    /// Give up once polling has run this long. Default: 900 (15 minutes).
    ///
    /// `None` polls until a terminal status is observed.
    pub poll_timeout_secs: Option<u64>,

    /// Per-request HTTP timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Pre-constructed backend. Takes precedence over `base_url`.
    pub backend: Option<Arc<dyn WorkflowBackend>>,

    /// Receives submission, poll and artifact events.
    pub progress_callback: Option<ProgressCallback>,

    /// Cancelling this token stops polling at the next await point.
    pub cancel_token: CancellationToken,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            submit_path: "generate".to_string(),
            status_path: "execution-status".to_string(),
            poll_interval_ms: 2000,
            max_poll_attempts: None,
            poll_timeout_secs: Some(900),
            request_timeout_secs: 30,
            backend: None,
            progress_callback: None,
            cancel_token: CancellationToken::new(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("submit_path", &self.submit_path)
            .field("status_path", &self.status_path)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn WorkflowBackend>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExecutionProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// The poll policy described by this configuration.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
            max_elapsed: self.poll_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Base URL from the config, falling back to `ARCHDIAG_ENDPOINT`.
    pub fn resolve_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| std::env::var(ENDPOINT_ENV).ok())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn submit_path(mut self, path: impl Into<String>) -> Self {
        self.config.submit_path = path.into();
        self
    }

    pub fn status_path(mut self, path: impl Into<String>) -> Self {
        self.config.status_path = path.into();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(100);
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = Some(n.max(1));
        self
    }

    /// `None` disables the elapsed-time bound.
    pub fn poll_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.poll_timeout_secs = secs;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn WorkflowBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.config.cancel_token = token;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ArchDiagError> {
        let c = &self.config;
        if let Some(ref url) = c.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ArchDiagError::InvalidConfig(format!(
                    "base URL must start with http:// or https://, got '{url}'"
                )));
            }
        }
        if c.submit_path.trim_matches('/').is_empty() || c.status_path.trim_matches('/').is_empty()
        {
            return Err(ArchDiagError::InvalidConfig(
                "submit and status paths must not be empty".into(),
            ));
        }
        if c.poll_timeout_secs == Some(0) {
            return Err(ArchDiagError::InvalidConfig(
                "poll timeout must be ≥ 1s (use None for no limit)".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Bounds and pacing of one poll chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between a `RUNNING` answer and the next query.
    pub interval: Duration,
    /// Maximum number of status queries, if any.
    pub max_attempts: Option<u32>,
    /// Maximum polling time, if any.
    pub max_elapsed: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        ClientConfig::default().poll_policy()
    }
}

impl PollPolicy {
    /// Poll every `interval` until a terminal status, with no cap.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            max_elapsed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_workflow() {
        let c = ClientConfig::default();
        assert_eq!(c.submit_path, "generate");
        assert_eq!(c.status_path, "execution-status");
        assert_eq!(c.poll_interval_ms, 2000);
        assert_eq!(c.max_poll_attempts, None);
        assert_eq!(c.poll_timeout_secs, Some(900));
    }

    #[test]
    fn poll_policy_from_config() {
        let c = ClientConfig::builder()
            .poll_interval_ms(500)
            .max_poll_attempts(4)
            .poll_timeout_secs(None)
            .build()
            .unwrap();
        let p = c.poll_policy();
        assert_eq!(p.interval, Duration::from_millis(500));
        assert_eq!(p.max_attempts, Some(4));
        assert_eq!(p.max_elapsed, None);
    }

    #[test]
    fn builder_clamps_interval_and_attempts() {
        let c = ClientConfig::builder()
            .poll_interval_ms(0)
            .max_poll_attempts(0)
            .build()
            .unwrap();
        assert_eq!(c.poll_interval_ms, 100);
        assert_eq!(c.max_poll_attempts, Some(1));
    }

    #[test]
    fn builder_rejects_non_http_base_url() {
        let err = ClientConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ArchDiagError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_paths() {
        let err = ClientConfig::builder().status_path("/").build().unwrap_err();
        assert!(matches!(err, ArchDiagError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = ClientConfig::builder()
            .poll_timeout_secs(Some(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ArchDiagError::InvalidConfig(_)));
    }

    #[test]
    fn explicit_base_url_wins() {
        let c = ClientConfig::builder()
            .base_url("https://api.example.com/prod")
            .build()
            .unwrap();
        assert_eq!(
            c.resolve_base_url().as_deref(),
            Some("https://api.example.com/prod")
        );
    }

    #[test]
    fn unbounded_policy_has_no_limits() {
        let p = PollPolicy::unbounded(Duration::from_secs(2));
        assert!(p.max_attempts.is_none());
        assert!(p.max_elapsed.is_none());
    }
}
