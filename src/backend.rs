//! The remote side of the workflow: submission, status and artifact storage.
//!
//! [`WorkflowBackend`] is the seam between the poll loop and the network.
//! [`HttpBackend`] talks to the real API with [`reqwest`]; tests and embedders
//! can inject any other implementation through
//! [`crate::config::ClientConfigBuilder::backend`].
//!
//! ## Wire format
//!
//! ```text
//! POST {base}/generate            {"code_content": "<base64>"}
//!   2xx → {"executionArn": "..."}
//!   4xx/5xx → {"errorMessage": "..."}
//!
//! GET  {base}/execution-status?executionArn=<handle>
//!   → {"status": "RUNNING" | "SUCCEEDED" | ..., "output": "<json>", "errorMessage": "..."}
//! ```
//!
//! `output` is a JSON document serialised into a string by the workflow
//! service; an inline object is accepted too.

use crate::config::ClientConfig;
use crate::error::ArchDiagError;
use crate::output::{ArtifactUrls, ExecutionHandle, ExecutionStatus, StatusReport};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Remote operations needed to run one execution end to end.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// Submit base64-encoded source and return the execution handle.
    async fn submit(&self, code_content: &str) -> Result<ExecutionHandle, ArchDiagError>;

    /// Issue exactly one status query for `handle`.
    async fn status(&self, handle: &ExecutionHandle) -> Result<StatusReport, ArchDiagError>;

    /// Download a text artifact.
    async fn fetch_text(&self, url: &str) -> Result<String, ArchDiagError>;

    /// Download a binary artifact.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ArchDiagError>;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SubmitRequest<'a> {
    code_content: &'a str,
}

#[derive(Deserialize)]
struct SubmitBody {
    #[serde(rename = "executionArn")]
    execution_arn: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct StatusBody {
    status: Option<String>,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

/// Interpret a submission response.
pub fn parse_submit_response(status: u16, body: &str) -> Result<ExecutionHandle, ArchDiagError> {
    let parsed: Option<SubmitBody> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let message = parsed
            .and_then(|b| b.error_message)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(ArchDiagError::SubmissionRejected { status, message });
    }

    let parsed = parsed.ok_or_else(|| ArchDiagError::MalformedResponse {
        context: "submission",
        detail: format!("body is not JSON: {}", truncate(body, 120)),
    })?;

    match parsed.execution_arn {
        Some(arn) if !arn.is_empty() => Ok(ExecutionHandle::new(arn)),
        _ => Err(ArchDiagError::MalformedResponse {
            context: "submission",
            detail: "missing executionArn".into(),
        }),
    }
}

/// Interpret a status response.
///
/// Non-success HTTP codes and bodies that cannot be classified are errors;
/// a well-formed body with a failed status is returned as a report so the
/// poll loop can surface its `errorMessage`.
pub fn parse_status_response(
    url: &str,
    status: u16,
    body: &str,
) -> Result<StatusReport, ArchDiagError> {
    let parsed: Option<StatusBody> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let detail = parsed
            .and_then(|b| b.error_message)
            .unwrap_or_else(|| truncate(body, 200));
        return Err(ArchDiagError::RequestFailed {
            url: url.to_string(),
            reason: format!("HTTP {status}: {detail}"),
        });
    }

    let parsed = parsed.ok_or_else(|| ArchDiagError::MalformedResponse {
        context: "status",
        detail: format!("body is not JSON: {}", truncate(body, 120)),
    })?;

    let raw_status = parsed.status.ok_or_else(|| ArchDiagError::MalformedResponse {
        context: "status",
        detail: "missing status field".into(),
    })?;
    let exec_status = ExecutionStatus::parse(&raw_status);

    let output = match exec_status {
        ExecutionStatus::Succeeded => {
            let value = parsed.output.ok_or_else(|| ArchDiagError::MalformedResponse {
                context: "status",
                detail: "SUCCEEDED without output".into(),
            })?;
            Some(parse_output(value)?)
        }
        _ => None,
    };

    Ok(StatusReport {
        status: exec_status,
        output,
        error_message: parsed.error_message,
    })
}

fn parse_output(value: serde_json::Value) -> Result<ArtifactUrls, ArchDiagError> {
    let result = match value {
        serde_json::Value::String(s) => serde_json::from_str::<ArtifactUrls>(&s),
        other => serde_json::from_value::<ArtifactUrls>(other),
    };
    result.map_err(|e| ArchDiagError::MalformedResponse {
        context: "execution output",
        detail: e.to_string(),
    })
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

// ── HTTP implementation ──────────────────────────────────────────────────

/// [`WorkflowBackend`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    submit_url: Url,
    status_url: Url,
}

impl HttpBackend {
    /// Build a backend rooted at `base_url`.
    ///
    /// `base_url` may or may not end with `/`; the paths are always joined
    /// underneath it (`https://host/prod` + `generate` → `https://host/prod/generate`).
    pub fn new(
        base_url: &str,
        submit_path: &str,
        status_path: &str,
        request_timeout: Duration,
    ) -> Result<Self, ArchDiagError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ArchDiagError::Internal(format!("HTTP client: {e}")))?;
        Self::with_client(client, base_url, submit_path, status_path)
    }

    /// Build a backend reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        submit_path: &str,
        status_path: &str,
    ) -> Result<Self, ArchDiagError> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/'))).map_err(|e| {
            ArchDiagError::InvalidEndpoint {
                url: base_url.to_string(),
                reason: e.to_string(),
            }
        })?;
        let join = |path: &str| {
            base.join(path.trim_start_matches('/'))
                .map_err(|e| ArchDiagError::InvalidEndpoint {
                    url: format!("{base}{path}"),
                    reason: e.to_string(),
                })
        };
        Ok(Self {
            submit_url: join(submit_path)?,
            status_url: join(status_path)?,
            client,
        })
    }

    /// Build a backend from the endpoint settings in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ArchDiagError> {
        let base = config.resolve_base_url().ok_or_else(|| {
            ArchDiagError::InvalidConfig(format!(
                "no workflow endpoint configured; pass --endpoint or set {}",
                crate::config::ENDPOINT_ENV
            ))
        })?;
        Self::new(
            &base,
            &config.submit_path,
            &config.status_path,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn submit_url(&self) -> &Url {
        &self.submit_url
    }

    /// Status URL for `handle`, with the handle form-encoded as `executionArn`.
    pub fn status_url_for(&self, handle: &ExecutionHandle) -> Url {
        let mut url = self.status_url.clone();
        url.query_pairs_mut()
            .append_pair("executionArn", handle.as_str());
        url
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response, ArchDiagError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ArchDiagError::ArtifactFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(ArchDiagError::ArtifactFetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl WorkflowBackend for HttpBackend {
    async fn submit(&self, code_content: &str) -> Result<ExecutionHandle, ArchDiagError> {
        let url = self.submit_url.as_str();
        debug!("POST {} ({} bytes base64)", url, code_content.len());

        let response = self
            .client
            .post(self.submit_url.clone())
            .json(&SubmitRequest { code_content })
            .send()
            .await
            .map_err(|e| ArchDiagError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ArchDiagError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        parse_submit_response(status, &body)
    }

    async fn status(&self, handle: &ExecutionHandle) -> Result<StatusReport, ArchDiagError> {
        let url = self.status_url_for(handle);
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ArchDiagError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ArchDiagError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        parse_status_response(url.as_str(), status, &body)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ArchDiagError> {
        self.get_ok(url)
            .await?
            .text()
            .await
            .map_err(|e| ArchDiagError::ArtifactFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ArchDiagError> {
        let bytes = self
            .get_ok(url)
            .await?
            .bytes()
            .await
            .map_err(|e| ArchDiagError::ArtifactFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, "generate", "execution-status", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn paths_join_under_base_with_or_without_slash() {
        let a = backend("https://api.example.com/prod");
        let b = backend("https://api.example.com/prod/");
        assert_eq!(a.submit_url().as_str(), "https://api.example.com/prod/generate");
        assert_eq!(a.submit_url(), b.submit_url());
    }

    #[test]
    fn status_url_encodes_handle() {
        let b = backend("https://api.example.com/prod");
        let url = b.status_url_for(&ExecutionHandle::new(
            "arn:aws:states:us-east-1:123:execution:gen:run 1",
        ));
        assert_eq!(
            url.as_str(),
            "https://api.example.com/prod/execution-status?executionArn=arn%3Aaws%3Astates%3Aus-east-1%3A123%3Aexecution%3Agen%3Arun+1"
        );
        let (k, v) = url.query_pairs().next().unwrap();
        assert_eq!(k, "executionArn");
        assert_eq!(v, "arn:aws:states:us-east-1:123:execution:gen:run 1");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpBackend::new("not a url", "generate", "status", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ArchDiagError::InvalidEndpoint { .. }));
    }

    #[test]
    fn submit_success_yields_handle() {
        let h = parse_submit_response(200, r#"{"executionArn":"exec-1"}"#).unwrap();
        assert_eq!(h.as_str(), "exec-1");
    }

    #[test]
    fn submit_error_uses_server_message() {
        let err = parse_submit_response(400, r#"{"errorMessage":"No code_content provided"}"#)
            .unwrap_err();
        match err {
            ArchDiagError::SubmissionRejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No code_content provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn submit_error_falls_back_to_raw_body() {
        let err = parse_submit_response(502, "Bad Gateway").unwrap_err();
        assert_eq!(err.server_message(), Some("Bad Gateway"));
    }

    #[test]
    fn submit_success_without_handle_is_malformed() {
        let err = parse_submit_response(200, "{}").unwrap_err();
        assert!(matches!(err, ArchDiagError::MalformedResponse { .. }));
    }

    #[test]
    fn status_running() {
        let r = parse_status_response("u", 200, r#"{"status":"RUNNING"}"#).unwrap();
        assert_eq!(r.status, ExecutionStatus::Running);
        assert!(r.output.is_none());
    }

    #[test]
    fn status_succeeded_with_string_output() {
        let body = r#"{"status":"SUCCEEDED","output":"{\"svg_diagram_url\":\"a\",\"pseudocode_url\":\"b\",\"uml_code_url\":\"c\"}"}"#;
        let r = parse_status_response("u", 200, body).unwrap();
        assert_eq!(r.status, ExecutionStatus::Succeeded);
        let out = r.output.unwrap();
        assert_eq!(out.svg_diagram_url, "a");
        assert_eq!(out.pseudocode_url, "b");
        assert_eq!(out.uml_code_url, "c");
    }

    #[test]
    fn status_succeeded_with_object_output() {
        let body = r#"{"status":"SUCCEEDED","output":{"svg_diagram_url":"a","pseudocode_url":"b","uml_code_url":"c"}}"#;
        let r = parse_status_response("u", 200, body).unwrap();
        assert_eq!(r.output.unwrap().uml_code_url, "c");
    }

    #[test]
    fn status_succeeded_with_bad_output_is_malformed() {
        let body = r#"{"status":"SUCCEEDED","output":"{\"svg_diagram_url\":\"a\"}"}"#;
        let err = parse_status_response("u", 200, body).unwrap_err();
        assert!(matches!(err, ArchDiagError::MalformedResponse { .. }));
    }

    #[test]
    fn status_failed_keeps_error_message() {
        let r = parse_status_response("u", 200, r#"{"status":"FAILED","errorMessage":"bad input"}"#)
            .unwrap();
        assert_eq!(r.status, ExecutionStatus::Other("FAILED".into()));
        assert_eq!(r.error_message.as_deref(), Some("bad input"));
    }

    #[test]
    fn status_http_error_is_request_failure() {
        let err = parse_status_response(
            "https://x/execution-status",
            500,
            r#"{"errorMessage":"Internal server error"}"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HTTP 500"), "got: {msg}");
        assert!(msg.contains("Internal server error"), "got: {msg}");
    }

    #[test]
    fn status_without_status_field_is_malformed() {
        let err = parse_status_response("u", 200, r#"{"errorMessage":"x"}"#).unwrap_err();
        assert!(matches!(err, ArchDiagError::MalformedResponse { .. }));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé\u{2026}");
        assert_eq!(truncate("  ok  ", 10), "ok");
    }
}
