//! Value types exchanged with the workflow and returned to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one in-flight execution.
///
/// Returned by the submission endpoint and used only to correlate status
/// queries. The wrapped string is never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ExecutionHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Status of an execution as reported by one status query.
///
/// Only `RUNNING` and `SUCCEEDED` are distinguished; every other value is
/// terminal and kept verbatim for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Other(String),
}

impl ExecutionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "RUNNING" => ExecutionStatus::Running,
            "SUCCEEDED" => ExecutionStatus::Succeeded,
            other => ExecutionStatus::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Running => f.write_str("RUNNING"),
            ExecutionStatus::Succeeded => f.write_str("SUCCEEDED"),
            ExecutionStatus::Other(s) => f.write_str(s),
        }
    }
}

/// The three artifact locators carried by a successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactUrls {
    pub svg_diagram_url: String,
    pub pseudocode_url: String,
    pub uml_code_url: String,
}

/// One classified answer from the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: ExecutionStatus,
    /// Present when `status` is `Succeeded`.
    pub output: Option<ArtifactUrls>,
    /// Server-provided `errorMessage`, if any.
    pub error_message: Option<String>,
}

/// The outcome of a successful execution, owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub handle: ExecutionHandle,
    /// Rendered diagram, returned by reference (never downloaded by the poller).
    pub diagram_url: String,
    /// Contents of the pseudocode artifact.
    pub pseudocode: String,
    /// Contents of the PlantUML artifact.
    pub uml_code: String,
    /// All three locators, for later download.
    pub urls: ArtifactUrls,
    pub stats: PollStats,
}

/// Timing and counters for one poll chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStats {
    /// Number of status queries issued.
    pub status_queries: u32,
    /// Wall-clock time from the first status query to the terminal one.
    pub poll_duration_ms: u64,
    /// Time spent downloading the two text artifacts.
    pub fetch_duration_ms: u64,
}

/// Kind of artifact, used in progress events and file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Diagram,
    Pseudocode,
    UmlCode,
}

impl ArtifactKind {
    /// File name used when the artifact is written to an output directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Diagram => "diagram.svg",
            ArtifactKind::Pseudocode => "pseudocode.txt",
            ArtifactKind::UmlCode => "uml_code.puml",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Diagram => f.write_str("diagram"),
            ArtifactKind::Pseudocode => f.write_str("pseudocode"),
            ArtifactKind::UmlCode => f.write_str("uml code"),
        }
    }
}

/// Full output of [`crate::generate`]: the execution result plus source size
/// and end-to-end timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub source_bytes: usize,
    pub result: ExecutionResult,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_distinguishes_only_running_and_succeeded() {
        assert_eq!(ExecutionStatus::parse("RUNNING"), ExecutionStatus::Running);
        assert_eq!(ExecutionStatus::parse("SUCCEEDED"), ExecutionStatus::Succeeded);
        assert_eq!(
            ExecutionStatus::parse("TIMED_OUT"),
            ExecutionStatus::Other("TIMED_OUT".into())
        );
        // Case matters on the wire.
        assert_eq!(
            ExecutionStatus::parse("running"),
            ExecutionStatus::Other("running".into())
        );
    }

    #[test]
    fn only_running_is_non_terminal() {
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Succeeded.is_terminal());
        assert!(ExecutionStatus::Other("FAILED".into()).is_terminal());
    }

    #[test]
    fn handle_serialises_as_plain_string() {
        let h = ExecutionHandle::new("arn:aws:states:exec-1");
        assert_eq!(serde_json::to_string(&h).unwrap(), "\"arn:aws:states:exec-1\"");
        assert_eq!(h.to_string(), "arn:aws:states:exec-1");
    }

    #[test]
    fn artifact_file_names() {
        assert_eq!(ArtifactKind::Diagram.file_name(), "diagram.svg");
        assert_eq!(ArtifactKind::Pseudocode.file_name(), "pseudocode.txt");
        assert_eq!(ArtifactKind::UmlCode.file_name(), "uml_code.puml");
    }
}
