//! Artifact download and persistence.
//!
//! Text artifacts are returned byte-for-byte as served. Writing to disk goes
//! through a temp file in the destination directory followed by a rename, so
//! a crash never leaves a half-written artifact behind.

use crate::backend::WorkflowBackend;
use crate::error::ArchDiagError;
use crate::output::{ArtifactKind, ExecutionResult};
use crate::progress::ProgressCallback;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Download one text artifact.
pub async fn fetch_text_artifact(
    backend: &dyn WorkflowBackend,
    kind: ArtifactKind,
    url: &str,
    progress: Option<&ProgressCallback>,
) -> Result<String, ArchDiagError> {
    let text = backend.fetch_text(url).await?;
    debug!("Fetched {} ({} bytes)", kind, text.len());
    if let Some(cb) = progress {
        cb.on_artifact_fetched(kind, text.len());
    }
    Ok(text)
}

/// Download the rendered diagram.
pub async fn fetch_diagram(
    backend: &dyn WorkflowBackend,
    url: &str,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<u8>, ArchDiagError> {
    let bytes = backend.fetch_bytes(url).await?;
    debug!("Fetched diagram ({} bytes)", bytes.len());
    if let Some(cb) = progress {
        cb.on_artifact_fetched(ArtifactKind::Diagram, bytes.len());
    }
    Ok(bytes)
}

/// Paths of the files written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WrittenArtifacts {
    pub diagram: PathBuf,
    pub pseudocode: PathBuf,
    pub uml_code: PathBuf,
}

/// Write all three artifacts into `dir`, creating it if needed.
pub async fn write_artifacts(
    dir: &Path,
    result: &ExecutionResult,
    diagram: &[u8],
) -> Result<WrittenArtifacts, ArchDiagError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ArchDiagError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let written = WrittenArtifacts {
        diagram: write_atomic(dir, ArtifactKind::Diagram, diagram.to_vec()).await?,
        pseudocode: write_atomic(dir, ArtifactKind::Pseudocode, result.pseudocode.clone().into_bytes())
            .await?,
        uml_code: write_atomic(dir, ArtifactKind::UmlCode, result.uml_code.clone().into_bytes())
            .await?,
    };

    info!("Wrote artifacts to {}", dir.display());
    Ok(written)
}

/// Write `contents` to `dir/<kind file name>` via temp file + rename.
async fn write_atomic(
    dir: &Path,
    kind: ArtifactKind,
    contents: Vec<u8>,
) -> Result<PathBuf, ArchDiagError> {
    let dir = dir.to_path_buf();
    let target = dir.join(kind.file_name());
    let target_for_task = target.clone();

    tokio::task::spawn_blocking(move || {
        let fail = |source: std::io::Error| ArchDiagError::OutputWriteFailed {
            path: target_for_task.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(fail)?;
        tmp.write_all(&contents).map_err(fail)?;
        tmp.persist(&target_for_task).map_err(|e| fail(e.error))?;
        Ok::<_, ArchDiagError>(())
    })
    .await
    .map_err(|e| ArchDiagError::Internal(format!("Write task panicked: {e}")))??;

    Ok(target)
}
