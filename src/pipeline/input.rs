//! Input resolution: read a user-supplied path into validated source bytes.
//!
//! The workflow decodes the submission as UTF-8 text and rejects empty
//! content, so both checks happen here before anything touches the network.

use crate::error::ArchDiagError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source file read into memory and validated.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read `path` and validate its contents.
pub async fn resolve_input(path: impl AsRef<Path>) -> Result<SourceFile, ArchDiagError> {
    let path = path.as_ref().to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) => {
            return Err(match e.kind() {
                ErrorKind::NotFound => ArchDiagError::FileNotFound { path },
                ErrorKind::PermissionDenied => ArchDiagError::PermissionDenied { path },
                _ => ArchDiagError::ReadFailed { path, source: e },
            });
        }
    };

    validate_source(&path, &bytes)?;
    debug!("Resolved source file: {} ({} bytes)", path.display(), bytes.len());

    Ok(SourceFile { path, bytes })
}

/// Check that `bytes` is non-empty UTF-8.
///
/// `path` is only used for error messages; in-memory sources pass a
/// placeholder.
pub fn validate_source(path: &Path, bytes: &[u8]) -> Result<(), ArchDiagError> {
    if bytes.is_empty() {
        return Err(ArchDiagError::EmptyInput {
            path: path.to_path_buf(),
        });
    }
    if let Err(e) = std::str::from_utf8(bytes) {
        return Err(ArchDiagError::NotUtf8 {
            path: path.to_path_buf(),
            offset: e.valid_up_to(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_valid_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"def main():\n    pass\n").unwrap();

        let src = resolve_input(f.path()).await.unwrap();
        assert_eq!(src.len(), 21);
        assert_eq!(src.path, f.path());
    }

    #[tokio::test]
    async fn missing_file() {
        let err = resolve_input("/definitely/not/here.py").await.unwrap_err();
        assert!(matches!(err, ArchDiagError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn directory_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path()).await.unwrap_err();
        match &err {
            ArchDiagError::ReadFailed { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let err = resolve_input(f.path()).await.unwrap_err();
        assert!(matches!(err, ArchDiagError::EmptyInput { .. }));
    }

    #[test]
    fn invalid_utf8_reports_offset() {
        let err = validate_source(Path::new("x.py"), &[b'o', b'k', 0xff, b'!']).unwrap_err();
        match err {
            ArchDiagError::NotUtf8 { offset, .. } => assert_eq!(offset, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn utf8_multibyte_is_accepted() {
        validate_source(Path::new("x.py"), "# café ☕\n".as_bytes()).unwrap();
    }
}
