//! Unified error type for the explorer.

use thiserror::Error;

/// All errors that can surface from explorer operations.
///
/// A missing or non-directory source root is NOT an error — it yields an
/// empty manifest. Per-entry walk failures are skipped, not raised.
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// I/O error (file read/write, directory access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip container could not be written — surfaces as a failed
    /// download, never as partial bytes.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// JSON serialization error (search body, stats output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Target path absent or outside the visible tree
    #[error("Not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = ExplorerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(err.to_string().contains("I/O error"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_not_found_display() {
        let err = ExplorerError::NotFound("master/missing.txt".to_string());
        assert!(err.to_string().contains("master/missing.txt"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: ExplorerError = io_err.into();
        assert!(matches!(err, ExplorerError::Io(_)));
    }
}
