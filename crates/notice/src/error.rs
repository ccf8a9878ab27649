//! Notice Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::models::Category;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A notice extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for notice extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file type could not be determined (file vanished, permission denied, ...).
    #[display("failed to classify file: {}", _0.display())]
    Classify(#[error(not(source))] PathBuf),
    /// The file was classified as source but its content could not be read.
    #[display("failed to read file: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The quick copyright check matched but the span search found nothing.
    /// The two extractor operations disagree, which is a bug in the extractor.
    #[display("matched a copyright but couldn't find it: {}", _0.display())]
    Structural(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Classify(_) | Self::Read(_))
    }

    /// Structural errors must never be skipped over, whatever the error policy.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// The category a file falls into when building its notice failed.
    pub fn category(&self) -> Category {
        Category::Error
    }

    /// The path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Classify(path) | Self::Read(path) | Self::Structural(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;
    use std::path::Path;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Read(PathBuf::from("a.c")).to_string(), "failed to read file: a.c");
        assert_eq!(
            ErrorKind::Structural(PathBuf::from("b.c")).to_string(),
            "matched a copyright but couldn't find it: b.c"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Classify(PathBuf::new()).is_retryable());
        assert!(ErrorKind::Read(PathBuf::new()).is_retryable());
        assert!(!ErrorKind::Structural(PathBuf::new()).is_retryable());
        assert!(ErrorKind::Structural(PathBuf::new()).is_structural());
    }

    #[test]
    fn error_from_result() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"));
        let err: Result<()> = result.or_raise(|| ErrorKind::Read(PathBuf::from("x")));
        let exn = err.unwrap_err();
        assert_eq!(exn.path(), Path::new("x"));
        assert_eq!(exn.category(), Category::Error);
    }
}
