//! Report Error Types
//!
//! Every error in this crate is fatal to the run: the report is the last thing
//! produced, and there's nothing left to skip to.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A report error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Asset was not loadable from the embedded set.
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    #[display("report template error")]
    Template,
    #[display("failed to serialize report")]
    Serialize,
    /// Writing the report to its destination failed.
    #[display("failed to write report")]
    Io,
    /// A license file couldn't be copied into the archive directory.
    #[display("failed to archive license: {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
    /// Another license file was already archived at the same destination.
    #[display("archive destination already taken: {}", _0.display())]
    ArchiveCollision(#[error(not(source))] PathBuf),
    #[display("unknown report format: {_0}")]
    UnknownFormat(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Archive(_))
    }
}
