//! Scan Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Per-file failures keep the notice
//! crate's error as a child frame.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A scan error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Per-file Errors
/// Subject to the [`ErrorPolicy`](crate::ErrorPolicy):
/// - [`ErrorKind::Walk`]
/// - [`ErrorKind::Build`]
///
/// ### Fatal Errors
/// Always end the scan:
/// - [`ErrorKind::Inaccessible`]
/// - [`ErrorKind::PathList`]
/// - [`ErrorKind::Structural`]
/// - [`ErrorKind::Spawn`]
/// - [`ErrorKind::WorkerPanicked`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A root path failed the accessibility check before scanning began.
    #[display("path is not accessible: {}", _0.display())]
    Inaccessible(#[error(not(source))] PathBuf),
    /// The list of paths to scan couldn't be read.
    #[display("failed to read path list")]
    PathList,
    /// A directory entry couldn't be visited.
    #[display("failed to walk: {}", _0.display())]
    Walk(#[error(not(source))] PathBuf),
    /// The file's notice couldn't be built.
    #[display("failed to build notice: {}", _0.display())]
    Build(#[error(not(source))] PathBuf),
    /// The extractor contradicted itself on this file.
    #[display("inconsistent notice extraction: {}", _0.display())]
    Structural(#[error(not(source))] PathBuf),
    /// The operating system refused to start a scan thread.
    #[display("failed to start scan thread")]
    Spawn,
    /// A worker or the ingestion thread panicked.
    #[display("scan thread panicked")]
    WorkerPanicked,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Walk(_) | Self::Build(_))
    }

    /// Whether the error ends the scan whatever the policy.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Walk(_) | Self::Build(_))
    }
}
