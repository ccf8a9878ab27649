//! File type classification.
//!
//! A [`Classifier`] decides whether a file is worth searching for a notice.
//! Every implementation boils down to a `file(1)`-style description string,
//! which is then sorted into a [`FileKind`] by the same set of patterns, so
//! swapping the classifier never changes what a given description means.

mod magic;
mod sniff;

pub use self::magic::MagicClassifier;
pub use self::sniff::SniffClassifier;
use crate::consts;
use crate::error::Result;
use crate::models::Category;
use std::path::Path;

/// What a classifier decided a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Source,
    Binary,
    Compressed,
    Unknown,
}
impl FileKind {
    /// Sorts a description into a kind. Compression is checked first since
    /// compressed formats are often described as "data" as well.
    pub fn from_description(description: &str) -> Self {
        if consts::COMPRESSED_DESCRIPTION_REGEX.is_match(description) {
            FileKind::Compressed
        } else if consts::BINARY_DESCRIPTION_REGEX.is_match(description) {
            FileKind::Binary
        } else if consts::UNKNOWN_DESCRIPTION_REGEX.is_match(description) {
            FileKind::Unknown
        } else {
            FileKind::Source
        }
    }

    /// The notice category for files of this kind.
    pub fn category(&self) -> Category {
        match self {
            FileKind::Source => Category::Source,
            FileKind::Binary | FileKind::Compressed => Category::Binary,
            FileKind::Unknown => Category::Unknown,
        }
    }
}

/// The outcome of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: FileKind,
    /// Raw description, as `file -b` would print it.
    pub description: String,
}
impl Classification {
    pub fn from_description(description: impl Into<String>) -> Self {
        let description = description.into();
        Self { kind: FileKind::from_description(&description), description }
    }

    pub fn is_source(&self) -> bool {
        self.kind == FileKind::Source
    }
}

/// Classifies a path as source, binary, compressed or unknown.
///
/// Implementations must be immutable once built: a single instance is shared
/// by every worker of a scan.
pub trait Classifier: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`ErrorKind::Classify`](crate::error::ErrorKind::Classify) if
    /// the file can't be inspected at all (vanished, permission denied).
    fn classify(&self, path: &Path) -> Result<Classification>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn classify(&self, path: &Path) -> Result<Classification> {
        (**self).classify(path)
    }
}

/// Picks the best classifier available on this system: `file(1)` if it's on
/// the `PATH`, the built-in sniffer otherwise.
pub fn default_classifier() -> Box<dyn Classifier> {
    match MagicClassifier::discover() {
        Some(magic) => Box::new(magic),
        None => {
            tracing::info!("file(1) not found in PATH; falling back to built-in content sniffing");
            Box::new(SniffClassifier::new())
        },
    }
}
