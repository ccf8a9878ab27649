//! Heuristic location of copyright lines and comment blocks in raw file bytes.
//!
//! This is fraught with peril: the patterns were grown experimentally from a
//! set of open source packages, and there will always be notices they miss.
//! That's why [`Extractor`] is a trait; the builder only relies on the three
//! operations below, never on the patterns themselves.

use crate::consts;
use std::ops::Range;

/// Finds candidate notice text inside a file's content.
///
/// Implementations must be immutable once built: a single instance is shared
/// by every worker of a scan.
pub trait Extractor: Send + Sync {
    /// Cheap check for whether any copyright line exists at all.
    fn contains_copyright(&self, raw: &[u8]) -> bool;

    /// Byte ranges of every copyright line, in order of appearance.
    ///
    /// Must not be empty when [`contains_copyright`](Self::contains_copyright)
    /// returned `true` for the same input.
    fn copyright_spans(&self, raw: &[u8]) -> Vec<Range<usize>>;

    /// Byte ranges of every comment block, in order of appearance. An empty
    /// result means the file has no comments.
    fn comment_spans(&self, raw: &[u8]) -> Vec<Range<usize>>;
}

impl<E: Extractor + ?Sized> Extractor for Box<E> {
    fn contains_copyright(&self, raw: &[u8]) -> bool {
        (**self).contains_copyright(raw)
    }

    fn copyright_spans(&self, raw: &[u8]) -> Vec<Range<usize>> {
        (**self).copyright_spans(raw)
    }

    fn comment_spans(&self, raw: &[u8]) -> Vec<Range<usize>> {
        (**self).comment_spans(raw)
    }
}

/// The default [`Extractor`], built on regular expressions.
///
/// Recognizes `Copyright ... YEAR`, `Copyright: ... YEAR`, `(C) ... YEAR`,
/// `(C)YEAR ...` and `© ... YEAR` lines, and C, C++, shell, troff and
/// autoconf comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;
impl RegexExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for RegexExtractor {
    fn contains_copyright(&self, raw: &[u8]) -> bool {
        consts::COPYRIGHT_REGEX.is_match(raw)
    }

    fn copyright_spans(&self, raw: &[u8]) -> Vec<Range<usize>> {
        consts::COPYRIGHT_REGEX.find_iter(raw).map(|m| m.range()).collect()
    }

    fn comment_spans(&self, raw: &[u8]) -> Vec<Range<usize>> {
        consts::COMMENT_REGEX.find_iter(raw).map(|m| m.range()).collect()
    }
}
