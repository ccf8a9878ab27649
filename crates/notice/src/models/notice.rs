use super::Category;
use crate::Digest;
use std::borrow::Cow;

/// Prefix of the placeholder text for files that aren't searched.
pub const UNSUPPORTED_PREFIX: &str = "Unsupported Filetype: ";
/// Placeholder text for source files without any copyright line.
pub const NO_NOTICE: &str = "No copyright notice found\n";

/// A copyright/license notice extracted from a single file.
///
/// The digest is always computed over `text` at construction, so a `Notice`
/// can't be built with a stale key. A notice doesn't know which file it came
/// from; the path travels alongside it until the store takes ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    digest: Digest,
    category: Category,
    text: Vec<u8>,
}
impl Notice {
    pub fn new(category: Category, text: impl Into<Vec<u8>>) -> Self {
        let text = text.into();
        Self { digest: Digest::of(&text), category, text }
    }

    /// Placeholder for a file that was classified as something other than
    /// source, carrying the classifier's description.
    pub fn unsupported(category: Category, description: impl AsRef<str>) -> Self {
        Self::new(category, format!("{UNSUPPORTED_PREFIX}{}", description.as_ref()))
    }

    /// The canonical "nothing found" notice.
    pub fn not_found() -> Self {
        Self::new(Category::Source, NO_NOTICE)
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Notice text with invalid UTF-8 replaced by U+FFFD, for display.
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    pub fn into_text(self) -> Vec<u8> {
        self.text
    }
}
