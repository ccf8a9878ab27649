use crate::classify::{Classifier, default_classifier};
use crate::error::{ErrorKind, Result};
use crate::extract::{Extractor, RegexExtractor};
use crate::models::Notice;
use exn::ResultExt;
use std::ops::Range;
use std::path::Path;
use tracing::instrument;

/// Produces one [`Notice`] per file.
///
/// Holds an immutable [`Classifier`] and [`Extractor`] pair; building a notice
/// never mutates either, so one builder is shared by reference between all
/// workers of a scan.
///
/// # Strategy
///
/// 1. Files that aren't source (binary, compressed, unknown) get a notice
///    describing the file type. Their content is never read.
/// 2. Source files without any copyright line get the canonical
///    [`NO_NOTICE`](crate::NO_NOTICE) notice.
/// 3. If the file has no comments, the notice is every copyright line.
/// 4. Otherwise the notice is every comment block containing a copyright line.
/// 5. If none of the comments contain one (the copyright is in code, or a
///    string), fall back to every copyright line.
pub struct NoticeBuilder<C = Box<dyn Classifier>, E = RegexExtractor> {
    classifier: C,
    extractor: E,
    show_notices: bool,
}

impl NoticeBuilder {
    /// A builder using the best available classifier and the regex extractor.
    pub fn discover() -> Self {
        Self::new(default_classifier(), RegexExtractor::new())
    }
}

impl<C: Classifier, E: Extractor> NoticeBuilder<C, E> {
    pub fn new(classifier: C, extractor: E) -> Self {
        Self { classifier, extractor, show_notices: false }
    }

    /// Log every extracted notice at `INFO` level.
    pub fn show_notices(mut self, show: bool) -> Self {
        self.show_notices = show;
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Builds the notice for the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Classify`] if the file couldn't be classified.
    /// - [`ErrorKind::Read`] if a source file couldn't be read.
    /// - [`ErrorKind::Structural`] if the extractor contradicted itself.
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    pub fn build(&self, path: &Path) -> Result<Notice> {
        let classification = self.classifier.classify(path)?;
        if !classification.is_source() {
            tracing::debug!(description = %classification.description, "Unsupported file type");
            return Ok(self.finish(path, Notice::unsupported(classification.kind.category(), &classification.description)));
        }
        let raw = std::fs::read(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        self.build_from_source(path, &raw)
    }

    /// Builds the notice for source text that has already been read. `path` is
    /// only used for reporting.
    pub fn build_from_source(&self, path: &Path, raw: &[u8]) -> Result<Notice> {
        if !self.extractor.contains_copyright(raw) {
            tracing::debug!(path = %path.display(), "No copyright notice found");
            return Ok(self.finish(path, Notice::not_found()));
        }
        let comments = self.extractor.comment_spans(raw);
        let text = if comments.is_empty() {
            self.copyright_lines(path, raw)?
        } else {
            let blocks: Vec<Range<usize>> = comments
                .into_iter()
                .filter(|span| self.extractor.contains_copyright(&raw[span.clone()]))
                .collect();
            if blocks.is_empty() {
                tracing::debug!(path = %path.display(), "Found copyright outside of comments");
                self.copyright_lines(path, raw)?
            } else {
                concatenate(raw, &blocks)
            }
        };
        Ok(self.finish(path, Notice::new(crate::Category::Source, text)))
    }

    fn copyright_lines(&self, path: &Path, raw: &[u8]) -> Result<Vec<u8>> {
        let spans = self.extractor.copyright_spans(raw);
        if spans.is_empty() {
            exn::bail!(ErrorKind::Structural(path.to_path_buf()));
        }
        Ok(concatenate(raw, &spans))
    }

    fn finish(&self, path: &Path, notice: Notice) -> Notice {
        if self.show_notices {
            tracing::info!(
                path = %path.display(),
                digest = %notice.digest(),
                category = %notice.category(),
                text = %notice.text_lossy(),
                "Extracted notice"
            );
        }
        notice
    }
}

/// Copies every span out of `raw`, each followed by a line break.
fn concatenate(raw: &[u8], spans: &[Range<usize>]) -> Vec<u8> {
    let capacity = spans.iter().map(|span| span.len() + 1).sum();
    let mut text = Vec::with_capacity(capacity);
    for span in spans {
        text.extend_from_slice(&raw[span.clone()]);
        text.push(b'\n');
    }
    text
}
