use crate::archive::LicenseArchive;
use crate::assets::{Builtins, STYLESHEET, TEMPLATE};
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use licex_store::{DedupStore, Record};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Write;
use std::str::FromStr;
use tracing::instrument;
use upon::{Engine, Template};

/// Output format of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Html,
    Json,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Format::Html),
            "json" => Ok(Format::Json),
            other => exn::bail!(ErrorKind::UnknownFormat(other.to_string())),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Format::Html => f.write_str("html"),
            Format::Json => f.write_str("json"),
        }
    }
}

/// How an HTML report gets its styles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Style {
    /// Inline the built-in stylesheet.
    #[default]
    Embedded,
    /// Link to a stylesheet by URL or path; nothing is read.
    Link(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseEntry {
    /// 1-based position in the table.
    pub number: usize,
    pub path: String,
    pub count: u64,
    /// Where the archived copy lives, if licenses were archived.
    pub href: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticeEntry {
    pub digest: String,
    pub category: &'static str,
    pub match_count: u64,
    pub paths: Vec<String>,
    pub text: String,
}

impl From<&Record> for NoticeEntry {
    fn from(record: &Record) -> Self {
        Self {
            digest: record.digest().to_string(),
            category: record.category().as_str(),
            match_count: record.match_count(),
            paths: record.file_paths().iter().map(|path| path.to_string_lossy().into_owned()).collect(),
            text: record.notice().text_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramSlot {
    pub search_len: usize,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub notices: u64,
    pub unique: u64,
    pub duplicates: u64,
    pub licenses: u64,
    pub max_search: usize,
    /// Notices ingested per second.
    pub rate: f64,
    pub histogram: Vec<HistogramSlot>,
}

/// Snapshot of a finished store, in enumeration order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub licenses: Vec<LicenseEntry>,
    pub notices: Vec<NoticeEntry>,
    pub stats: Statistics,
}

impl Report {
    #[instrument(level = "debug", skip_all, fields(unique = store.len()))]
    pub fn new(store: &DedupStore) -> Self {
        let licenses = store
            .licenses()
            .iter()
            .enumerate()
            .map(|(i, (path, count))| LicenseEntry {
                number: i + 1,
                path: path.to_string_lossy().into_owned(),
                count,
                href: None,
            })
            .collect();
        let notices = store.iter().map(NoticeEntry::from).collect();
        let stats = store.stats();
        let stats = Statistics {
            notices: stats.notices(),
            unique: stats.unique(),
            duplicates: stats.duplicates(),
            licenses: stats.licenses(),
            max_search: stats.max_search(),
            rate: stats.rate(),
            histogram: stats.occupied().map(|(search_len, count)| HistogramSlot { search_len, count }).collect(),
        };
        Self { licenses, notices, stats }
    }

    /// Copies every license file into `archive` and links the report to the
    /// copies. Stops at the first failure.
    pub fn archive_licenses(&mut self, archive: &mut LicenseArchive) -> Result<()> {
        for license in &mut self.licenses {
            let copied = archive.copy(license.path.as_ref())?;
            license.href = Some(copied.to_string_lossy().into_owned());
        }
        tracing::info!(count = self.licenses.len(), root = %archive.root().display(), "Archived licenses");
        Ok(())
    }

    pub fn write_json<W: Write>(&self, mut w: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut w, self).or_raise(|| ErrorKind::Serialize)?;
        w.write_all(b"\n").or_raise(|| ErrorKind::Io)?;
        w.flush().or_raise(|| ErrorKind::Io)
    }
}

#[derive(Serialize)]
struct Page<'a> {
    title: &'a str,
    style: Option<String>,
    stylesheet: Option<&'a str>,
    report: &'a Report,
}

/// Renders reports as a standalone HTML document.
///
/// The template is compiled once at construction; a bad template fails here
/// rather than after a long scan.
pub struct HtmlRenderer {
    engine: Engine<'static>,
    template: Template<'static>,
    style: Style,
    title: String,
}

impl HtmlRenderer {
    pub fn new(style: Style) -> Result<Self> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let source = Builtins::load_str(TEMPLATE)?;
        let template = engine.compile(source).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template, style, title: "Copyright Notices".to_string() })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[instrument(level = "debug", skip_all, fields(notices = report.notices.len()))]
    pub fn render<W: Write>(&self, report: &Report, mut w: W) -> Result<()> {
        let (style, stylesheet) = match &self.style {
            Style::Embedded => (Some(Builtins::load_str(STYLESHEET)?), None),
            Style::Link(href) => (None, Some(href.as_str())),
        };
        let page = Page { title: &self.title, style, stylesheet, report };
        self.template.render(&self.engine, &page).to_writer(&mut w).or_raise(|| ErrorKind::Template)?;
        w.flush().or_raise(|| ErrorKind::Io)
    }
}

/// Formatters for HTML output.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Escapes strings for use in HTML text and attribute values. Anything
    /// else is formatted as usual.
    pub(super) fn escape_html(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                for c in s.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        '"' => f.write_str("&quot;")?,
                        '\'' => f.write_str("&#39;")?,
                        c => f.write_char(c)?,
                    }
                }
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    /// Everything is escaped by default; `raw` is only for the built-in
    /// stylesheet.
    pub(super) fn configure(engine: &mut Engine<'_>) {
        engine.set_default_formatter(&escape_html);
        engine.add_formatter("raw", upon_fmt::default);
    }
}

/// Writes `report` to `w` in the given format.
pub fn write_report<W: Write>(report: &Report, format: Format, style: Style, w: W) -> Result<()> {
    match format {
        Format::Html => HtmlRenderer::new(style)?.render(report, w),
        Format::Json => report.write_json(w),
    }
}
