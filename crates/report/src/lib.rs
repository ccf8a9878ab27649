//! # Licex Report
//!
//! Turns a finished [`DedupStore`](licex_store::DedupStore) into something a
//! person can read: a standalone HTML page built from an embedded template, or
//! JSON for other tools.
//!
//! HTML output escapes every path and notice; only the built-in stylesheet is
//! written verbatim. License files can optionally be copied into an archive
//! directory, in which case the license table links to the copies.

mod archive;
mod assets;
pub mod error;
mod report;

pub use crate::archive::LicenseArchive;
pub use crate::report::{
    Format, HistogramSlot, HtmlRenderer, LicenseEntry, NoticeEntry, Report, Statistics, Style, write_report,
};
