//! The concurrent scan-and-aggregate pipeline.
//!
//! A [`Coordinator`] walks a set of roots on the calling thread, hands every
//! regular file to a fixed pool of workers through a bounded queue, and funnels
//! the notices they build through a second bounded queue into a single
//! ingestion thread that owns the [`DedupStore`](licex_store::DedupStore).
//!
//! Per-file failures are decided centrally by the ingestion thread according
//! to the [`ErrorPolicy`].

pub mod discover;
pub mod error;
mod pipeline;

pub use crate::discover::{Delimiter, precheck, read_path_list};
pub use crate::pipeline::{
    Coordinator, ErrorPolicy, NoticeSource, Outcome, Phase, ScanOptions, ScanSummary, default_workers,
};
