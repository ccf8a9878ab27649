//! In-memory deduplicating index of copyright notices.
//!
//! The store is built once per scan and fed from a single thread. It keeps
//! one [`Record`] per distinct notice digest, remembering how often and where
//! that notice was seen, and counts license documents separately by path.
//!
//! # Layout
//! - A fixed number of buckets, chosen up front (see [`StoreOptions`]). A
//!   digest's bucket is four of its bytes, read little-endian, modulo the
//!   bucket count.
//! - Each bucket is a chain of records in strictly descending digest order,
//!   so a lookup stops as soon as it passes where the digest would be.
//! - Records live in an arena and link to each other by [`Handle`].

mod consts;
pub mod error;
mod license;
mod options;
mod stats;
mod store;

pub use crate::license::{LicenseRegistry, is_license};
pub use crate::options::{DEFAULT_HISTOGRAM_LEN, DEFAULT_INDEX_OFFSET, DEFAULT_NUM_BUCKETS, StoreOptions};
pub use crate::stats::IngestStats;
pub use crate::store::{Chain, DedupStore, Handle, Ingest, Record};
