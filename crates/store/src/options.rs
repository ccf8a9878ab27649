use crate::error::{ErrorKind, Result};
use licex_notice::Digest;

pub const DEFAULT_NUM_BUCKETS: usize = 1_000_000;
pub const DEFAULT_INDEX_OFFSET: usize = 0;
pub const DEFAULT_HISTOGRAM_LEN: usize = 1000;

/// Sizing of a [`DedupStore`](crate::DedupStore), fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Number of bucket heads. Pick it so that the expected number of unique
    /// notices per bucket stays small.
    pub num_buckets: usize,
    /// Byte offset into the digest of the four bytes used as the bucket key.
    /// Lets a corpus whose digests cluster on their leading bytes use a
    /// different window.
    pub index_offset: usize,
    /// Slots in the search-length histogram. Longer searches are counted in
    /// the last slot.
    pub histogram_len: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            num_buckets: DEFAULT_NUM_BUCKETS,
            index_offset: DEFAULT_INDEX_OFFSET,
            histogram_len: DEFAULT_HISTOGRAM_LEN,
        }
    }
}

impl StoreOptions {
    pub fn with_buckets(mut self, num_buckets: usize) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    pub fn with_index_offset(mut self, index_offset: usize) -> Self {
        self.index_offset = index_offset;
        self
    }

    pub fn with_histogram_len(mut self, histogram_len: usize) -> Self {
        self.histogram_len = histogram_len;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            exn::bail!(ErrorKind::InvalidOptions("bucket count must be at least 1"));
        }
        if self.index_offset > Digest::MAX_KEY_OFFSET {
            exn::bail!(ErrorKind::InvalidOptions("index offset runs past the end of the digest"));
        }
        if self.histogram_len == 0 {
            exn::bail!(ErrorKind::InvalidOptions("histogram needs at least one slot"));
        }
        Ok(())
    }
}
