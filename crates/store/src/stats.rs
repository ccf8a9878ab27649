use std::time::{Duration, Instant};

/// Running counters of a [`DedupStore`](crate::DedupStore).
#[derive(Debug, Clone)]
pub struct IngestStats {
    pub(crate) created: Instant,
    /// Digest-indexed ingests, duplicates included.
    pub(crate) notices: u64,
    pub(crate) duplicates: u64,
    /// Ingests diverted to the license registry.
    pub(crate) licenses: u64,
    pub(crate) unique: u64,
    /// `histogram[n]` counts ingests which examined `n` chain slots.
    pub(crate) histogram: Vec<u64>,
    pub(crate) max_search: usize,
}

impl IngestStats {
    pub(crate) fn new(histogram_len: usize) -> Self {
        Self {
            created: Instant::now(),
            notices: 0,
            duplicates: 0,
            licenses: 0,
            unique: 0,
            histogram: vec![0; histogram_len],
            max_search: 0,
        }
    }

    pub(crate) fn record_search(&mut self, search_len: usize) {
        self.notices += 1;
        if search_len > self.max_search {
            self.max_search = search_len;
            tracing::trace!(max_search = search_len, "New longest bucket search");
        }
        let slot = search_len.min(self.histogram.len() - 1);
        self.histogram[slot] += 1;
    }

    pub fn notices(&self) -> u64 {
        self.notices
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn licenses(&self) -> u64 {
        self.licenses
    }

    /// Number of distinct notices held.
    pub fn unique(&self) -> u64 {
        self.unique
    }

    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }

    /// Longest chain search seen, counted in examined slots.
    pub fn max_search(&self) -> usize {
        self.max_search
    }

    pub fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    /// Digest-indexed notices ingested per second since the store was created.
    pub fn rate(&self) -> f64 {
        let seconds = self.elapsed().as_secs_f64();
        if seconds > 0.0 { self.notices as f64 / seconds } else { 0.0 }
    }

    /// Histogram slots which were hit at least once, as `(search_len, count)`.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.histogram.iter().enumerate().filter(|(_, count)| **count > 0).map(|(len, count)| (len, *count))
    }
}
