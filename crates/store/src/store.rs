use crate::error::Result;
use crate::license::{self, LicenseRegistry};
use crate::options::StoreOptions;
use crate::stats::IngestStats;
use licex_notice::{Category, Digest, Notice};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Index of a [`Record`] in the store's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);
impl Handle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A unique notice, once owned by the store.
#[derive(Debug, Clone)]
pub struct Record {
    notice: Notice,
    match_count: u64,
    file_paths: Vec<PathBuf>,
    /// Path hash to the position of the first path with that hash. Paths are
    /// stored once, in `file_paths`.
    seen: HashMap<u64, usize>,
    /// Next record in the same bucket, with a strictly lower digest.
    next: Option<Handle>,
}

impl Record {
    fn new(notice: Notice, path: PathBuf, next: Option<Handle>) -> Self {
        Self {
            notice,
            match_count: 1,
            seen: HashMap::from([(path_hash(&path), 0)]),
            file_paths: vec![path],
            next,
        }
    }

    fn merge(&mut self, path: PathBuf) -> bool {
        self.match_count += 1;
        let hash = path_hash(&path);
        let known = match self.seen.get(&hash) {
            Some(&position) if self.file_paths[position] == path => true,
            // Two distinct paths share a hash; fall back to a full scan.
            Some(_) => self.file_paths.contains(&path),
            None => false,
        };
        if known {
            return false;
        }
        self.seen.entry(hash).or_insert(self.file_paths.len());
        self.file_paths.push(path);
        true
    }

    pub fn notice(&self) -> &Notice {
        &self.notice
    }

    pub fn digest(&self) -> &Digest {
        self.notice.digest()
    }

    pub fn category(&self) -> Category {
        self.notice.category()
    }

    pub fn text(&self) -> &[u8] {
        self.notice.text()
    }

    /// How many times this digest was ingested.
    pub fn match_count(&self) -> u64 {
        self.match_count
    }

    /// Distinct paths which produced this notice, in first-seen order.
    pub fn file_paths(&self) -> &[PathBuf] {
        &self.file_paths
    }
}

fn path_hash(path: &Path) -> u64 {
    BuildHasherDefault::<DefaultHasher>::default().hash_one(path)
}

/// What [`DedupStore::ingest`] did with a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The path names a license file; the notice was discarded.
    License,
    /// A record with the same digest existed and absorbed the notice.
    Duplicate(Handle),
    /// A new record was linked into its bucket.
    Inserted(Handle),
}

/// Deduplicating hash index of notices.
///
/// Buckets hold the head of a chain of records sorted by strictly descending
/// digest. Records live in an arena and link to each other by [`Handle`];
/// nothing else can hold on to them, so the store has a single owner and
/// needs no locking: every mutation goes through `&mut self`.
///
/// The set of records and each chain's order depend only on the set of
/// digests ingested, never on the order they arrived in. Statistics and the
/// order of each record's paths do depend on arrival order.
#[derive(Debug)]
pub struct DedupStore {
    options: StoreOptions,
    buckets: Vec<Option<Handle>>,
    records: Vec<Record>,
    licenses: LicenseRegistry,
    stats: IngestStats,
}

impl DedupStore {
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidOptions`](crate::error::ErrorKind::InvalidOptions)
    /// if `options` can't be worked with.
    pub fn new(options: StoreOptions) -> Result<Self> {
        options.validate()?;
        tracing::debug!(
            buckets = options.num_buckets,
            index_offset = options.index_offset,
            histogram_len = options.histogram_len,
            "Creating notice store"
        );
        Ok(Self {
            options,
            buckets: vec![None; options.num_buckets],
            records: Vec::new(),
            licenses: LicenseRegistry::default(),
            stats: IngestStats::new(options.histogram_len),
        })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// The bucket a digest belongs in.
    pub fn bucket_of(&self, digest: &Digest) -> usize {
        let key = digest
            .bucket_key(self.options.index_offset)
            .expect("index offset is validated when the store is created");
        key as usize % self.options.num_buckets
    }

    /// Takes ownership of `notice`, produced from the file at `path`.
    ///
    /// License files are only counted by path. Anything else is merged into
    /// the record with the same digest, or linked into its bucket as a new
    /// record, keeping the chain in descending digest order.
    #[instrument(level = "trace", skip_all, fields(path = %path.display(), digest = %notice.digest()))]
    pub fn ingest(&mut self, path: PathBuf, notice: Notice) -> Ingest {
        if license::is_license(&path) {
            self.stats.licenses += 1;
            let count = self.licenses.add(path);
            tracing::debug!(count, "Recorded license file");
            return Ingest::License;
        }

        let bucket = self.bucket_of(notice.digest());
        let mut previous: Option<Handle> = None;
        let mut cursor = self.buckets[bucket];
        let mut search_len = 0;
        // Stop at the first record whose digest isn't greater than the new one.
        while let Some(handle) = cursor {
            search_len += 1;
            let record = &self.records[handle.0];
            if notice.digest() >= record.digest() {
                break;
            }
            previous = cursor;
            cursor = record.next;
        }
        if cursor.is_none() {
            // The empty slot at the end of the chain counts as examined.
            search_len += 1;
        }
        self.stats.record_search(search_len);

        if let Some(handle) = cursor
            && self.records[handle.0].digest() == notice.digest()
        {
            self.stats.duplicates += 1;
            let added = self.records[handle.0].merge(path);
            tracing::debug!(new_path = added, "Duplicate notice");
            return Ingest::Duplicate(handle);
        }

        let handle = Handle(self.records.len());
        self.records.push(Record::new(notice, path, cursor));
        match previous {
            Some(previous) => self.records[previous.0].next = Some(handle),
            None => self.buckets[bucket] = Some(handle),
        }
        self.stats.unique += 1;
        tracing::debug!(bucket, search_len, "New notice");
        Ingest::Inserted(handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&Record> {
        self.records.get(handle.0)
    }

    /// Looks up the record holding `digest`.
    pub fn find(&self, digest: &Digest) -> Option<&Record> {
        self.chain(self.bucket_of(digest))
            .take_while(|record| record.digest() >= digest)
            .find(|record| record.digest() == digest)
    }

    /// The records of one bucket, head to tail.
    pub fn chain(&self, bucket: usize) -> Chain<'_> {
        Chain {
            records: &self.records,
            cursor: self.buckets.get(bucket).copied().flatten(),
        }
    }

    /// Every record exactly once: buckets in index order, each chain head to
    /// tail. The same set of digests always enumerates in the same order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        (0..self.buckets.len()).flat_map(|bucket| self.chain(bucket))
    }

    /// Number of unique notices.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn licenses(&self) -> &LicenseRegistry {
        &self.licenses
    }

    pub fn license_count(&self, path: &Path) -> u64 {
        self.licenses.count(path)
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}

/// Iterator over one bucket's chain.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    records: &'a [Record],
    cursor: Option<Handle>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let record = &self.records[self.cursor?.0];
        self.cursor = record.next;
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn notice(text: &str) -> Notice {
        Notice::new(Category::Source, text)
    }

    fn small_store(num_buckets: usize) -> DedupStore {
        DedupStore::new(StoreOptions::default().with_buckets(num_buckets).with_histogram_len(16)).unwrap()
    }

    fn texts(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Copyright {} Holder {i}\n", 1990 + i)).collect()
    }

    #[test]
    fn merges_identical_notices() {
        let mut store = DedupStore::new(StoreOptions::default()).unwrap();
        assert!(matches!(store.ingest("a.c".into(), notice("Copyright 2020 X")), Ingest::Inserted(_)));
        assert!(matches!(store.ingest("b.c".into(), notice("Copyright 2020 X")), Ingest::Duplicate(_)));
        assert!(matches!(store.ingest("c.c".into(), notice("Copyright 2021 Y")), Ingest::Inserted(_)));

        assert_eq!(store.len(), 2);
        let x = store.find(&Digest::of("Copyright 2020 X")).unwrap();
        assert_eq!(x.match_count(), 2);
        assert_eq!(x.file_paths(), &[PathBuf::from("a.c"), PathBuf::from("b.c")]);
        let y = store.find(&Digest::of("Copyright 2021 Y")).unwrap();
        assert_eq!(y.match_count(), 1);
        assert_eq!(y.file_paths(), &[PathBuf::from("c.c")]);

        assert_eq!(store.stats().notices(), 3);
        assert_eq!(store.stats().duplicates(), 1);
        assert_eq!(store.stats().unique(), 2);
    }

    #[test]
    fn same_path_is_recorded_once() {
        let mut store = small_store(8);
        store.ingest("a.c".into(), notice("Copyright 2020 X"));
        store.ingest("a.c".into(), notice("Copyright 2020 X"));
        store.ingest("a.c".into(), notice("Copyright 2020 X"));

        let record = store.find(&Digest::of("Copyright 2020 X")).unwrap();
        assert_eq!(record.file_paths(), &[PathBuf::from("a.c")]);
        assert_eq!(record.match_count(), 3);
        assert_eq!(store.stats().duplicates(), 2);
    }

    #[test]
    fn many_paths_are_each_recorded_once() {
        let mut store = small_store(8);
        let paths: Vec<PathBuf> = (0..500).map(|i| PathBuf::from(format!("src/{i}/file.c"))).collect();
        for _ in 0..2 {
            for path in &paths {
                store.ingest(path.clone(), notice(licex_notice::NO_NOTICE));
            }
        }

        let record = store.find(&Digest::of(licex_notice::NO_NOTICE)).unwrap();
        assert_eq!(record.file_paths(), paths.as_slice());
        assert_eq!(record.match_count(), 1_000);
        assert_eq!(store.stats().duplicates(), 999);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(64)]
    fn chains_stay_strictly_descending(#[case] num_buckets: usize) {
        let mut store = small_store(num_buckets);
        for (i, text) in texts(200).iter().enumerate() {
            store.ingest(format!("f{i}.c").into(), notice(text));
        }
        for bucket in 0..num_buckets {
            let digests: Vec<_> = store.chain(bucket).map(|record| *record.digest()).collect();
            assert!(digests.windows(2).all(|pair| pair[0] > pair[1]), "bucket {bucket} out of order");
            assert!(digests.iter().all(|digest| store.bucket_of(digest) == bucket));
        }
        assert_eq!(store.iter().count(), 200);
    }

    #[test]
    fn final_structure_ignores_arrival_order() {
        let texts = texts(50);
        let mut ingests: Vec<(String, &str)> = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            // Every notice twice, from two different paths.
            ingests.push((format!("first/{i}.c"), text));
            ingests.push((format!("second/{i}.c"), text));
        }

        let mut forward = small_store(7);
        for (path, text) in &ingests {
            forward.ingest(path.into(), notice(text));
        }
        let mut backward = small_store(7);
        for (path, text) in ingests.iter().rev() {
            backward.ingest(path.into(), notice(text));
        }

        let summarize = |store: &DedupStore| -> Vec<(Digest, u64, Vec<PathBuf>)> {
            store
                .iter()
                .map(|record| {
                    let mut paths = record.file_paths().to_vec();
                    paths.sort();
                    (*record.digest(), record.match_count(), paths)
                })
                .collect()
        };
        assert_eq!(summarize(&forward), summarize(&backward));
        for bucket in 0..7 {
            let a: Vec<_> = forward.chain(bucket).map(|record| *record.digest()).collect();
            let b: Vec<_> = backward.chain(bucket).map(|record| *record.digest()).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn enumerates_each_text_once() {
        let mut store = small_store(5);
        let pairs = [("a", "one"), ("b", "two"), ("c", "one"), ("d", "three"), ("e", "two"), ("f", "one")];
        for (path, text) in pairs {
            store.ingest(path.into(), notice(text));
        }
        let mut seen: Vec<(String, u64, Vec<PathBuf>)> = store
            .iter()
            .map(|record| {
                (record.notice().text_lossy().into_owned(), record.match_count(), record.file_paths().to_vec())
            })
            .collect();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("one".to_string(), 3, vec!["a".into(), "c".into(), "f".into()]),
                ("three".to_string(), 1, vec!["d".into()]),
                ("two".to_string(), 2, vec!["b".into(), "e".into()]),
            ]
        );
    }

    #[test]
    fn search_lengths_are_recorded() {
        let mut digests: Vec<(String, Digest)> = texts(3).into_iter().map(|t| (t.clone(), Digest::of(&t))).collect();
        // Descending arrival means every insert walks to the end of the chain.
        digests.sort_by(|a, b| b.1.cmp(&a.1));
        let mut store = DedupStore::new(StoreOptions::default().with_buckets(1).with_histogram_len(3)).unwrap();
        for (i, (text, _)) in digests.iter().enumerate() {
            store.ingest(format!("{i}.c").into(), notice(text));
        }
        // Searches of 1, 2 and 3 slots; the last one is clamped into slot 2.
        assert_eq!(store.stats().histogram(), &[0, 1, 2]);
        assert_eq!(store.stats().max_search(), 3);

        // A duplicate of the head is found on the first step.
        store.ingest("again.c".into(), notice(&digests[0].0));
        assert_eq!(store.stats().histogram(), &[0, 2, 2]);
    }

    #[test]
    fn license_files_skip_the_index() {
        let mut store = small_store(4);
        assert_eq!(store.ingest("pkg/LICENSE".into(), notice("MIT License")), Ingest::License);
        assert_eq!(store.ingest("pkg/LICENSE".into(), notice("MIT License")), Ingest::License);
        assert_eq!(store.ingest("pkg/COPYING".into(), notice("GPL")), Ingest::License);

        assert!(store.is_empty());
        assert_eq!(store.license_count(Path::new("pkg/LICENSE")), 2);
        assert_eq!(store.licenses().len(), 2);
        assert_eq!(store.stats().licenses(), 3);
        assert_eq!(store.stats().notices(), 0);
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert!(DedupStore::new(StoreOptions::default().with_buckets(0)).is_err());
    }

    #[test]
    fn index_offset_changes_bucket() {
        let digest = Digest::from_bytes(std::array::from_fn(|i| i as u8));
        let store = DedupStore::new(StoreOptions::default().with_buckets(1 << 20).with_index_offset(4)).unwrap();
        assert_eq!(store.bucket_of(&digest), u32::from_le_bytes([4, 5, 6, 7]) as usize % (1 << 20));
    }
}
