use licex_notice::error::{ErrorKind as NoticeErrorKind, Result as NoticeResult};
use licex_notice::{Category, Digest, Notice, NoticeBuilder, RegexExtractor, classify::SniffClassifier};
use licex_scan::error::{ErrorKind, Result};
use licex_scan::{Coordinator, ErrorPolicy, NoticeSource, Phase, ScanOptions};
use licex_store::{DedupStore, StoreOptions};
use rstest::rstest;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Builds a notice from the file name's first character, so that many files
/// share a digest.
struct ByInitial;
impl NoticeSource for ByInitial {
    fn build(&self, path: &Path) -> NoticeResult<Notice> {
        let name = path.file_name().unwrap().to_string_lossy();
        Ok(Notice::new(Category::Source, format!("Copyright 2020 {}\n", &name[..1])))
    }
}

/// Fails on every file whose name starts with `bad`.
struct FailsOnBad {
    structural: bool,
}
impl NoticeSource for FailsOnBad {
    fn build(&self, path: &Path) -> NoticeResult<Notice> {
        let name = path.file_name().unwrap().to_string_lossy();
        if name.starts_with("bad") {
            if self.structural {
                exn::bail!(NoticeErrorKind::Structural(path.to_path_buf()));
            }
            exn::bail!(NoticeErrorKind::Read(path.to_path_buf()));
        }
        Ok(Notice::new(Category::Source, name.into_owned()))
    }
}

struct Panics;
impl NoticeSource for Panics {
    fn build(&self, _path: &Path) -> NoticeResult<Notice> {
        panic!("worker blew up");
    }
}

fn store() -> DedupStore {
    DedupStore::new(StoreOptions::default().with_buckets(1024)).unwrap()
}

fn options(workers: usize, policy: ErrorPolicy) -> ScanOptions {
    ScanOptions { workers, policy, ..ScanOptions::default() }
}

fn roots(paths: &[PathBuf]) -> impl Iterator<Item = Result<PathBuf>> + '_ {
    paths.iter().cloned().map(Ok)
}

/// Writes `count` files named `{prefix}{i}.src` into `dir`.
fn populate(dir: &Path, prefix: &str, count: usize) {
    for i in 0..count {
        std::fs::write(dir.join(format!("{prefix}{i}.src")), "x").unwrap();
    }
}

#[test]
fn ten_thousand_paths_with_eight_workers() {
    let dir = tempfile::tempdir().unwrap();
    // 100 directories of 100 files; names start with one of ten letters.
    for d in 0..100 {
        let sub = dir.path().join(format!("dir{d}"));
        std::fs::create_dir(&sub).unwrap();
        for i in 0..100 {
            let initial = (b'a' + (i % 10) as u8) as char;
            std::fs::write(sub.join(format!("{initial}{i}.src")), "x").unwrap();
        }
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(dir.path().join("dir0"), dir.path().join("link")).unwrap();

    let mut store = store();
    let mut coordinator = Coordinator::new(&ByInitial, options(8, ErrorPolicy::Strict));
    let summary = coordinator.run(&mut store, roots(&[dir.path().to_path_buf()])).unwrap();

    assert_eq!(summary.dispatched, 10_000);
    assert_eq!(summary.built, 10_000);
    assert_eq!(summary.ingested, 10_000);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.inserted, 10);
    assert_eq!(summary.duplicates, 9_990);
    assert_eq!(summary.discovered, summary.dispatched + summary.skipped);
    #[cfg(unix)]
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.phase, Phase::Done);

    assert_eq!(store.len(), 10);
    assert!(store.iter().all(|record| record.match_count() == 1_000 && record.file_paths().len() == 1_000));
    assert_eq!(store.stats().notices(), 10_000);
}

/// Counts how far the producer gets ahead of a deliberately slow worker.
struct Slow<'a> {
    pulled: &'a AtomicUsize,
    finished: AtomicUsize,
    max_lag: AtomicUsize,
}
impl NoticeSource for Slow<'_> {
    fn build(&self, path: &Path) -> NoticeResult<Notice> {
        let lag = self.pulled.load(Ordering::SeqCst) - self.finished.load(Ordering::SeqCst);
        self.max_lag.fetch_max(lag, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(Notice::new(Category::Source, path.to_string_lossy().into_owned()))
    }
}

#[test]
fn producer_blocks_when_workers_stall() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), "f", 40);
    let files: Vec<PathBuf> = (0..40).map(|i| dir.path().join(format!("f{i}.src"))).collect();

    let pulled = AtomicUsize::new(0);
    let source = Slow { pulled: &pulled, finished: AtomicUsize::new(0), max_lag: AtomicUsize::new(0) };
    let inputs = files.iter().map(|path| {
        pulled.fetch_add(1, Ordering::SeqCst);
        Ok(path.clone())
    });
    let scan_options = ScanOptions { workers: 1, queue_capacity: Some(1), ..ScanOptions::default() };
    let mut store = store();
    let summary = Coordinator::new(&source, scan_options).run(&mut store, inputs).unwrap();

    assert_eq!(summary.ingested, 40);
    // One being built, one queued, one held by the blocked producer.
    let max_lag = source.max_lag.load(Ordering::SeqCst);
    assert!(max_lag <= 3, "producer ran {max_lag} paths ahead of the worker");
}

#[test]
fn strict_policy_aborts_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), "good", 50);
    populate(dir.path(), "bad", 1);

    let mut store = store();
    let err = Coordinator::new(&FailsOnBad { structural: false }, options(4, ErrorPolicy::Strict))
        .run(&mut store, roots(&[dir.path().to_path_buf()]))
        .unwrap_err();
    assert_eq!(*err, ErrorKind::Build(dir.path().join("bad0.src")));
}

#[test]
fn continue_policy_skips_failures() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), "good", 20);
    populate(dir.path(), "bad", 3);

    let mut store = store();
    let scan_options = ScanOptions { quiet: true, ..options(4, ErrorPolicy::Continue) };
    let summary = Coordinator::new(&FailsOnBad { structural: false }, scan_options)
        .run(&mut store, roots(&[dir.path().to_path_buf()]))
        .unwrap();
    assert_eq!(summary.dispatched, 23);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.ingested, 20);
    assert_eq!(store.len(), 20);
}

#[rstest]
#[case(ErrorPolicy::Strict)]
#[case(ErrorPolicy::Continue)]
fn structural_errors_always_abort(#[case] policy: ErrorPolicy) {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), "good", 10);
    populate(dir.path(), "bad", 1);

    let mut store = store();
    let err = Coordinator::new(&FailsOnBad { structural: true }, options(2, policy))
        .run(&mut store, roots(&[dir.path().to_path_buf()]))
        .unwrap_err();
    assert_eq!(*err, ErrorKind::Structural(dir.path().join("bad0.src")));
}

#[test]
fn missing_root_is_a_walk_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    let mut store = store();
    let err = Coordinator::new(&ByInitial, options(2, ErrorPolicy::Strict))
        .run(&mut store, roots(&[missing.clone()]))
        .unwrap_err();
    assert_eq!(*err, ErrorKind::Walk(missing.clone()));

    let summary = Coordinator::new(&ByInitial, ScanOptions { quiet: true, ..options(2, ErrorPolicy::Continue) })
        .run(&mut store, roots(&[missing]))
        .unwrap();
    assert_eq!(summary.failed, 1);
}

#[test]
fn unreadable_path_list_stops_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), "f", 5);
    let inputs: Vec<Result<PathBuf>> = vec![Ok(dir.path().to_path_buf()), Err(exn::Exn::from(ErrorKind::PathList))];

    let mut store = store();
    let err = Coordinator::new(&ByInitial, options(2, ErrorPolicy::Continue)).run(&mut store, inputs).unwrap_err();
    assert_eq!(*err, ErrorKind::PathList);
}

#[test]
fn worker_panic_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path(), "f", 5);

    let mut store = store();
    let err = Coordinator::new(&Panics, options(2, ErrorPolicy::Continue))
        .run(&mut store, roots(&[dir.path().to_path_buf()]))
        .unwrap_err();
    assert_eq!(*err, ErrorKind::WorkerPanicked);
}

#[test]
fn final_store_is_independent_of_worker_count() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..200 {
        let initial = (b'a' + (i % 26) as u8) as char;
        std::fs::write(dir.path().join(format!("{initial}{i}.src")), "x").unwrap();
    }

    let shape = |workers: usize| -> Vec<(usize, Vec<(Digest, u64)>)> {
        let mut store = DedupStore::new(StoreOptions::default().with_buckets(3)).unwrap();
        Coordinator::new(&ByInitial, options(workers, ErrorPolicy::Strict))
            .run(&mut store, roots(&[dir.path().to_path_buf()]))
            .unwrap();
        (0..3)
            .map(|bucket| (bucket, store.chain(bucket).map(|record| (*record.digest(), record.match_count())).collect()))
            .collect()
    };
    assert_eq!(shape(1), shape(8));
}

#[test]
fn scans_a_source_tree_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir(root.join("src")).unwrap();
    std::fs::write(root.join("src/a.c"), "/* Copyright 2020 X\n */\nint a;\n").unwrap();
    std::fs::write(root.join("src/b.c"), "/* Copyright 2020 X\n */\nint b;\n").unwrap();
    std::fs::write(root.join("src/c.c"), "# Copyright 2021 Y\necho c\n").unwrap();
    std::fs::write(root.join("src/d.c"), "int d;\n").unwrap();
    std::fs::write(root.join("src/prog"), [0x7F, b'E', b'L', b'F', 0x02, 0x01, 0x01, 0x00]).unwrap();
    std::fs::write(root.join("LICENSE"), "Permission is hereby granted\n").unwrap();

    let builder = NoticeBuilder::new(SniffClassifier::new(), RegexExtractor::new());
    let mut store = store();
    let summary = Coordinator::new(&builder, options(3, ErrorPolicy::Strict))
        .run(&mut store, roots(&[root.to_path_buf()]))
        .unwrap();

    assert_eq!(summary.dispatched, 6);
    assert_eq!(summary.licenses, 1);
    assert_eq!(store.license_count(&root.join("LICENSE")), 1);
    assert_eq!(store.len(), 4);

    let shared = store.find(&Digest::of("/* Copyright 2020 X\n */\n")).unwrap();
    assert_eq!(shared.match_count(), 2);
    let mut paths = shared.file_paths().to_vec();
    paths.sort();
    assert_eq!(paths, vec![root.join("src/a.c"), root.join("src/b.c")]);

    let shell = store.find(&Digest::of("# Copyright 2021 Y\n\n")).unwrap();
    assert_eq!(shell.file_paths(), &[root.join("src/c.c")]);

    let none = store.find(&Digest::of(licex_notice::NO_NOTICE)).unwrap();
    assert_eq!(none.file_paths(), &[root.join("src/d.c")]);

    let binary = store.find(&Digest::of("Unsupported Filetype: ELF 64-bit")).unwrap();
    assert_eq!(binary.category(), Category::Binary);
}
