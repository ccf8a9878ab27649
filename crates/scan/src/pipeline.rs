use crate::discover::{self, Discovered};
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use crossbeam_channel::{Receiver, Sender, bounded};
use licex_notice::{Classifier, Extractor, Notice, NoticeBuilder};
use licex_store::{DedupStore, Ingest};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Anything that can turn a path into a [`Notice`].
///
/// Shared by reference between every worker, so implementations must not
/// need `&mut self`.
pub trait NoticeSource: Send + Sync {
    fn build(&self, path: &Path) -> licex_notice::error::Result<Notice>;
}

impl<C: Classifier, E: Extractor> NoticeSource for NoticeBuilder<C, E> {
    fn build(&self, path: &Path) -> licex_notice::error::Result<Notice> {
        NoticeBuilder::build(self, path)
    }
}

/// What happens when a single file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the scan on the first failure.
    #[default]
    Strict,
    /// Log the failure (unless quiet) and move on.
    Continue,
}

/// Where a [`Coordinator`] is in its run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// Paths are being discovered and handed to workers.
    Dispatching,
    /// Every path has been dispatched; waiting for workers and ingestion.
    Draining,
    Done,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Dispatching => "dispatching",
            Phase::Draining => "draining",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Number of notice building threads.
    pub workers: usize,
    /// Capacity of the dispatch and notice queues. Defaults to `workers`.
    pub queue_capacity: Option<usize>,
    pub policy: ErrorPolicy,
    /// Follow symlinks while walking directories.
    pub follow_links: bool,
    /// Don't log per-file errors skipped under [`ErrorPolicy::Continue`].
    pub quiet: bool,
    /// Stack size for worker threads, in bytes. `None` uses the platform
    /// default.
    pub stack_size: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: None,
            policy: ErrorPolicy::default(),
            follow_links: false,
            quiet: false,
            stack_size: None,
        }
    }
}

impl ScanOptions {
    fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    fn capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.workers).max(1)
    }
}

/// One worker per available CPU.
pub fn default_workers() -> usize {
    thread::available_parallelism().map(usize::from).unwrap_or(1)
}

/// Counters describing a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Non-directory entries found while walking.
    pub discovered: u64,
    /// Regular files handed to workers.
    pub dispatched: u64,
    /// Entries that weren't regular files.
    pub skipped: u64,
    /// Notices produced by workers.
    pub built: u64,
    /// Walk and build failures.
    pub failed: u64,
    /// Notices handed to the store.
    pub ingested: u64,
    pub inserted: u64,
    pub duplicates: u64,
    pub licenses: u64,
    pub elapsed: Duration,
    pub phase: Phase,
}

/// What a worker (or the walk) reports for one path.
#[derive(Debug)]
pub enum Outcome {
    Built { path: PathBuf, notice: Notice },
    Failed { path: PathBuf, error: Error },
}

#[derive(Debug, Default)]
struct Produced {
    discovered: u64,
    dispatched: u64,
    skipped: u64,
    fatal: Option<Error>,
}

#[derive(Debug, Default)]
struct Consumed {
    built: u64,
    failed: u64,
    ingested: u64,
    inserted: u64,
    duplicates: u64,
    licenses: u64,
    error: Option<Error>,
}

/// Runs a scan: one producer (the calling thread) walking the inputs, a fixed
/// pool of workers building notices, and a single consumer ingesting them.
///
/// # Queues
///
/// Both queues are bounded. When workers fall behind the producer blocks on
/// the dispatch queue; when ingestion falls behind workers block on the notice
/// queue. Memory use is bounded by the queue capacity, whatever the number
/// of files.
///
/// # Shutdown
///
/// 1. The producer finishes (or stops early on abort) and drops its senders.
/// 2. Workers see the dispatch queue close, drain it and exit. All of them
///    are joined.
/// 3. With every sender gone the notice queue closes; the consumer drains it
///    and exits, and is joined.
///
/// Only then does [`run`](Self::run) return, so every notice built is
/// ingested exactly once before the caller sees the store.
pub struct Coordinator<'a, S: ?Sized> {
    source: &'a S,
    options: ScanOptions,
    phase: Phase,
}

impl<'a, S: NoticeSource + ?Sized> Coordinator<'a, S> {
    pub fn new(source: &'a S, options: ScanOptions) -> Self {
        Self { source, options, phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn transition(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "Scan phase");
        self.phase = phase;
    }

    /// Scans every input into `store`.
    ///
    /// Each input is walked recursively. Inputs are pulled lazily, so an
    /// `Err` from the iterator (an unreadable path list) stops the scan.
    ///
    /// # Errors
    ///
    /// - The first per-file error under [`ErrorPolicy::Strict`].
    /// - [`ErrorKind::Structural`] under any policy.
    /// - Any error yielded by `inputs`.
    /// - [`ErrorKind::Spawn`] if a scan thread couldn't be started. No path is
    ///   dispatched in that case.
    /// - [`ErrorKind::WorkerPanicked`] if a scan thread panicked.
    pub fn run<I>(&mut self, store: &mut DedupStore, inputs: I) -> Result<ScanSummary>
    where
        I: IntoIterator<Item = Result<PathBuf>>,
    {
        let started = Instant::now();
        let workers = self.options.worker_count();
        let capacity = self.options.capacity();
        let options = self.options;
        let source = self.source;
        let abort = AtomicBool::new(false);
        let abort = &abort;
        tracing::info!(workers, capacity, policy = ?options.policy, "Starting scan");

        let ingest_into = &mut *store;
        let scanned = thread::scope(|scope| -> Result<_> {
            let (work_tx, work_rx) = bounded::<PathBuf>(capacity);
            let (notice_tx, notice_rx) = bounded::<Outcome>(capacity);

            let consumer = thread::Builder::new()
                .name("licex-ingest".to_string())
                .spawn_scoped(scope, move || consume(ingest_into, notice_rx, options, abort))
                .or_raise(|| ErrorKind::Spawn)?;
            let mut handles = Vec::with_capacity(workers);
            let mut unstarted = None;
            for index in 0..workers {
                let work_rx = work_rx.clone();
                let notice_tx = notice_tx.clone();
                let mut builder = thread::Builder::new().name(format!("licex-worker-{index}"));
                if let Some(size) = options.stack_size {
                    builder = builder.stack_size(size);
                }
                match builder.spawn_scoped(scope, move || work(source, work_rx, notice_tx, abort)) {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        tracing::debug!(started = handles.len(), "Failed to start worker");
                        unstarted = Some(e);
                        break;
                    },
                }
            }
            drop(work_rx);

            // Nothing is dispatched unless the whole pool came up.
            let produced = if unstarted.is_some() {
                abort.store(true, Ordering::Relaxed);
                Produced::default()
            } else {
                self.transition(Phase::Dispatching);
                produce(inputs, &work_tx, &notice_tx, options.follow_links, abort)
            };
            drop(work_tx);
            drop(notice_tx);

            self.transition(Phase::Draining);
            let mut panicked = false;
            for handle in handles {
                panicked |= handle.join().is_err();
            }
            let consumed = consumer.join().unwrap_or_else(|_| {
                panicked = true;
                Consumed::default()
            });
            Ok((produced, consumed, panicked, unstarted))
        });
        self.transition(Phase::Done);
        let (produced, consumed, panicked, unstarted) = scanned?;

        if let Some(e) = unstarted {
            return Err(e).or_raise(|| ErrorKind::Spawn);
        }
        if panicked {
            exn::bail!(ErrorKind::WorkerPanicked);
        }
        if let Some(error) = produced.fatal {
            return Err(error);
        }
        if let Some(error) = consumed.error {
            return Err(error);
        }
        let summary = ScanSummary {
            discovered: produced.discovered,
            dispatched: produced.dispatched,
            skipped: produced.skipped,
            built: consumed.built,
            failed: consumed.failed,
            ingested: consumed.ingested,
            inserted: consumed.inserted,
            duplicates: consumed.duplicates,
            licenses: consumed.licenses,
            elapsed: started.elapsed(),
            phase: self.phase,
        };
        tracing::info!(
            dispatched = summary.dispatched,
            failed = summary.failed,
            unique = store.len(),
            elapsed = ?summary.elapsed,
            "Scan complete"
        );
        Ok(summary)
    }
}

/// Walks every input, dispatching regular files. Walk failures go straight to
/// the consumer, which applies the error policy.
fn produce<I>(inputs: I, work: &Sender<PathBuf>, notices: &Sender<Outcome>, follow_links: bool, abort: &AtomicBool) -> Produced
where
    I: IntoIterator<Item = Result<PathBuf>>,
{
    let mut produced = Produced::default();
    'inputs: for input in inputs {
        let root = match input {
            Ok(root) => root,
            Err(e) => {
                abort.store(true, Ordering::Relaxed);
                produced.fatal = Some(e);
                break;
            },
        };
        for found in discover::walk(&root, follow_links) {
            if abort.load(Ordering::Relaxed) {
                tracing::debug!("Scan aborted; no longer dispatching");
                break 'inputs;
            }
            match found {
                Discovered::File(path) => {
                    produced.discovered += 1;
                    // Only fails once every worker is gone.
                    if work.send(path).is_err() {
                        break 'inputs;
                    }
                    produced.dispatched += 1;
                },
                Discovered::Skipped(path) => {
                    produced.discovered += 1;
                    produced.skipped += 1;
                    tracing::debug!(path = %path.display(), "Skipping (not a regular file)");
                },
                Discovered::Failed(path, error) => {
                    if notices.send(Outcome::Failed { path, error }).is_err() {
                        break 'inputs;
                    }
                },
            }
        }
    }
    produced
}

fn work<S: NoticeSource + ?Sized>(source: &S, paths: Receiver<PathBuf>, notices: Sender<Outcome>, abort: &AtomicBool) {
    for path in paths {
        if abort.load(Ordering::Relaxed) {
            continue;
        }
        let outcome = match source.build(&path) {
            Ok(notice) => Outcome::Built { path, notice },
            Err(e) => {
                let kind = if e.is_structural() {
                    ErrorKind::Structural(path.clone())
                } else {
                    ErrorKind::Build(path.clone())
                };
                Outcome::Failed { path, error: e.raise(kind) }
            },
        };
        if notices.send(outcome).is_err() {
            break;
        }
    }
}

/// The only code that touches the store while a scan runs.
fn consume(store: &mut DedupStore, notices: Receiver<Outcome>, options: ScanOptions, abort: &AtomicBool) -> Consumed {
    let mut consumed = Consumed::default();
    for outcome in notices {
        match outcome {
            Outcome::Built { path, notice } => {
                consumed.built += 1;
                // Keep draining after an abort so nothing upstream blocks.
                if consumed.error.is_some() {
                    continue;
                }
                consumed.ingested += 1;
                match store.ingest(path, notice) {
                    Ingest::Inserted(_) => consumed.inserted += 1,
                    Ingest::Duplicate(_) => consumed.duplicates += 1,
                    Ingest::License => consumed.licenses += 1,
                }
            },
            Outcome::Failed { path, error } => {
                consumed.failed += 1;
                if consumed.error.is_some() {
                    continue;
                }
                if error.is_fatal() || options.policy == ErrorPolicy::Strict {
                    tracing::debug!(path = %path.display(), "Aborting scan");
                    abort.store(true, Ordering::Relaxed);
                    consumed.error = Some(error);
                } else if !options.quiet {
                    tracing::error!(path = %path.display(), error = ?error, "Skipping file");
                }
            },
        }
    }
    consumed
}
