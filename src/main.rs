mod cli;
mod error;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use licex_config::{Config, Policy};
use licex_notice::NoticeBuilder;
use licex_report::{Format, LicenseArchive, Report, Style, write_report};
use licex_scan::{Coordinator, ErrorPolicy, ScanOptions, ScanSummary, default_workers, precheck, read_path_list};
use licex_store::DedupStore;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);
    match run(&args) {
        Ok(summary) => {
            tracing::info!(
                files = summary.dispatched,
                unique = summary.inserted,
                duplicates = summary.duplicates,
                licenses = summary.licenses,
                failed = summary.failed,
                elapsed = ?summary.elapsed,
                "Done"
            );
            ExitCode::SUCCESS
        },
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(args: &Args) {
    let mut filter = EnvFilter::builder().with_default_directive(args.log_level().into()).from_env_lossy();
    if args.show_notices
        && let Ok(directive) = "licex_notice=info".parse::<Directive>()
    {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn run(args: &Args) -> Result<ScanSummary> {
    let mut config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    args.apply(&mut config);
    tracing::debug!(?config, "Configuration");

    for path in &args.paths {
        precheck(path).or_raise(|| ErrorKind::Precheck)?;
    }
    let mut store = DedupStore::new(config.store_options()).or_raise(|| ErrorKind::Store)?;
    // Fail on a bad destination before scanning, not after.
    let output = Output::open(args.output.as_deref())?;
    let path_list = match args.input_file() {
        None => None,
        Some(file) => Some(open_path_list(file.map(PathBuf::from))?),
    };

    let builder = NoticeBuilder::discover().show_notices(config.show_notices);
    tracing::debug!(classifier = builder.classifier().name(), "Using classifier");
    let options = ScanOptions {
        workers: config.workers.unwrap_or_else(default_workers),
        queue_capacity: config.queue_capacity,
        policy: match config.policy {
            Policy::Strict => ErrorPolicy::Strict,
            Policy::Continue => ErrorPolicy::Continue,
        },
        follow_links: config.follow_links,
        quiet: config.quiet,
        stack_size: None,
    };
    let roots = args.paths.iter().cloned().map(Ok);
    let listed = path_list.into_iter().flat_map(|reader| read_path_list(reader, args.delimiter()));
    let summary =
        Coordinator::new(&builder, options).run(&mut store, roots.chain(listed)).or_raise(|| ErrorKind::Scan)?;

    let mut report = Report::new(&store);
    if let Some(dir) = &config.license_dir {
        report.archive_licenses(&mut LicenseArchive::new(dir)).or_raise(|| ErrorKind::Report)?;
    }
    let style = config.stylesheet.clone().map_or(Style::Embedded, Style::Link);
    output.write(&report, config.format, style)?;
    Ok(summary)
}

/// Where the report goes. A file report is written next to its destination
/// and only moved into place once complete, so a failed run leaves any
/// previous report untouched.
enum Output {
    Stdout,
    File { temp: NamedTempFile, path: PathBuf },
}

impl Output {
    fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Stdout);
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir).or_raise(|| ErrorKind::Output(path.to_path_buf()))?;
        Ok(Self::File { temp, path: path.to_path_buf() })
    }

    fn write(self, report: &Report, format: Format, style: Style) -> Result<()> {
        match self {
            Self::Stdout => {
                let mut w = BufWriter::new(io::stdout().lock());
                write_report(report, format, style, &mut w).or_raise(|| ErrorKind::Report)?;
                w.flush().or_raise(|| ErrorKind::Report)
            },
            Self::File { temp, path } => {
                let mut w = BufWriter::new(temp.as_file());
                write_report(report, format, style, &mut w).or_raise(|| ErrorKind::Report)?;
                w.flush().or_raise(|| ErrorKind::Report)?;
                drop(w);
                temp.persist(&path).or_raise(|| ErrorKind::Output(path.clone()))?;
                Ok(())
            },
        }
    }
}

/// `None` reads the list from standard input.
fn open_path_list(path: Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(&path).or_raise(|| ErrorKind::PathList(path.clone()))?)),
        None => Box::new(io::stdin().lock()),
    })
}
