//! Command line arguments, layered over the loaded configuration.

use clap::Parser;
use licex_config::{Config, Policy};
use licex_scan::Delimiter;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Extract copyright notices from a source tree and report each distinct one
/// once, with every file it came from.
#[derive(Debug, Parser)]
#[command(name = "licex", version, about)]
pub struct Args {
    /// Files or directories to scan; directories are walked recursively.
    #[arg(required_unless_present = "input")]
    pub paths: Vec<PathBuf>,

    /// Read further paths from FILE, one per line (`-` for standard input).
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Paths in the input list are NUL separated, as from `find -print0`.
    #[arg(short = '0', long = "null", requires = "input")]
    pub null: bool,

    /// Write the report to FILE instead of standard output.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Copy license files into DIR and link to the copies.
    #[arg(long = "ldir", value_name = "DIR")]
    pub license_dir: Option<PathBuf>,

    /// Link the HTML report to this stylesheet instead of embedding one.
    #[arg(long, value_name = "URL")]
    pub style: Option<String>,

    #[arg(long, value_parser = ["html", "json"])]
    pub format: Option<String>,

    /// Skip files that fail instead of stopping at the first one.
    #[arg(long = "continue")]
    pub keep_going: bool,

    /// Only log errors, and don't log files skipped by `--continue`.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More logging (`-v` info, `-vv` debug, `-vvv` trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log every notice as it's extracted.
    #[arg(long = "showlic")]
    pub show_notices: bool,

    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Number of hash buckets in the store.
    #[arg(long, value_name = "N")]
    pub buckets: Option<usize>,

    /// Digest byte offset used for the bucket key.
    #[arg(long, value_name = "N")]
    pub index_offset: Option<usize>,

    /// Config file (TOML, YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Overrides `config` with every flag that was given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(buckets) = self.buckets {
            config.buckets = buckets;
        }
        if let Some(index_offset) = self.index_offset {
            config.index_offset = index_offset;
        }
        if self.keep_going {
            config.policy = Policy::Continue;
        }
        config.quiet |= self.quiet;
        config.show_notices |= self.show_notices;
        if let Some(dir) = &self.license_dir {
            config.license_dir = Some(dir.clone());
        }
        if let Some(style) = &self.style {
            config.stylesheet = Some(style.clone());
        }
        // Restricted to known values by clap.
        if let Some(format) = self.format.as_deref().and_then(|format| format.parse().ok()) {
            config.format = format;
        }
    }

    pub fn delimiter(&self) -> Delimiter {
        if self.null { Delimiter::Nul } else { Delimiter::Newline }
    }

    /// `None` when the path list comes from standard input.
    pub fn input_file(&self) -> Option<Option<&Path>> {
        self.input.as_deref().map(|path| (path != Path::new("-")).then_some(path))
    }

    /// Default log level when `RUST_LOG` isn't set.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
