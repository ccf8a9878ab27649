//! # Licex Config
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults.
//! 2. A config file: either the one named on the command line, or
//!    `config.toml` in the platform config directory if it exists. TOML, YAML
//!    and JSON are accepted, picked by extension.
//! 3. `LICEX_`-prefixed environment variables (`LICEX_WORKERS=4`).
//!
//! Command line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format as _, Json, Serialized, Toml, Yaml};
use licex_report::Format;
use licex_store::{DEFAULT_HISTOGRAM_LEN, DEFAULT_INDEX_OFFSET, DEFAULT_NUM_BUCKETS, StoreOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "LICEX_";
const CONFIG_FILE: &str = "config.toml";

/// What to do when a single file can't be processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Strict,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build workers; unset means one per available core.
    pub workers: Option<usize>,
    /// Bound of the work queues; unset means the worker count.
    pub queue_capacity: Option<usize>,
    pub buckets: usize,
    pub index_offset: usize,
    pub histogram_len: usize,
    pub policy: Policy,
    pub quiet: bool,
    /// Log every notice as it's built.
    pub show_notices: bool,
    pub follow_links: bool,
    /// Directory that license files are copied into.
    pub license_dir: Option<PathBuf>,
    /// Stylesheet to link instead of inlining the built-in one.
    pub stylesheet: Option<String>,
    pub format: Format,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: None,
            queue_capacity: None,
            buckets: DEFAULT_NUM_BUCKETS,
            index_offset: DEFAULT_INDEX_OFFSET,
            histogram_len: DEFAULT_HISTOGRAM_LEN,
            policy: Policy::default(),
            quiet: false,
            show_notices: false,
            follow_links: false,
            license_dir: None,
            stylesheet: None,
            format: Format::default(),
        }
    }
}

impl Config {
    /// Loads the layered configuration. An explicit file must exist; the
    /// default one is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_path().filter(|path| path.is_file()),
        };
        Self::from_figment(Self::figment(file.as_deref())?)
    }

    /// Defaults, then `file` (if any), then the environment.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "Loading config file");
            figment = match extension(path).as_deref() {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::default()
            .with_buckets(self.buckets)
            .with_index_offset(self.index_offset)
            .with_histogram_len(self.histogram_len)
    }
}

/// `config.toml` in the platform's config directory for licex.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "licex").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
