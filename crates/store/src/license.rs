use crate::consts::LICENSE_REGEX;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Whether `path` looks like a license document by name, rather than a source
/// file that might carry a notice.
pub fn is_license(path: &Path) -> bool {
    LICENSE_REGEX.is_match(&path.to_string_lossy())
}

/// Occurrence counts of license files, by path.
///
/// Kept apart from the digest index: license documents are reported by where
/// they are, not by what they say.
#[derive(Debug, Default, Clone)]
pub struct LicenseRegistry {
    paths: BTreeMap<PathBuf, u64>,
}

impl LicenseRegistry {
    /// Counts one more sighting of `path`, returning its new count.
    pub fn add(&mut self, path: PathBuf) -> u64 {
        let count = self.paths.entry(path).or_default();
        *count += 1;
        *count
    }

    pub fn count(&self, path: &Path) -> u64 {
        self.paths.get(path).copied().unwrap_or_default()
    }

    /// Number of distinct license paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Every license path with its count, sorted by path.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, u64)> {
        self.paths.iter().map(|(path, count)| (path.as_path(), *count))
    }
}
