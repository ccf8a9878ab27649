use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

/// Stands in for a `..` that climbs above a relative source path.
const PARENT: &str = "_parent";

/// A directory that license files are copied into, keeping their relative
/// layout so the report can link to them.
///
/// Each destination belongs to the first source copied there; a different
/// source that maps onto it is refused rather than overwriting the copy.
#[derive(Debug, Clone)]
pub struct LicenseArchive {
    root: PathBuf,
    claimed: HashMap<PathBuf, PathBuf>,
}

impl LicenseArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), claimed: HashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `source` ends up inside the archive.
    ///
    /// `.` and `..` are resolved first, so `a/../LICENSE` lands where
    /// `LICENSE` would. Absolute paths are re-rooted under the archive, and a
    /// `..` left over at the front of a relative path becomes `_parent`, so
    /// nothing can land outside it.
    pub fn destination(&self, source: &Path) -> PathBuf {
        let relative: PathBuf = lexical(source)
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part),
                Component::ParentDir => Some(OsStr::new(PARENT)),
                Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
            })
            .collect();
        self.root.join(relative)
    }

    /// Copies `source` into the archive, creating directories as needed.
    ///
    /// Copying the same source twice returns the existing copy.
    #[instrument(level = "debug", skip(self))]
    pub fn copy(&mut self, source: &Path) -> Result<PathBuf> {
        let destination = self.destination(source);
        let normalized = lexical(source);
        match self.claimed.get(&destination) {
            Some(owner) if *owner == normalized => return Ok(destination),
            Some(owner) => {
                tracing::warn!(owner = %owner.display(), destination = %destination.display(), "Archive destination taken");
                exn::bail!(ErrorKind::ArchiveCollision(source.to_path_buf()));
            },
            None => {},
        }
        let archive_error = || ErrorKind::Archive(source.to_path_buf());
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).or_raise(archive_error)?;
        }
        std::fs::copy(source, &destination).or_raise(archive_error)?;
        tracing::debug!(destination = %destination.display(), "Archived license");
        self.claimed.insert(destination.clone(), normalized);
        Ok(destination)
    }
}

/// Resolves `.` and `..` without touching the filesystem. A `..` directly
/// under the root is dropped; one with nothing left to pop is kept.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {},
            Component::ParentDir if depth > 0 => {
                out.pop();
                depth -= 1;
            },
            Component::ParentDir if out.has_root() => {},
            Component::ParentDir => out.push(component),
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pkg/LICENSE", "out/pkg/LICENSE")]
    #[case("/usr/src/pkg/COPYING", "out/usr/src/pkg/COPYING")]
    #[case("./pkg/../LICENSE", "out/LICENSE")]
    #[case("a/b/../../c/LICENSE", "out/c/LICENSE")]
    #[case("../vendor/LICENSE", "out/_parent/vendor/LICENSE")]
    #[case("/../etc/LICENSE", "out/etc/LICENSE")]
    fn destinations_stay_inside(#[case] source: &str, #[case] expected: &str) {
        let archive = LicenseArchive::new("out");
        assert_eq!(archive.destination(Path::new(source)), PathBuf::from(expected));
    }

    #[test]
    fn copies_with_structure() {
        let source_dir = tempfile::tempdir().unwrap();
        let archive_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("pkg/LICENSE");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "MIT\n").unwrap();

        let mut archive = LicenseArchive::new(archive_dir.path());
        let copied = archive.copy(&source).unwrap();
        assert!(copied.starts_with(archive_dir.path()));
        assert!(copied.ends_with("pkg/LICENSE"));
        assert_eq!(std::fs::read_to_string(&copied).unwrap(), "MIT\n");
        assert_eq!(archive.copy(&source).unwrap(), copied);
    }

    #[test]
    fn parent_components_keep_copies_apart() {
        let source_dir = tempfile::tempdir().unwrap();
        let archive_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(source_dir.path().join("a")).unwrap();
        std::fs::write(source_dir.path().join("LICENSE"), "TOP\n").unwrap();
        std::fs::write(source_dir.path().join("a/LICENSE"), "NESTED\n").unwrap();

        let mut archive = LicenseArchive::new(archive_dir.path());
        let top = archive.copy(&source_dir.path().join("a/../LICENSE")).unwrap();
        let nested = archive.copy(&source_dir.path().join("a/LICENSE")).unwrap();
        assert_ne!(top, nested);
        assert_eq!(std::fs::read_to_string(top).unwrap(), "TOP\n");
        assert_eq!(std::fs::read_to_string(nested).unwrap(), "NESTED\n");
    }

    #[test]
    fn colliding_sources_are_refused() {
        let archive_dir = tempfile::tempdir().unwrap();
        let mut archive = LicenseArchive::new(archive_dir.path());
        let outside = Path::new("../LICENSE");
        let inside = Path::new("_parent/LICENSE");
        assert_eq!(archive.destination(outside), archive.destination(inside));

        archive.claimed.insert(archive.destination(outside), lexical(outside));
        let err = archive.copy(inside).unwrap_err();
        assert_eq!(*err, ErrorKind::ArchiveCollision(inside.to_path_buf()));
        assert!(!archive.destination(inside).exists());
    }

    #[test]
    fn missing_source_is_an_archive_error() {
        let archive_dir = tempfile::tempdir().unwrap();
        let err = LicenseArchive::new(archive_dir.path()).copy(Path::new("no/such/LICENSE")).unwrap_err();
        assert_eq!(*err, ErrorKind::Archive(PathBuf::from("no/such/LICENSE")));
    }
}
