//! Turning roots and path lists into the files a scan visits.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Separator between records of a path list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    Newline,
    /// As printed by `find -print0`.
    Nul,
}
impl Delimiter {
    fn byte(&self) -> u8 {
        match self {
            Delimiter::Newline => b'\n',
            Delimiter::Nul => b'\0',
        }
    }
}

/// Reads a delimited list of paths. Blank records are skipped; with newline
/// delimiters a trailing carriage return is dropped too.
///
/// Records are read lazily so a list piped in from `find` starts scanning
/// before `find` is done.
pub fn read_path_list<R: BufRead>(reader: R, delimiter: Delimiter) -> impl Iterator<Item = Result<PathBuf>> {
    reader.split(delimiter.byte()).filter_map(move |record| {
        let mut record = match record.or_raise(|| ErrorKind::PathList) {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };
        if delimiter == Delimiter::Newline && record.last() == Some(&b'\r') {
            record.pop();
        }
        if record.is_empty() {
            return None;
        }
        Some(Ok(path_from_bytes(record)))
    })
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Checks that a root path can be read before any scanning starts.
///
/// Directories must be listable, files and symlinks openable. Only the root
/// itself is checked; problems further down the tree are per-file errors.
pub fn precheck(path: &Path) -> Result<()> {
    tracing::debug!(path = %path.display(), "Checking accessibility");
    let inaccessible = || ErrorKind::Inaccessible(path.to_path_buf());
    let metadata = std::fs::symlink_metadata(path).or_raise(inaccessible)?;
    if metadata.is_dir() {
        std::fs::read_dir(path).or_raise(inaccessible)?;
    } else if metadata.is_file() || metadata.is_symlink() {
        File::open(path).or_raise(inaccessible)?;
    }
    Ok(())
}

/// One entry found while walking a root.
#[derive(Debug)]
pub enum Discovered {
    /// A regular file, to be dispatched.
    File(PathBuf),
    /// Something that isn't a regular file or directory (socket, device,
    /// unfollowed symlink).
    Skipped(PathBuf),
    Failed(PathBuf, crate::error::Error),
}

/// Walks `root` depth first. Directories are entered but never reported.
pub fn walk(root: &Path, follow_links: bool) -> impl Iterator<Item = Discovered> {
    let root = root.to_path_buf();
    WalkDir::new(&root).follow_links(follow_links).into_iter().filter_map(move |entry| match entry {
        Ok(entry) if entry.file_type().is_dir() => None,
        Ok(entry) if entry.file_type().is_file() => Some(Discovered::File(entry.into_path())),
        Ok(entry) => Some(Discovered::Skipped(entry.into_path())),
        Err(e) => {
            let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
            let error = exn::Exn::from(e).raise(ErrorKind::Walk(path.clone()));
            Some(Discovered::Failed(path, error))
        },
    })
}
