//! Filesystem access used by the walker and the resolver.
//!
//! The staleness-skip heuristic in the walker relies on a platform property: a
//! directory's modification time changes only when a *direct* child is added,
//! removed or renamed. Deeper changes are invisible at the ancestor. Filesystems
//! without this guarantee make the heuristic unsound, which is why all stat calls
//! go through [`TreeSource`] and can be replaced in tests.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    pub is_dir: bool,
    /// Seconds since the unix epoch
    pub mtime: i64,
}

pub trait TreeSource {
    /// Stat a node without following symlinks.
    fn stat(&self, path: &Path) -> io::Result<NodeStat>;

    /// Names of the direct children of `path`, in the order they should be visited.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsTreeSource;

impl TreeSource for OsTreeSource {
    fn stat(&self, path: &Path) -> io::Result<NodeStat> {
        let metadata = std::fs::symlink_metadata(path)?;
        let mtime = metadata.modified().map(unix_seconds).unwrap_or(0);

        Ok(NodeStat {
            is_dir: metadata.is_dir(),
            mtime,
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let entries = std::fs::read_dir(path)?.map(|entry| entry.map(|entry| entry.file_name()));
        Ok(sorted_names(path, entries))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Collects readable entry names in sorted order. An entry that fails to read is
/// logged and skipped, its siblings are still returned.
fn sorted_names(path: &Path, entries: impl Iterator<Item = io::Result<OsString>>) -> Vec<OsString> {
    let mut names: Vec<OsString> = entries
        .filter_map(|entry| match entry {
            Ok(name) => Some(name),
            Err(error) => {
                warn!(path = %path.display(), %error, "Failed to read directory entry, skipping");
                None
            }
        })
        .collect();

    // directory entry order is platform dependent, sorting keeps the walk deterministic
    names.sort_unstable();
    names
}

pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}
