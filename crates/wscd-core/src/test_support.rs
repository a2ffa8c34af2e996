//! Shared fixtures for unit tests.

use crate::tree_source::{NodeStat, TreeSource};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory tree with controllable mtimes that records every directory read.
#[derive(Default)]
pub struct MemoryTree {
    nodes: BTreeMap<PathBuf, NodeStat>,
    pub denied: Vec<PathBuf>,
    reads: RefCell<Vec<PathBuf>>,
}

impl MemoryTree {
    pub fn dir(mut self, path: &str, mtime: i64) -> Self {
        self.nodes.insert(
            PathBuf::from(path),
            NodeStat {
                is_dir: true,
                mtime,
            },
        );
        self
    }

    pub fn file(mut self, path: &str, mtime: i64) -> Self {
        self.nodes.insert(
            PathBuf::from(path),
            NodeStat {
                is_dir: false,
                mtime,
            },
        );
        self
    }

    /// Drops `path` and everything below it.
    pub fn remove(&mut self, path: &str) {
        let path = Path::new(path);
        self.nodes.retain(|node, _| !node.starts_with(path));
    }

    pub fn was_read(&self, path: &str) -> bool {
        self.reads.borrow().iter().any(|read| read == Path::new(path))
    }
}

impl TreeSource for MemoryTree {
    fn stat(&self, path: &Path) -> io::Result<NodeStat> {
        self.nodes
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such node"))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        self.reads.borrow_mut().push(path.to_path_buf());
        if self.denied.iter().any(|denied| denied == path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        match self.nodes.get(path) {
            Some(stat) if stat.is_dir => Ok(self
                .nodes
                .keys()
                .filter(|candidate| candidate.parent() == Some(path))
                .filter_map(|candidate| candidate.file_name().map(OsString::from))
                .collect()),
            Some(_) => Err(io::Error::other("not a directory")),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such node")),
        }
    }
}
