//! Depth limited, prune aware pre-order walk that maintains the directory index.

use crate::dir_index::DirectoryIndex;
use crate::path_utils::{has_trailing_components, is_pruned_dir_name};
use crate::tree_source::{NodeStat, TreeSource};
use crate::types::DepthLimit;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{Level, debug, trace, warn};

/// The walker stops as soon as it has collected this many exact matches.
pub const MAX_WALK_MATCHES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode<'q> {
    /// Record every visited directory. Used to rebuild a stale index, no matching.
    Full,
    /// Record unseen directories and collect those whose trailing components equal `query`.
    Incremental { query: &'q str },
}

pub struct Walker<'a, S: TreeSource> {
    source: &'a S,
    root: &'a Path,
    depth_limit: DepthLimit,
    index: &'a mut DirectoryIndex,
    matches: Vec<String>,
    visited_dirs: usize,
}

impl<'a, S: TreeSource> Walker<'a, S> {
    pub fn new(
        source: &'a S,
        root: &'a Path,
        depth_limit: DepthLimit,
        index: &'a mut DirectoryIndex,
    ) -> Self {
        Self {
            source,
            root,
            depth_limit,
            index,
            matches: Vec::new(),
            visited_dirs: 0,
        }
    }

    /// Walk the tree below the root and return the relative paths that matched.
    ///
    /// Full scans always return an empty list. Per node filesystem errors are logged
    /// and the node is skipped.
    #[tracing::instrument(skip(self), level = Level::DEBUG)]
    pub fn walk(mut self, mode: ScanMode<'_>) -> Vec<String> {
        let time = std::time::Instant::now();
        let mut components = Vec::new();
        let root = self.root;

        let flow = self.descend(root, &mut components, mode);

        debug!(
            visited_dirs = self.visited_dirs,
            matches = self.matches.len(),
            stopped_early = flow.is_break(),
            completed_in = ?time.elapsed(),
            "Walk completed",
        );
        self.matches
    }

    fn descend(
        &mut self,
        dir: &Path,
        components: &mut Vec<String>,
        mode: ScanMode<'_>,
    ) -> ControlFlow<()> {
        let names = match self.source.read_dir(dir) {
            Ok(names) => names,
            Err(error) => {
                warn!(path = %dir.display(), %error, "Failed to read directory, skipping");
                return ControlFlow::Continue(());
            }
        };

        for name in names {
            let path = dir.join(&name);
            let stat = match self.source.stat(&path) {
                Ok(stat) => stat,
                Err(error) => {
                    warn!(path = %path.display(), %error, "Failed to stat node, skipping");
                    continue;
                }
            };

            // files resolve to their containing directory which pre-order already visited
            if !stat.is_dir {
                continue;
            }

            components.push(name.to_string_lossy().into_owned());
            let flow = self.visit_dir(&path, components, stat, mode);
            components.pop();

            if flow.is_break() {
                return flow;
            }
        }

        ControlFlow::Continue(())
    }

    fn visit_dir(
        &mut self,
        path: &Path,
        components: &mut Vec<String>,
        stat: NodeStat,
        mode: ScanMode<'_>,
    ) -> ControlFlow<()> {
        // ancestors containing a pruned segment were never entered, so checking the
        // last component covers the whole relative path
        let Some(name) = components.last() else {
            return ControlFlow::Continue(());
        };
        if is_pruned_dir_name(name) {
            trace!(path = %path.display(), "Pruned directory");
            return ControlFlow::Continue(());
        }

        self.visited_dirs += 1;
        let depth = components.len();
        let key = components.join("/");
        let mut descend = !self.depth_limit.reached(depth);

        match mode {
            ScanMode::Full => self.index.put(key, stat.mtime),
            ScanMode::Incremental { query } => {
                let previous_mtime = self.index.get(&key);
                if previous_mtime.is_none() {
                    self.index.put(key.clone(), stat.mtime);
                }

                if has_trailing_components(components.as_slice(), query) {
                    self.matches.push(key);
                    if self.matches.len() >= MAX_WALK_MATCHES {
                        return ControlFlow::Break(());
                    }
                } else if descend
                    && self.depth_limit.is_last_descended_level(depth)
                    && let Some(previous_mtime) = previous_mtime
                    && stat.mtime <= previous_mtime
                {
                    // no direct child was added or removed, so the next level, which is
                    // the deepest one we index, cannot hold anything new
                    trace!(%key, "Unchanged directory at last level, skipping");
                    descend = false;
                }
            }
        }

        if descend {
            self.descend(path, components, mode)
        } else {
            ControlFlow::Continue(())
        }
    }
}
