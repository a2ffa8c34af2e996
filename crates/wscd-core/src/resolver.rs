//! Resolution of a query to directories below the workspace root.
//!
//! Resolution tries, in order: an absolute query, a path relative to the root,
//! the stored index (rebuilding it first when stale), an incremental walk for
//! exact suffix matches and finally fuzzy ranking over every indexed path. The
//! index is saved once before any outcome is returned.

use crate::dir_index::DirectoryIndex;
use crate::error::{Error, Result};
use crate::score::{self, DEFAULT_RANK_LIMIT};
use crate::tree_source::{OsTreeSource, TreeSource};
use crate::types::{DepthLimit, RankedMatch};
use crate::walker::{ScanMode, Walker};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, warn};

/// Which step of the resolution produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    AbsoluteInput,
    DirectRelativeHit,
    SubpathCacheHit,
    WalkerSearch,
    FuzzyFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: ResolveState,
    /// Exact matches carry distance 0. Only `FuzzyFallback` can produce an empty list.
    pub matches: Vec<RankedMatch>,
}

impl Resolution {
    fn new(state: ResolveState, matches: Vec<RankedMatch>) -> Self {
        Self { state, matches }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.matches.len() > 1
    }
}

#[derive(Debug)]
pub struct Resolver<S: TreeSource = OsTreeSource> {
    root: PathBuf,
    depth_limit: DepthLimit,
    index: DirectoryIndex,
    source: S,
    rank_limit: usize,
}

impl Resolver<OsTreeSource> {
    pub fn new(root: impl Into<PathBuf>, depth_limit: DepthLimit, index: DirectoryIndex) -> Self {
        Self::with_source(root, depth_limit, index, OsTreeSource)
    }
}

impl<S: TreeSource> Resolver<S> {
    pub fn with_source(
        root: impl Into<PathBuf>,
        depth_limit: DepthLimit,
        index: DirectoryIndex,
        source: S,
    ) -> Self {
        Self {
            root: root.into(),
            depth_limit,
            index,
            source,
            rank_limit: DEFAULT_RANK_LIMIT,
        }
    }

    pub fn with_rank_limit(mut self, rank_limit: usize) -> Self {
        self.rank_limit = rank_limit;
        self
    }

    pub fn index(&self) -> &DirectoryIndex {
        &self.index
    }

    pub fn into_index(self) -> DirectoryIndex {
        self.index
    }

    /// Resolve `query` to an ordered list of matches.
    ///
    /// Returns [`Error::NoMatch`] when neither an exact nor a fuzzy candidate exists.
    /// Several matches are not an error, callers decide how to present them.
    pub fn find(&mut self, query: &str) -> Result<Vec<RankedMatch>> {
        let resolution = self.find_with_state(query);
        if resolution.matches.is_empty() {
            return Err(Error::NoMatch(query.to_owned()));
        }

        Ok(resolution.matches)
    }

    #[tracing::instrument(skip(self), fields(root = %self.root.display()), level = Level::DEBUG)]
    pub fn find_with_state(&mut self, query: &str) -> Resolution {
        let resolution = self.resolve(query);
        debug!(
            state = ?resolution.state,
            matches = resolution.matches.len(),
            "Resolved query"
        );

        match self.index.save() {
            Ok(true) => debug!(path = %self.index.file().display(), "Directory index persisted"),
            Ok(false) => {}
            Err(error) => warn!(%error, "Failed to save directory index"),
        }

        resolution
    }

    fn resolve(&mut self, query: &str) -> Resolution {
        if Path::new(query).is_absolute() {
            return Resolution::new(ResolveState::AbsoluteInput, vec![RankedMatch::exact(query)]);
        }

        let direct = self.root.join(query);
        if self.source.exists(&direct) {
            return Resolution::new(
                ResolveState::DirectRelativeHit,
                vec![RankedMatch::exact(direct.to_string_lossy())],
            );
        }

        let rebuilt = self.index.is_stale();
        if rebuilt {
            self.rebuild();
        }

        if let Some(matches) = self.cached_matches(query, rebuilt) {
            return Resolution::new(ResolveState::SubpathCacheHit, matches);
        }

        let found = Walker::new(&self.source, &self.root, self.depth_limit, &mut self.index)
            .walk(ScanMode::Incremental { query });
        if !found.is_empty() {
            let matches = found
                .iter()
                .map(|relative| RankedMatch::exact(self.absolute(relative).to_string_lossy()))
                .collect();
            return Resolution::new(ResolveState::WalkerSearch, matches);
        }

        let matches = score::rank(query, self.index.paths(), &self.root, self.rank_limit);
        Resolution::new(ResolveState::FuzzyFallback, matches)
    }

    fn rebuild(&mut self) {
        let time = std::time::Instant::now();
        Walker::new(&self.source, &self.root, self.depth_limit, &mut self.index)
            .walk(ScanMode::Full);
        self.index.mark_rebuilt();

        info!(
            entries = self.index.len(),
            completed_in = ?time.elapsed(),
            "Rebuilt directory index"
        );
    }

    /// Matches served from the index alone, or `None` to fall through to a walk.
    ///
    /// An exact key hit falls through as well: the direct path was already found
    /// missing on disk, so the entry is a leftover of a removed directory.
    fn cached_matches(&self, query: &str, rebuilt: bool) -> Option<Vec<RankedMatch>> {
        let search = self.index.suffix_search(query);
        if !search.is_decisive() {
            debug!(
                exact = search.exact,
                candidates = search.matches.len(),
                "Index lookup not decisive"
            );
            return None;
        }

        let matches: Vec<RankedMatch> = search
            .matches
            .iter()
            .map(|relative| self.absolute(relative))
            // a rebuild in this run already proved existence
            .filter(|target| rebuilt || self.source.exists(target))
            .map(|target| RankedMatch::exact(target.to_string_lossy()))
            .collect();

        if matches.is_empty() {
            debug!(
                candidates = search.matches.len(),
                "Every cached candidate vanished from disk"
            );
            return None;
        }

        Some(matches)
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}
