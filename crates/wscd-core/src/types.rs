use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A directory observed under the root, keyed by its slash separated relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub path: String,
    /// Seconds since the unix epoch
    pub mtime: i64,
}

/// A resolved candidate. `distance == 0` denotes an exact match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub target: String,
    pub distance: u32,
}

impl RankedMatch {
    pub fn exact(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            distance: 0,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.distance == 0
    }
}

impl Ord for RankedMatch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.target.cmp(&other.target))
    }
}

impl PartialOrd for RankedMatch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How deep below the root the walker is allowed to go.
///
/// Depth is counted in directory components between the root and a node's
/// containing directory, so `alpha/beta` has depth 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthLimit {
    #[default]
    Unlimited,
    Levels(usize),
}

impl DepthLimit {
    /// Parses the raw configuration value where `-1` means unlimited.
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            -1 => Ok(DepthLimit::Unlimited),
            n if n >= 0 => Ok(DepthLimit::Levels(n as usize)),
            n => Err(Error::InvalidDepthLimit(n)),
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            DepthLimit::Unlimited => -1,
            DepthLimit::Levels(n) => n as i64,
        }
    }

    /// Nodes at or beyond this depth are recorded but never descended into.
    #[inline]
    pub fn reached(self, depth: usize) -> bool {
        match self {
            DepthLimit::Unlimited => false,
            DepthLimit::Levels(max) => depth >= max,
        }
    }

    /// The only level whose unchanged mtime proves no new leaves can appear below it.
    #[inline]
    pub fn is_last_descended_level(self, depth: usize) -> bool {
        match self {
            DepthLimit::Unlimited => false,
            DepthLimit::Levels(max) => max > 0 && depth == max - 1,
        }
    }
}
