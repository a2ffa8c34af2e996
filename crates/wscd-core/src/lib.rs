//! wscd-core - workspace directory resolution library
//!
//! Resolves a short query to directories below a workspace root. A persisted
//! [`DirectoryIndex`] of relative path to mtime avoids re-scanning the tree on
//! every call; the [`walker`] keeps it fresh and finds exact suffix matches, and
//! the [`score`] module ranks fuzzy candidates when nothing matches exactly.

pub mod config;
pub mod dir_index;
mod error;
pub mod health;
pub mod history;
pub mod log;
pub mod path_utils;
pub mod resolver;
pub mod score;
#[cfg(test)]
mod test_support;
pub mod tree_source;
pub mod types;
pub mod walker;

pub use config::Config;
pub use dir_index::DirectoryIndex;
pub use error::{Error, Result};
pub use health::HealthReport;
pub use history::ResultHistory;
pub use resolver::{Resolution, ResolveState, Resolver};
pub use tree_source::{NodeStat, OsTreeSource, TreeSource};
pub use types::{DepthLimit, IndexEntry, RankedMatch};
