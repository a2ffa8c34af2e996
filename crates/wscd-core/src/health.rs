//! State report printed by `wscd --health`.

use crate::config::Config;
use crate::dir_index::DirectoryIndex;
use crate::error::Result;
use crate::history::{HistoryStats, ResultHistory};
use crate::types::DepthLimit;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub file: PathBuf,
    pub entries: usize,
    pub stale: bool,
    /// `None` when the index was never saved
    pub disk_size: Option<u64>,
}

impl IndexStats {
    pub fn of(index: &DirectoryIndex) -> Self {
        Self {
            file: index.file().to_path_buf(),
            entries: index.len(),
            stale: index.is_stale(),
            disk_size: std::fs::metadata(index.file()).ok().map(|m| m.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub root: PathBuf,
    pub depth_limit: DepthLimit,
    pub index: IndexStats,
    pub history: HistoryStats,
}

impl HealthReport {
    pub fn collect(root: &Path, config: &Config) -> Result<Self> {
        let index = DirectoryIndex::load(config.index_file()?);
        let history = ResultHistory::open(&config.history_dir()?, false)?;

        Ok(Self {
            root: root.to_path_buf(),
            depth_limit: config.depth_limit()?,
            index: IndexStats::of(&index),
            history: history.stats(root)?,
        })
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version:     {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(f, "root:        {}", self.root.display())?;
        writeln!(f, "depth limit: {}", self.depth_limit.as_raw())?;

        writeln!(f, "index:       {}", self.index.file.display())?;
        writeln!(
            f,
            "  entries:   {}{}",
            self.index.entries,
            if self.index.stale { " (stale)" } else { "" }
        )?;
        match self.index.disk_size {
            Some(size) => writeln!(f, "  size:      {size} bytes")?,
            None => writeln!(f, "  size:      not saved yet")?,
        }

        writeln!(f, "history:     {}", self.history.path.display())?;
        writeln!(f, "  size:      {} bytes", self.history.disk_size)?;
        writeln!(f, "  roots:     {}", self.history.roots)?;
        write!(f, "  recent:    {}", self.history.recent_for_root)
    }
}
