//! Recent ambiguous results, remembered per workspace root so a later
//! invocation can pick one of them by position.

use crate::error::{Error, Result};
use crate::types::RankedMatch;
use heed::types::{Bytes, SerdeBincode};
use heed::{Database, Env, EnvFlags, EnvOpenOptions};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_RECENT_RESULTS: usize = 10;

#[derive(Debug)]
pub struct ResultHistory {
    env: Env,
    // root -> results of the last ambiguous resolution under that root
    recent_db: Database<Bytes, SerdeBincode<Vec<RankedMatch>>>,
}

/// Storage statistics of the history environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStats {
    pub path: PathBuf,
    /// Size on disk in bytes
    pub disk_size: u64,
    /// Number of roots with remembered results
    pub roots: u64,
    /// Results remembered for the root the stats were asked for
    pub recent_for_root: usize,
}

impl ResultHistory {
    /// Opens (creating if needed) the history environment stored in `db_path`.
    ///
    /// `use_unsafe_no_lock` disables LMDB locking and syncing, only suitable
    /// when a single process touches the environment.
    pub fn open(db_path: &Path, use_unsafe_no_lock: bool) -> Result<Self> {
        fs::create_dir_all(db_path).map_err(Error::CreateDir)?;
        let env = unsafe {
            let mut opts = EnvOpenOptions::new();
            opts.max_dbs(4);
            if use_unsafe_no_lock {
                opts.flags(EnvFlags::NO_LOCK | EnvFlags::NO_SYNC | EnvFlags::NO_META_SYNC);
            }
            opts.open(db_path).map_err(Error::EnvOpen)?
        };

        env.clear_stale_readers()
            .map_err(Error::DbClearStaleReaders)?;

        let mut wtxn = env.write_txn().map_err(Error::DbStartWriteTxn)?;
        let recent_db = env
            .create_database(&mut wtxn, Some("recent_results"))
            .map_err(Error::DbCreate)?;
        wtxn.commit().map_err(Error::DbCommit)?;

        Ok(Self { env, recent_db })
    }

    fn create_root_key(root: &Path) -> Result<[u8; 32]> {
        let root_str = root
            .to_str()
            .ok_or_else(|| Error::InvalidPath(root.to_path_buf()))?;

        Ok(*blake3::hash(root_str.as_bytes()).as_bytes())
    }

    /// Replaces the remembered results for `root`. Only the first
    /// [`MAX_RECENT_RESULTS`] matches are kept.
    pub fn record(&mut self, root: &Path, matches: &[RankedMatch]) -> Result<()> {
        let root_key = Self::create_root_key(root)?;
        let kept = &matches[..matches.len().min(MAX_RECENT_RESULTS)];

        let mut wtxn = self.env.write_txn().map_err(Error::DbStartWriteTxn)?;
        self.recent_db
            .put(&mut wtxn, &root_key, &kept.to_vec())
            .map_err(Error::DbWrite)?;
        wtxn.commit().map_err(Error::DbCommit)?;

        tracing::debug!(root = %root.display(), recorded = kept.len(), "Recorded recent results");
        Ok(())
    }

    pub fn recent(&self, root: &Path) -> Result<Vec<RankedMatch>> {
        let root_key = Self::create_root_key(root)?;
        let rtxn = self.env.read_txn().map_err(Error::DbStartReadTxn)?;

        Ok(self
            .recent_db
            .get(&rtxn, &root_key)
            .map_err(Error::DbRead)?
            .unwrap_or_default())
    }

    pub fn stats(&self, root: &Path) -> Result<HistoryStats> {
        let disk_size = self.env.real_disk_size().map_err(Error::DbRead)?;
        let roots = {
            let rtxn = self.env.read_txn().map_err(Error::DbStartReadTxn)?;
            self.recent_db.len(&rtxn).map_err(Error::DbRead)?
        };

        Ok(HistoryStats {
            path: self.env.path().to_path_buf(),
            disk_size,
            roots,
            recent_for_root: self.recent(root)?.len(),
        })
    }

    /// Entry at the 1-based `position` of the remembered results for `root`.
    pub fn nth(&self, root: &Path, position: usize) -> Result<RankedMatch> {
        let mut recent = self.recent(root)?;
        if position == 0 || position > recent.len() {
            return Err(Error::HistoryOutOfRange(position));
        }

        Ok(recent.swap_remove(position - 1))
    }
}
