//! Persisted map of relative directory path to last observed mtime.
//!
//! The index never stores negative information: a missing key means "not observed
//! yet", and keys for directories removed from disk linger until overwritten.
//! Resolution re-checks existence instead of purging.

use crate::error::{Error, Result};
use crate::path_utils::{has_trailing_components, split_key};
use crate::types::IndexEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Index format version - increment when changing the format.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// `suffix_search` stops once it has collected this many paths.
/// A result of this size is not a safe narrow match.
pub const SUFFIX_SEARCH_OVERFLOW: usize = 11;

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixSearch {
    pub matches: Vec<String>,
    /// The query itself is a key of the index; `matches` is left empty.
    pub exact: bool,
}

impl SuffixSearch {
    pub fn is_overflowing(&self) -> bool {
        self.matches.len() >= SUFFIX_SEARCH_OVERFLOW
    }

    /// A non-empty list small enough to be returned as is.
    pub fn is_decisive(&self) -> bool {
        !self.exact && !self.matches.is_empty() && !self.is_overflowing()
    }
}

#[derive(Debug)]
pub struct DirectoryIndex {
    file: PathBuf,
    // keys are sorted so that saves of the same content are byte identical
    entries: BTreeMap<String, i64>,
    stale: bool,
    dirty: bool,
}

impl DirectoryIndex {
    /// An empty index that is considered fresh and will be persisted to `file`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            entries: BTreeMap::new(),
            stale: false,
            dirty: false,
        }
    }

    /// Load the index persisted at `file`.
    ///
    /// Never fails: a missing or undecodable file yields an empty index flagged
    /// stale, which forces a full rebuild on the next resolution.
    pub fn load(file: impl Into<PathBuf>) -> Self {
        let mut index = Self::new(file);

        match read_entries(&index.file) {
            Ok(entries) => {
                debug!(
                    path = %index.file.display(),
                    entries = entries.len(),
                    "Loaded directory index"
                );
                index.entries = entries;
            }
            Err(Error::IndexRead { source, .. }) if source.kind() == ErrorKind::NotFound => {
                info!(path = %index.file.display(), "No directory index yet, full scan required");
                index.mark_stale();
            }
            Err(error) => {
                warn!(
                    path = %index.file.display(),
                    %error,
                    "Failed to load directory index, full scan required"
                );
                index.mark_stale();
            }
        }

        index
    }

    fn mark_stale(&mut self) {
        self.entries.clear();
        self.stale = true;
        self.dirty = true;
    }

    /// Called once a full scan repopulated the index.
    pub fn mark_rebuilt(&mut self) {
        self.stale = false;
        self.dirty = true;
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn exact_lookup(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    #[inline]
    pub fn get(&self, path: &str) -> Option<i64> {
        self.entries.get(path).copied()
    }

    pub fn put(&mut self, path: impl Into<String>, mtime: i64) {
        self.entries.insert(path.into(), mtime);
        self.dirty = true;
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = IndexEntry> + '_ {
        self.entries.iter().map(|(path, mtime)| IndexEntry {
            path: path.clone(),
            mtime: *mtime,
        })
    }

    /// Find stored paths whose trailing components equal `query`.
    ///
    /// An exact key hit short-circuits with `exact = true`. Otherwise the scan stops
    /// after [`SUFFIX_SEARCH_OVERFLOW`] matches.
    pub fn suffix_search(&self, query: &str) -> SuffixSearch {
        if self.exact_lookup(query) {
            return SuffixSearch {
                matches: Vec::new(),
                exact: true,
            };
        }

        let mut matches = Vec::new();
        for path in self.entries.keys() {
            let components = split_key(path);
            if has_trailing_components(&components, query) {
                matches.push(path.clone());
                if matches.len() >= SUFFIX_SEARCH_OVERFLOW {
                    break;
                }
            }
        }

        SuffixSearch {
            matches,
            exact: false,
        }
    }

    /// Persist the index if it changed during this run.
    ///
    /// Returns whether anything was written. A stale index that was never rebuilt
    /// is not written, otherwise its empty snapshot would be trusted on the next run.
    pub fn save(&mut self) -> Result<bool> {
        if self.stale {
            debug!(path = %self.file.display(), "Skipping save of a stale directory index");
            return Ok(false);
        }
        if !self.dirty {
            return Ok(false);
        }

        let persisted = PersistedIndex {
            version: INDEX_FORMAT_VERSION,
            entries: self.entries().collect(),
        };
        write_atomically(&self.file, &persisted)?;
        self.dirty = false;

        debug!(
            path = %self.file.display(),
            entries = persisted.entries.len(),
            "Saved directory index"
        );
        Ok(true)
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, i64>> {
    let bytes = fs::read(path).map_err(|source| Error::IndexRead {
        path: path.to_path_buf(),
        source,
    })?;

    // decoding from the slice bounds every length prefix by the bytes actually present
    let persisted: PersistedIndex = bincode::deserialize(&bytes).map_err(Error::IndexDecode)?;

    if persisted.version != INDEX_FORMAT_VERSION {
        return Err(Error::IndexVersion {
            found: persisted.version,
            expected: INDEX_FORMAT_VERSION,
        });
    }

    Ok(persisted
        .entries
        .into_iter()
        .map(|entry| (entry.path, entry.mtime))
        .collect())
}

/// Write to a temp file first and rename it over the target so that a crash
/// mid-write never leaves a truncated index behind.
fn write_atomically(path: &Path, persisted: &PersistedIndex) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(Error::CreateDir)?;
    }

    let tmp_path = path.with_extension("tmp");
    let write_error = |source| Error::IndexWrite {
        path: tmp_path.clone(),
        source,
    };

    {
        let file = File::create(&tmp_path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, persisted).map_err(Error::IndexEncode)?;
        writer.flush().map_err(write_error)?;
    }

    fs::rename(&tmp_path, path).map_err(|source| Error::IndexWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn index_with(file: &Path, paths: &[(&str, i64)]) -> DirectoryIndex {
        let mut index = DirectoryIndex::new(file);
        for (path, mtime) in paths {
            index.put(*path, *mtime);
        }
        index
    }

    #[test]
    fn missing_file_loads_stale_and_dirty() {
        let tmp = TempDir::new().unwrap();
        let index = DirectoryIndex::load(tmp.path().join("nope/index.bin"));

        assert!(index.is_stale());
        assert!(index.is_dirty());
        assert!(index.is_empty());
    }

    #[test]
    fn corrupt_file_loads_stale() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("index.bin");
        fs::write(&file, b"definitely not bincode").unwrap();

        let index = DirectoryIndex::load(&file);
        assert!(index.is_stale());
        assert!(index.is_empty());
    }

    #[test]
    fn oversized_length_prefix_loads_stale() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("index.bin");

        // version, entry count, then a path length far beyond the file size
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&INDEX_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(b"pkg");
        fs::write(&file, &bytes).unwrap();

        assert!(matches!(read_entries(&file), Err(Error::IndexDecode(_))));

        let index = DirectoryIndex::load(&file);
        assert!(index.is_stale());
        assert!(index.is_empty());

        // a huge entry count is rejected the same way
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&INDEX_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        fs::write(&file, &bytes).unwrap();
        assert!(DirectoryIndex::load(&file).is_stale());
    }

    #[test]
    fn save_then_load_round_trips_entries() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("cache/wscd/index.bin");
        let mut index = index_with(
            &file,
            &[
                ("github.com/user/repo", 1_700_000_000),
                ("github.com/user", 1_600_000_000),
                ("golang.org/x/tools/cmd", -5),
            ],
        );

        assert!(index.save().unwrap());
        assert!(!index.is_dirty());

        let loaded = DirectoryIndex::load(&file);
        assert!(!loaded.is_stale());
        assert!(!loaded.is_dirty());
        assert_eq!(
            loaded.entries().collect::<Vec<_>>(),
            index.entries().collect::<Vec<_>>()
        );
        assert_eq!(loaded.get("golang.org/x/tools/cmd"), Some(-5));
    }

    #[test]
    fn saving_identical_content_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first.bin");
        let second = tmp.path().join("second.bin");

        index_with(&first, &[("b", 2), ("a", 1), ("c/d", 3)])
            .save()
            .unwrap();
        index_with(&second, &[("c/d", 3), ("a", 1), ("b", 2)])
            .save()
            .unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
        assert!(!tmp.path().join("first.tmp").exists());
    }

    #[test]
    fn save_is_noop_when_clean_or_stale() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("index.bin");

        let mut clean = DirectoryIndex::new(&file);
        assert!(!clean.save().unwrap());
        assert!(!file.exists());

        let mut stale = DirectoryIndex::load(&file);
        stale.put("a", 1);
        assert!(!stale.save().unwrap());
        assert!(!file.exists());

        stale.mark_rebuilt();
        assert!(stale.save().unwrap());
        assert!(file.exists());
    }

    #[test]
    fn save_reports_unwritable_location() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "file where a directory should be").unwrap();

        let mut index = index_with(&blocker.join("index.bin"), &[("a", 1)]);
        assert!(matches!(index.save(), Err(Error::CreateDir(_))));
        assert!(index.is_dirty());
    }

    #[test]
    fn version_mismatch_forces_rebuild() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("index.bin");
        let persisted = PersistedIndex {
            version: INDEX_FORMAT_VERSION + 1,
            entries: vec![IndexEntry {
                path: "a".into(),
                mtime: 1,
            }],
        };
        write_atomically(&file, &persisted).unwrap();

        assert!(matches!(read_entries(&file), Err(Error::IndexVersion { .. })));
        assert!(DirectoryIndex::load(&file).is_stale());
    }

    #[test]
    fn suffix_search_matches_trailing_components() {
        let index = index_with(Path::new("unused"), &[("a/b/c", 1), ("x/y", 1)]);

        for query in ["c", "b/c"] {
            let result = index.suffix_search(query);
            assert!(!result.exact);
            assert_eq!(result.matches, vec!["a/b/c".to_string()], "query {query}");
            assert!(result.is_decisive());
        }

        assert!(index.suffix_search("x/c").matches.is_empty());
        assert!(!index.suffix_search("x/c").is_decisive());
    }

    #[test]
    fn suffix_search_exact_key_short_circuits() {
        let index = index_with(Path::new("unused"), &[("a/b/c", 1)]);

        let result = index.suffix_search("a/b/c");
        assert!(result.exact);
        assert!(result.matches.is_empty());
        assert!(!result.is_decisive());
    }

    #[test]
    fn suffix_search_stops_at_overflow() {
        let mut index = DirectoryIndex::new("unused");
        for i in 0..30 {
            index.put(format!("repo{i:02}/pkg"), 1);
        }

        let result = index.suffix_search("pkg");
        assert_eq!(result.matches.len(), SUFFIX_SEARCH_OVERFLOW);
        assert!(result.is_overflowing());
        assert!(!result.is_decisive());
    }
}
