//! Memoized filesystem probes.
//!
//! The cache only holds entries while armed. The module system arms it when the
//! outermost module body starts executing and disarms it when that body returns,
//! so repeated probes inside one require tree are amortized while the staleness
//! window never outlives that tree.

use cjsload_util::path::make_long;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What a probe found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Missing,
    File,
    Directory,
}

impl FileKind {
    fn of(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Self::Directory,
            Ok(_) => Self::File,
            Err(_) => Self::Missing,
        }
    }
}

/// Probe cache keyed by long-form path.
#[derive(Debug, Default)]
pub struct StatCache {
    entries: Option<HashMap<PathBuf, FileKind>>,
}

impl StatCache {
    /// Create a disarmed cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start memoizing probes. Clears anything left over.
    pub fn arm(&mut self) {
        self.entries = Some(HashMap::new());
    }

    /// Stop memoizing probes and drop all entries.
    pub fn disarm(&mut self) {
        self.entries = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.entries.is_some()
    }

    /// Number of memoized entries (0 when disarmed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, HashMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Probe `path`, following symlinks.
    pub fn probe(&mut self, path: &Path) -> FileKind {
        let long = make_long(path);

        let Some(entries) = self.entries.as_mut() else {
            return FileKind::of(&long);
        };

        if let Some(kind) = entries.get(&long) {
            return *kind;
        }

        let kind = FileKind::of(&long);
        entries.insert(long, kind);
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_probe_kinds() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "").unwrap();

        let mut cache = StatCache::new();
        assert_eq!(cache.probe(&file), FileKind::File);
        assert_eq!(cache.probe(dir.path()), FileKind::Directory);
        assert_eq!(cache.probe(&dir.path().join("nope")), FileKind::Missing);
    }

    #[test]
    fn test_disarmed_cache_stores_nothing() {
        let dir = tempdir().unwrap();
        let mut cache = StatCache::new();
        cache.probe(dir.path());
        assert!(!cache.is_armed());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_armed_cache_memoizes_until_disarmed() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("late.js");

        let mut cache = StatCache::new();
        cache.arm();
        assert_eq!(cache.probe(&file), FileKind::Missing);

        // Created after the first probe: the armed cache still reports the old answer
        fs::write(&file, "").unwrap();
        assert_eq!(cache.probe(&file), FileKind::Missing);
        assert_eq!(cache.len(), 1);

        cache.disarm();
        assert_eq!(cache.probe(&file), FileKind::File);
    }
}
