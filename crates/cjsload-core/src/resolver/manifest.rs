//! Package manifest (`package.json`) entry-point cache.
//!
//! Only the `main` field matters to CommonJS resolution. Results, including
//! "no entry", are cached per directory for the life of the cache; a manifest that
//! is not valid JSON is an error and is not cached.

use crate::error::{Error, Result};
use cjsload_util::fs::read_optional;
use cjsload_util::path::make_long;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Per-directory cache of manifest entry points.
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: HashMap<PathBuf, Option<String>>,
}

impl ManifestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry point declared by `dir/package.json`, if any.
    ///
    /// A missing or unreadable manifest, a manifest that is not an object, or a
    /// `main` field that is absent, not a string, or empty all mean `None`.
    ///
    /// # Errors
    /// Returns [`Error::ManifestParse`] when the manifest exists but is malformed.
    pub fn read_main(&mut self, dir: &Path) -> Result<Option<String>> {
        if let Some(entry) = self.entries.get(dir) {
            return Ok(entry.clone());
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let Some(content) = read_optional(&make_long(&manifest_path)) else {
            self.entries.insert(dir.to_path_buf(), None);
            return Ok(None);
        };

        let value: Value = serde_json::from_str(&content).map_err(|source| Error::ManifestParse {
            path: manifest_path,
            source,
        })?;

        let main = value
            .get("main")
            .and_then(Value::as_str)
            .filter(|main| !main.is_empty())
            .map(str::to_string);

        self.entries.insert(dir.to_path_buf(), main.clone());
        Ok(main)
    }

    /// Number of cached directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
