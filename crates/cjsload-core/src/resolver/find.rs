//! Candidate-directory search: files, extensions, package entry points and
//! directory indexes.

use super::manifest::ManifestCache;
use super::stat_cache::{FileKind, StatCache};
use crate::error::{Error, Result};
use cjsload_util::path::resolve;
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Code of the `require('.')` outside-package notice.
pub const DOT_OUTSIDE_PACKAGE: &str = "DEP0019";

const DOT_OUTSIDE_PACKAGE_MESSAGE: &str = "warning: require('.') resolved outside the package \
     directory. This functionality is deprecated and will be removed soon.";

/// A deprecation notice emitted during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deprecation {
    pub code: &'static str,
    pub message: String,
}

/// Memoized real paths.
#[derive(Debug, Default)]
pub struct RealpathCache {
    entries: HashMap<PathBuf, PathBuf>,
}

impl RealpathCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical path of `path` with every symlink resolved.
    ///
    /// # Errors
    /// Returns [`Error::Realpath`] when the path cannot be canonicalized.
    pub fn real_path(&mut self, path: &Path) -> Result<PathBuf> {
        if let Some(real) = self.entries.get(path) {
            return Ok(real.clone());
        }
        let real = dunce::canonicalize(path).map_err(|source| Error::Realpath {
            path: path.to_path_buf(),
            source,
        })?;
        self.entries.insert(path.to_path_buf(), real.clone());
        Ok(real)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Searches candidate directories for the file a specifier names.
///
/// Owns every filesystem-facing cache of the module system. The path cache is
/// never invalidated on its own; [`PathResolver::clear`] is the only reset.
#[derive(Debug)]
pub struct PathResolver {
    cwd: PathBuf,
    preserve_symlinks: bool,
    stat: StatCache,
    manifests: ManifestCache,
    realpaths: RealpathCache,
    path_cache: HashMap<(String, Vec<PathBuf>), PathBuf>,
    dot_warned: bool,
    deprecations: Vec<Deprecation>,
}

impl PathResolver {
    #[must_use]
    pub fn new(cwd: PathBuf, preserve_symlinks: bool) -> Self {
        Self {
            cwd,
            preserve_symlinks,
            stat: StatCache::new(),
            manifests: ManifestCache::new(),
            realpaths: RealpathCache::new(),
            path_cache: HashMap::new(),
            dot_warned: false,
            deprecations: Vec::new(),
        }
    }

    #[must_use]
    pub fn stat_cache(&self) -> &StatCache {
        &self.stat
    }

    pub fn stat_cache_mut(&mut self) -> &mut StatCache {
        &mut self.stat
    }

    #[must_use]
    pub fn manifests(&self) -> &ManifestCache {
        &self.manifests
    }

    #[must_use]
    pub fn realpaths(&self) -> &RealpathCache {
        &self.realpaths
    }

    /// Number of memoized `find_path` results.
    #[must_use]
    pub fn path_cache_len(&self) -> usize {
        self.path_cache.len()
    }

    /// Deprecation notices emitted so far, oldest first.
    #[must_use]
    pub fn deprecations(&self) -> &[Deprecation] {
        &self.deprecations
    }

    /// Forget every cached probe, manifest, real path and resolution.
    pub fn clear(&mut self) {
        self.stat.disarm();
        self.manifests.clear();
        self.realpaths.clear();
        self.path_cache.clear();
    }

    /// `path` itself, if it is a file.
    ///
    /// The entry module and all modules outside preserve-symlinks mode get the
    /// real path; otherwise the path is only made absolute.
    ///
    /// # Errors
    /// Returns [`Error::Realpath`] when the real path cannot be computed.
    pub fn try_file(&mut self, path: &Path, is_main: bool) -> Result<Option<PathBuf>> {
        if self.stat.probe(path) != FileKind::File {
            return Ok(None);
        }
        self.finish_file(path, is_main).map(Some)
    }

    fn finish_file(&mut self, path: &Path, is_main: bool) -> Result<PathBuf> {
        if self.preserve_symlinks && !is_main {
            Ok(resolve(&self.cwd, &[path]))
        } else {
            self.realpaths.real_path(path)
        }
    }

    /// The first of `base + ext` that is a file, in `exts` order.
    ///
    /// # Errors
    /// Propagates [`PathResolver::try_file`] errors.
    pub fn try_extensions(
        &mut self,
        base: &Path,
        exts: &[String],
        is_main: bool,
    ) -> Result<Option<PathBuf>> {
        for ext in exts {
            let mut candidate = OsString::from(base.as_os_str());
            candidate.push(ext);
            if let Some(found) = self.try_file(Path::new(&candidate), is_main)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// The file named by the `main` field of `dir/package.json`.
    ///
    /// Tries the entry itself, then with each extension, then its `index`
    /// with each extension.
    ///
    /// # Errors
    /// Returns [`Error::ManifestParse`] for a malformed manifest.
    pub fn try_package(
        &mut self,
        dir: &Path,
        exts: &[String],
        is_main: bool,
    ) -> Result<Option<PathBuf>> {
        let Some(main) = self.manifests.read_main(dir)? else {
            return Ok(None);
        };

        let entry = resolve(&self.cwd, &[dir, Path::new(&main)]);
        if let Some(found) = self.try_file(&entry, is_main)? {
            return Ok(Some(found));
        }
        if let Some(found) = self.try_extensions(&entry, exts, is_main)? {
            return Ok(Some(found));
        }
        self.try_extensions(&entry.join("index"), exts, is_main)
    }

    /// Search `paths` in order for `request`.
    ///
    /// An absolute request ignores `paths`. Results are memoized by request and
    /// candidate list.
    ///
    /// # Errors
    /// Returns manifest and real path errors hit along the way.
    pub fn find_path(
        &mut self,
        request: &str,
        paths: &[PathBuf],
        exts: &[String],
        is_main: bool,
    ) -> Result<Option<PathBuf>> {
        let absolute = [PathBuf::new()];
        let paths = if Path::new(request).has_root() {
            &absolute[..]
        } else if paths.is_empty() {
            return Ok(None);
        } else {
            paths
        };

        let cache_key = path_cache_key(request, paths);
        if let Some(entry) = self.path_cache.get(&cache_key) {
            return Ok(Some(entry.clone()));
        }

        let trailing_slash = request.ends_with('/');

        for (index, dir) in paths.iter().enumerate() {
            if !dir.as_os_str().is_empty() && self.stat.probe(dir) != FileKind::Directory {
                continue;
            }

            let base = resolve(&self.cwd, &[dir, Path::new(request)]);
            let kind = self.stat.probe(&base);
            let mut filename = None;

            if !trailing_slash {
                filename = match kind {
                    FileKind::File => Some(self.finish_file(&base, is_main)?),
                    FileKind::Directory => self.try_package(&base, exts, is_main)?,
                    FileKind::Missing => None,
                };
                if filename.is_none() {
                    filename = self.try_extensions(&base, exts, is_main)?;
                }
            }

            if filename.is_none() && kind == FileKind::Directory {
                filename = self.try_package(&base, exts, is_main)?;
            }

            if filename.is_none() && kind == FileKind::Directory {
                filename = self.try_extensions(&base.join("index"), exts, is_main)?;
            }

            if let Some(filename) = filename {
                if request == "." && index > 0 {
                    self.warn_dot_outside_package();
                }
                debug!(request, filename = %filename.display(), "resolved");
                self.path_cache.insert(cache_key, filename.clone());
                return Ok(Some(filename));
            }
        }

        Ok(None)
    }

    fn warn_dot_outside_package(&mut self) {
        if self.dot_warned {
            return;
        }
        self.dot_warned = true;
        warn!(code = DOT_OUTSIDE_PACKAGE, "{DOT_OUTSIDE_PACKAGE_MESSAGE}");
        self.deprecations.push(Deprecation {
            code: DOT_OUTSIDE_PACKAGE,
            message: DOT_OUTSIDE_PACKAGE_MESSAGE.to_string(),
        });
    }
}

fn path_cache_key(request: &str, paths: &[PathBuf]) -> (String, Vec<PathBuf>) {
    (request.to_string(), paths.to_vec())
}
