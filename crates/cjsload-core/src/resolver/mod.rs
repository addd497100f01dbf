//! CommonJS specifier resolution.
//!
//! Lookup turns a specifier and its requester into candidate directories; the
//! path resolver searches them for a file, following package manifests and
//! directory indexes. Filesystem probes, manifests, real paths and finished
//! resolutions are all cached here.

mod find;
mod lookup;
mod manifest;
mod stat_cache;

pub use find::{Deprecation, PathResolver, RealpathCache, DOT_OUTSIDE_PACKAGE};
pub use lookup::{
    is_index_basename, is_relative, node_module_paths, node_module_paths_posix,
    node_module_paths_windows, resolve_lookup_paths, LookupEnv, LookupPaths,
};
pub use manifest::{ManifestCache, MANIFEST_FILE};
pub use stat_cache::{FileKind, StatCache};
