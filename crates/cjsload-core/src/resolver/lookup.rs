//! Candidate directories for a specifier.
//!
//! Bare specifiers search the requester's `node_modules` ancestor chain and then
//! the global roots; relative ones search the requester's own directory.

use crate::module::{BuiltinModules, Module};
use cjsload_util::path::{dirname, resolve};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const NODE_MODULES: &str = "node_modules";

/// `node_modules`, reversed, matched while scanning a path from its end.
const NODE_MODULES_REVERSED: &[u8] = b"seludom_edon";

/// Where to look for a specifier, and the id a module found there gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupPaths {
    pub id: String,
    pub paths: Vec<PathBuf>,
}

/// Process-wide inputs of a lookup.
pub struct LookupEnv<'a> {
    pub cwd: &'a Path,
    pub global_paths: &'a [PathBuf],
    pub builtins: &'a dyn BuiltinModules,
}

/// `node_modules` directories from `from` up to the filesystem root, nearest
/// first.
///
/// `from` is made absolute against `cwd`. A segment already named
/// `node_modules` does not get another `node_modules` appended.
#[must_use]
pub fn node_module_paths(cwd: &Path, from: &Path) -> Vec<PathBuf> {
    let from = resolve(cwd, &[from]);
    let from = from.to_string_lossy();

    #[cfg(windows)]
    let paths = node_module_paths_windows(&from);
    #[cfg(not(windows))]
    let paths = node_module_paths_posix(&from);

    paths.into_iter().map(PathBuf::from).collect()
}

/// [`node_module_paths`] for an absolute POSIX path.
#[must_use]
pub fn node_module_paths_posix(from: &str) -> Vec<String> {
    if from == "/" {
        return vec![format!("/{NODE_MODULES}")];
    }

    let mut paths = ancestor_chain(from, |b| b == b'/', "/");
    paths.push(format!("/{NODE_MODULES}"));
    paths
}

/// [`node_module_paths`] for an absolute Windows path.
///
/// A drive root yields only its own entry; otherwise the chain ends at the
/// drive root without an extra entry.
#[must_use]
pub fn node_module_paths_windows(from: &str) -> Vec<String> {
    if from.ends_with(":\\") {
        return vec![format!("{from}{NODE_MODULES}")];
    }

    ancestor_chain(from, |b| b == b'\\' || b == b'/' || b == b':', "\\")
}

fn ancestor_chain(from: &str, is_separator: impl Fn(u8) -> bool, separator: &str) -> Vec<String> {
    let bytes = from.as_bytes();
    let mut paths = Vec::new();
    // Progress matching `node_modules` backwards in the current segment; `None`
    // once the segment is known not to be one.
    let mut matched = Some(0);
    let mut last = bytes.len();

    for i in (0..bytes.len()).rev() {
        let byte = bytes[i];
        if is_separator(byte) {
            if matched != Some(NODE_MODULES_REVERSED.len()) {
                paths.push(format!("{}{separator}{NODE_MODULES}", &from[..last]));
            }
            last = i;
            matched = Some(0);
        } else if let Some(n) = matched {
            matched = (NODE_MODULES_REVERSED.get(n) == Some(&byte)).then_some(n + 1);
        }
    }

    paths
}

/// Whether a specifier is relative: `./…` or `../…`.
#[must_use]
pub fn is_relative(specifier: &str) -> bool {
    let bytes = specifier.as_bytes();
    bytes.len() >= 2 && bytes[0] == b'.' && (bytes[1] == b'.' || bytes[1] == b'/')
}

/// Whether a file base name is `index.` followed by one or more word
/// characters.
#[must_use]
pub fn is_index_basename(base: &str) -> bool {
    base.strip_prefix("index.").is_some_and(|rest| {
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

/// Candidate directories and module id for `specifier` required by `requester`.
///
/// The requester's lookup chain (its `paths` followed by the global roots) is
/// memoized on the module.
pub fn resolve_lookup_paths(
    specifier: &str,
    mut requester: Option<&mut Module>,
    env: &LookupEnv<'_>,
) -> LookupPaths {
    if env.builtins.exists(specifier) {
        debug!(specifier, "looking for built-in");
        return LookupPaths {
            id: specifier.to_string(),
            paths: Vec::new(),
        };
    }

    if !is_relative(specifier) {
        let mut paths = match requester.as_deref_mut() {
            Some(module) => lookup_chain(module, env.global_paths),
            None => env.global_paths.to_vec(),
        };

        if specifier == "." {
            let dir = requester
                .as_deref()
                .and_then(|module| module.filename.as_deref())
                .map_or_else(|| resolve(env.cwd, &[]), dirname);
            paths.insert(0, dir);
        }

        debug!(specifier, ?paths, "looking for bare specifier");
        return LookupPaths {
            id: specifier.to_string(),
            paths,
        };
    }

    let parent = requester
        .as_deref()
        .filter(|module| !module.id.is_empty())
        .and_then(|module| module.filename.as_deref().map(|filename| (module, filename)));

    let Some((parent, filename)) = parent else {
        let cwd = resolve(env.cwd, &[]);
        let mut paths = vec![cwd.clone()];
        paths.extend(node_module_paths(env.cwd, &cwd));
        paths.extend(env.global_paths.iter().cloned());

        debug!(specifier, ?paths, "looking for relative specifier without parent");
        return LookupPaths {
            id: specifier.to_string(),
            paths,
        };
    };

    let parent_id = Path::new(&parent.id);
    let is_index = filename
        .file_name()
        .is_some_and(|base| is_index_basename(&base.to_string_lossy()));
    let id_dir = if is_index {
        parent_id.to_path_buf()
    } else {
        dirname(parent_id)
    };

    let mut id = resolve(env.cwd, &[&id_dir, Path::new(specifier)])
        .to_string_lossy()
        .into_owned();
    // `require('./x')` and `require('x')` from a top-level module must not share an id
    if id_dir == Path::new(".") && !id.contains(['/', std::path::MAIN_SEPARATOR]) {
        id = format!("./{id}");
    }

    let paths = vec![dirname(filename)];
    debug!(specifier, %id, parent = %parent.id, ?paths, "looking for relative specifier");
    LookupPaths { id, paths }
}

fn lookup_chain(module: &mut Module, global_paths: &[PathBuf]) -> Vec<PathBuf> {
    module
        .lookup_chain
        .get_or_insert_with(|| module.paths.iter().chain(global_paths).cloned().collect())
        .clone()
}
