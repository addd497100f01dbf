//! Lexical path helpers.
//!
//! None of these functions touch the filesystem: `..` is folded against the
//! preceding segment without following symlinks, which is the behavior module
//! resolution needs when it builds candidate paths.

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically.
///
/// Removes `.` segments, folds `..` into the preceding normal segment, and drops
/// trailing separators. `..` above the root stays at the root; `..` at the start of
/// a relative path is kept. An empty result is returned as `.`.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut normal_depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if normal_depth > 0 {
                    out.pop();
                    normal_depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(segment) => {
                out.push(segment);
                normal_depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Resolve a sequence of path segments into an absolute path.
///
/// Segments are applied left to right starting from `cwd`: an absolute segment
/// replaces everything before it, a relative one is appended, and an empty one is
/// ignored. The result is normalized.
#[must_use]
pub fn resolve(cwd: &Path, segments: &[&Path]) -> PathBuf {
    let mut joined = cwd.to_path_buf();
    for segment in segments {
        if segment.as_os_str().is_empty() {
            continue;
        }
        // PathBuf::push replaces the buffer when the segment is absolute
        joined.push(segment);
    }
    normalize(&joined)
}

/// Directory part of a path, `.` when there is none.
#[must_use]
pub fn dirname(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None if path.has_root() => path.to_path_buf(),
        None => PathBuf::from("."),
    }
}

/// Convert a path to the platform's long form for filesystem calls.
///
/// On Windows an absolute drive path gains the `\\?\` prefix and a UNC path the
/// `\\?\UNC\` prefix. Elsewhere the path is returned unchanged.
#[must_use]
pub fn make_long(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let text = path.to_string_lossy();
        if text.starts_with(r"\\?\") {
            return path.to_path_buf();
        }
        if let Some(rest) = text.strip_prefix(r"\\") {
            return PathBuf::from(format!(r"\\?\UNC\{rest}"));
        }
        let bytes = text.as_bytes();
        if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\' {
            return PathBuf::from(format!(r"\\?\{text}"));
        }
        path.to_path_buf()
    }

    #[cfg(not(windows))]
    {
        path.to_path_buf()
    }
}
