use std::fs;
use std::io;
use std::path::Path;

/// Byte-order mark as it appears after UTF-8 decoding.
const BOM: char = '\u{FEFF}';

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read a file if it can be read at all.
///
/// Any failure (missing file, permission denied, path is a directory) yields `None`.
/// Callers use this where an unreadable file means "not there".
#[must_use]
pub fn read_optional(path: &Path) -> Option<String> {
    read_to_string_lossy(path).ok()
}

/// Strip a single leading byte-order mark.
#[must_use]
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix(BOM).unwrap_or(content)
}
