//! Per-extension load handlers and source preparation.

use super::{Exports, ModuleId};
use crate::error::{Error, Result};
use crate::system::ModuleSystem;
use cjsload_util::fs::{read_to_string_lossy, strip_bom};
use cjsload_util::path::make_long;
use std::path::Path;

/// Text placed before and after a module body.
///
/// The wrapper's parameters are the module-local bindings.
pub const WRAPPER: [&str; 2] = [
    "(function (exports, require, module, __filename, __dirname) { ",
    "\n});",
];

/// Extension used when a file has none or has an unregistered one.
pub const DEFAULT_EXTENSION: &str = ".js";

/// How files with a given extension are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionHandler {
    /// Read as UTF-8, wrap and run through the execution service.
    SourceText,
    /// Parse as JSON and use the value as the module's exports.
    StructuredData,
    /// Hand the file to the native addon loader.
    NativeAddon,
}

impl ExtensionHandler {
    /// Load `filename` into `module`.
    pub(crate) fn handle(
        self,
        system: &mut ModuleSystem,
        module: ModuleId,
        filename: &Path,
    ) -> Result<()> {
        match self {
            Self::SourceText => {
                let content = read_source(filename)?;
                system.compile_and_run(module, strip_bom(&content), filename)
            }
            Self::StructuredData => {
                let content = read_source(filename)?;
                let value = serde_json::from_str(strip_bom(&content)).map_err(|source| {
                    Error::JsonModuleParse {
                        path: filename.to_path_buf(),
                        source,
                    }
                })?;
                system.registry_mut()[module].exports = Exports::new(value);
                Ok(())
            }
            Self::NativeAddon => system.open_native_addon(module, &make_long(filename)),
        }
    }
}

fn read_source(filename: &Path) -> Result<String> {
    read_to_string_lossy(filename).map_err(|source| Error::ReadFile {
        path: filename.to_path_buf(),
        source,
    })
}

/// Registered extensions, in registration order.
///
/// The order is the order extensions are probed during resolution.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    entries: Vec<(String, ExtensionHandler)>,
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self {
            entries: vec![
                (".js".to_string(), ExtensionHandler::SourceText),
                (".json".to_string(), ExtensionHandler::StructuredData),
                (".node".to_string(), ExtensionHandler::NativeAddon),
            ],
        }
    }
}

impl ExtensionTable {
    /// Register `extension` (with its leading dot). Re-registering keeps the
    /// original probe position and swaps the handler.
    pub fn register(&mut self, extension: impl Into<String>, handler: ExtensionHandler) {
        let extension = extension.into();
        if let Some(entry) = self.entries.iter_mut().find(|(ext, _)| *ext == extension) {
            entry.1 = handler;
        } else {
            self.entries.push((extension, handler));
        }
    }

    #[must_use]
    pub fn get(&self, extension: &str) -> Option<ExtensionHandler> {
        self.entries
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, handler)| *handler)
    }

    /// Extensions in probe order.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        self.entries.iter().map(|(ext, _)| ext.clone()).collect()
    }

    /// Handler for `filename`, falling back to the `.js` handler.
    #[must_use]
    pub fn handler_for(&self, filename: &Path) -> ExtensionHandler {
        extname(filename)
            .and_then(|ext| self.get(ext))
            .or_else(|| self.get(DEFAULT_EXTENSION))
            .unwrap_or(ExtensionHandler::SourceText)
    }
}

/// Extension of the last path segment including the dot; `None` for dotfiles
/// and names without a dot.
fn extname(filename: &Path) -> Option<&str> {
    let name = filename.file_name()?.to_str()?;
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&name[idx..]),
    }
}

/// Remove a leading `#!` line. The line break itself is kept so line numbers
/// stay correct; content that is nothing but the directive becomes empty.
#[must_use]
pub fn strip_shebang(content: &str) -> &str {
    if !content.starts_with("#!") {
        return content;
    }
    match content[2..].find(|c| c == '\n' || c == '\r') {
        Some(idx) => &content[2 + idx..],
        None => "",
    }
}

/// Wrap a module body in the module function template.
#[must_use]
pub fn wrap(content: &str) -> String {
    format!("{}{content}{}", WRAPPER[0], WRAPPER[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_shebang() {
        assert_eq!(strip_shebang("#!/usr/bin/env node\nx = 1"), "\nx = 1");
        assert_eq!(strip_shebang("#!node\r\nx"), "\r\nx");
        assert_eq!(strip_shebang("#!/usr/bin/env node"), "");
        assert_eq!(strip_shebang("#!"), "");
        assert_eq!(strip_shebang("x = '#!'"), "x = '#!'");
        assert_eq!(strip_shebang(""), "");
    }

    #[test]
    fn test_wrap() {
        let wrapped = wrap("exports.a = 1;");
        assert!(wrapped.starts_with("(function (exports, require, module, __filename, __dirname) { "));
        assert!(wrapped.contains("exports.a = 1;"));
        assert!(wrapped.ends_with("\n});"));
    }

    #[test]
    fn test_default_table_order() {
        let table = ExtensionTable::default();
        assert_eq!(table.extensions(), vec![".js", ".json", ".node"]);
    }

    #[test]
    fn test_register_keeps_position() {
        let mut table = ExtensionTable::default();
        table.register(".json", ExtensionHandler::SourceText);
        table.register(".cjs", ExtensionHandler::SourceText);

        assert_eq!(table.extensions(), vec![".js", ".json", ".node", ".cjs"]);
        assert_eq!(table.get(".json"), Some(ExtensionHandler::SourceText));
    }

    #[test]
    fn test_handler_for_falls_back_to_js() {
        let table = ExtensionTable::default();
        assert_eq!(table.handler_for(Path::new("/a/b.json")), ExtensionHandler::StructuredData);
        assert_eq!(table.handler_for(Path::new("/a/b.node")), ExtensionHandler::NativeAddon);
        assert_eq!(table.handler_for(Path::new("/a/b.coffee")), ExtensionHandler::SourceText);
        assert_eq!(table.handler_for(Path::new("/a/bin")), ExtensionHandler::SourceText);
        assert_eq!(table.handler_for(Path::new("/a/.eslintrc")), ExtensionHandler::SourceText);
    }

    #[test]
    fn test_extname_uses_last_dot() {
        assert_eq!(extname(Path::new("a.min.js")), Some(".js"));
        assert_eq!(extname(Path::new(".hidden")), None);
        assert_eq!(extname(Path::new("plain")), None);
    }
}
