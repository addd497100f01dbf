pub mod lookup;
pub mod paths;
pub mod resolve;
pub mod version;

use cjsload_core::{Config, ModuleId, ModuleSystem};
use cjsload_util::path::resolve;
use serde::Serialize;
use std::path::Path;

/// Error object of a failed command's JSON output.
#[derive(Serialize)]
pub struct ErrorJson {
    pub code: String,
    pub message: String,
}

impl From<&cjsload_core::Error> for ErrorJson {
    fn from(err: &cjsload_core::Error) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Module system for one CLI invocation.
pub fn module_system(config: &Config) -> ModuleSystem {
    ModuleSystem::new(config.loader_config())
}

/// Requester module standing in for the file passed with `--from`.
///
/// The module is created as if that file had been loaded: its id and filename
/// are the absolute path and it gets the file's `node_modules` chain.
pub fn requester(system: &mut ModuleSystem, config: &Config, from: Option<&Path>) -> Option<ModuleId> {
    from.map(|file| {
        let file = resolve(&config.cwd, &[file]);
        let id = file.to_string_lossy().into_owned();
        system.detached_module(id, Some(&file))
    })
}
