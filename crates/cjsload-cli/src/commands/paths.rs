use super::module_system;
use cjsload_core::Config;
use cjsload_util::path::resolve;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct PathsJson {
    dir: PathBuf,
    node_modules: Vec<PathBuf>,
    global: Vec<PathBuf>,
}

/// Print the `node_modules` chain of `dir` followed by the global roots.
pub fn run(config: &Config, dir: Option<&Path>, json: bool) -> Result<()> {
    let system = module_system(config);
    let dir = resolve(&config.cwd, &[dir.unwrap_or(Path::new("."))]);

    let output = PathsJson {
        node_modules: system.node_module_paths(&dir),
        global: system.config().global_paths.clone(),
        dir,
    };

    if json {
        println!("{}", serde_json::to_string(&output).into_diagnostic()?);
    } else {
        for path in output.node_modules.iter().chain(&output.global) {
            println!("{}", path.display());
        }
    }
    Ok(())
}
