use super::{module_system, requester};
use cjsload_core::Config;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

/// Print the module id and candidate directories for `specifier`.
pub fn run(config: &Config, specifier: &str, from: Option<&Path>, json: bool) -> Result<()> {
    let mut system = module_system(config);
    let parent = requester(&mut system, config, from);
    let lookup = system.resolve_lookup_paths(specifier, parent);

    if json {
        println!("{}", serde_json::to_string(&lookup).into_diagnostic()?);
    } else {
        println!("id: {}", lookup.id);
        for path in &lookup.paths {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
