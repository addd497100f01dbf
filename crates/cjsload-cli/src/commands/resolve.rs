//! `cjsload resolve`: where would `require(specifier)` load from?

use super::{module_system, requester, ErrorJson};
use cjsload_core::{Config, Deprecation, Resolution};
use cjsload_util::path::resolve;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct ResolveJson {
    ok: bool,
    specifier: String,
    resolved: Option<String>,
    builtin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    deprecations: Vec<Deprecation>,
}

/// Resolve `specifier` from `from` (or from no requester), or as the program
/// entry point with `main`.
///
/// Exits with status 1 when the specifier does not resolve.
pub fn run(
    config: &Config,
    specifier: &str,
    from: Option<&Path>,
    main: bool,
    json: bool,
) -> Result<()> {
    let mut system = module_system(config);

    let result = if main {
        let entry = resolve(&config.cwd, &[Path::new(specifier)]);
        system.resolve_filename(&entry.to_string_lossy(), None, true)
    } else {
        let parent = requester(&mut system, config, from);
        system.resolve_filename(specifier, parent, false)
    };
    debug!(specifier, ok = result.is_ok(), "resolve finished");

    let ok = result.is_ok();
    if json {
        let output = ResolveJson {
            ok,
            specifier: specifier.to_string(),
            resolved: result.as_ref().ok().map(ToString::to_string),
            builtin: result.as_ref().is_ok_and(Resolution::is_builtin),
            error: result.as_ref().err().map(ErrorJson::from),
            deprecations: system.deprecations().to_vec(),
        };
        println!("{}", serde_json::to_string(&output).into_diagnostic()?);
    } else {
        match &result {
            Ok(Resolution::Builtin(name)) => println!("{name} (built-in)"),
            Ok(Resolution::File(path)) => println!("{}", path.display()),
            Err(err) => eprintln!("error: {err}"),
        }
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
