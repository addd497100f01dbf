use cjsload_core::version::{version_string, VERSION};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct VersionJson<'a> {
    name: &'a str,
    version: &'a str,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let output = VersionJson {
            name: "cjsload",
            version: VERSION,
        };
        println!("{}", serde_json::to_string(&output).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
