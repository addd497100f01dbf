#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::fn_params_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use cjsload_core::Config;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cjsload")]
#[command(author, version, about = "Inspect CommonJS module resolution", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Keep symlinked paths instead of resolving them to real paths
    #[arg(
        long,
        global = true,
        env = "NODE_PRESERVE_SYMLINKS",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    preserve_symlinks: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve a specifier to the file `require` would load
    Resolve {
        /// Module specifier, e.g. "./lib/util", "lodash" or "fs"
        specifier: String,

        /// File doing the require (default: no requester)
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,

        /// Resolve as the program entry point
        #[arg(long, conflicts_with = "from")]
        main: bool,
    },

    /// Show the module id and candidate directories for a specifier
    Lookup {
        specifier: String,

        /// File doing the require (default: no requester)
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,
    },

    /// List node_modules search directories for a directory
    Paths {
        /// Directory to start from (default: working directory)
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json)
        .with_preserve_symlinks(cli.preserve_symlinks);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Resolve {
            specifier,
            from,
            main,
        }) => {
            let span = tracing::info_span!("resolve", cmd = "resolve", cwd = %cwd.display());
            let _guard = span.enter();
            commands::resolve::run(&config, &specifier, from.as_deref(), main, cli.json)
        }
        Some(Commands::Lookup { specifier, from }) => {
            let span = tracing::info_span!("lookup", cmd = "lookup", cwd = %cwd.display());
            let _guard = span.enter();
            commands::lookup::run(&config, &specifier, from.as_deref(), cli.json)
        }
        Some(Commands::Paths { dir }) => commands::paths::run(&config, dir.as_deref(), cli.json),
    }
}
