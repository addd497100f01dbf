#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod error;
pub mod module;
pub mod resolver;
pub mod system;
pub mod version;

pub use config::{Config, LoaderConfig};
pub use error::{Error, Result};
pub use module::{
    BuiltinModules, CompiledWrapper, ExecutionService, ExtensionHandler, Exports, Module,
    ModuleId, ModuleScope, NativeAddonLoader, StaticBuiltins,
};
pub use resolver::{Deprecation, LookupPaths};
pub use system::{ModuleSystem, Resolution};
pub use version::VERSION;
