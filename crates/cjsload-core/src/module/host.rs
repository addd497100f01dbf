//! Interfaces to the embedding runtime.
//!
//! The module system never runs code itself. Built-in modules, compilation and
//! execution of wrapped sources, and native addons are provided by the embedder
//! through the traits here. Executing code talks back to the module system
//! through a [`ModuleScope`], which carries the five module-local bindings.

use super::{Exports, Module, ModuleId};
use crate::error::{Error, Result};
use crate::system::{ModuleSystem, Resolution};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Public built-in module names of Node.js.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "zlib",
];

/// Closed registry of modules supplied by the runtime itself.
pub trait BuiltinModules {
    /// Whether `name` is a built-in visible to user code.
    fn exists(&self, name: &str) -> bool;

    /// Exports of built-in `name`.
    fn require(&self, name: &str) -> Result<Exports>;
}

/// Built-in registry backed by a fixed name → exports table.
#[derive(Debug, Default)]
pub struct StaticBuiltins {
    modules: HashMap<String, Exports>,
}

impl StaticBuiltins {
    /// An empty registry: nothing is built in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of [`NODE_BUILTINS`], each exporting an empty object.
    #[must_use]
    pub fn node() -> Self {
        let mut builtins = Self::new();
        for name in NODE_BUILTINS {
            builtins.insert(*name, Exports::empty_object());
        }
        builtins
    }

    /// Add or replace a built-in.
    pub fn insert(&mut self, name: impl Into<String>, exports: Exports) {
        self.modules.insert(name.into(), exports);
    }

    /// Builder form of [`StaticBuiltins::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, exports: Exports) -> Self {
        self.insert(name, exports);
        self
    }
}

impl BuiltinModules for StaticBuiltins {
    fn exists(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    fn require(&self, name: &str) -> Result<Exports> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| Error::BuiltinUnavailable {
                name: name.to_string(),
            })
    }
}

/// A compiled module wrapper, ready to be invoked once per load.
pub trait CompiledWrapper {
    /// Run the wrapper body with the module's bindings.
    fn call(&self, scope: &mut ModuleScope<'_>) -> Result<()>;
}

/// Compiles and runs wrapped module sources.
pub trait ExecutionService {
    /// Compile `wrapped_source`; `filename` is used for diagnostics only.
    fn compile(&self, wrapped_source: &str, filename: &Path) -> Result<Box<dyn CompiledWrapper>>;

    /// Invoke a compiled wrapper with the module's bindings.
    fn invoke(&self, compiled: &dyn CompiledWrapper, scope: &mut ModuleScope<'_>) -> Result<()> {
        compiled.call(scope)
    }
}

/// Execution service for hosts that only resolve: every compile fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExecution;

impl ExecutionService for NoExecution {
    fn compile(&self, _wrapped_source: &str, filename: &Path) -> Result<Box<dyn CompiledWrapper>> {
        Err(Error::execution_in(
            filename,
            format!("no execution service to run {}", filename.display()),
        ))
    }
}

/// Opens native addons and populates the module's exports.
pub trait NativeAddonLoader {
    fn open(&self, module: &mut Module, path: &Path) -> Result<()>;
}

/// Native addon loader for hosts without addon support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNativeAddons;

impl NativeAddonLoader for NoNativeAddons {
    fn open(&self, _module: &mut Module, path: &Path) -> Result<()> {
        Err(Error::NativeAddon {
            path: path.to_path_buf(),
            message: "native addons are not supported".to_string(),
        })
    }
}

/// Bindings visible to one executing module body.
///
/// Mirrors the wrapper parameters `exports`, `require`, `module`, `__filename`
/// and `__dirname`.
pub struct ModuleScope<'a> {
    system: &'a mut ModuleSystem,
    module: ModuleId,
    exports: Exports,
    filename: PathBuf,
    dirname: PathBuf,
}

impl<'a> ModuleScope<'a> {
    pub(crate) fn new(
        system: &'a mut ModuleSystem,
        module: ModuleId,
        filename: PathBuf,
        dirname: PathBuf,
    ) -> Self {
        let exports = system.registry()[module].exports.clone();
        Self {
            system,
            module,
            exports,
            filename,
            dirname,
        }
    }

    /// The `exports` binding: the exports value as it was when the body started.
    #[must_use]
    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    /// The `module` binding.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.system.registry()[self.module]
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// Current value of `module.exports`.
    #[must_use]
    pub fn module_exports(&self) -> Exports {
        self.module().exports.clone()
    }

    /// `module.exports = value`: replace the module's exports outright.
    ///
    /// The `exports` binding keeps pointing at the old value.
    pub fn set_module_exports(&mut self, exports: Exports) {
        self.system.registry_mut()[self.module].exports = exports;
    }

    /// `__filename`.
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// `__dirname`.
    #[must_use]
    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    /// `require(specifier)` from this module.
    pub fn require(&mut self, specifier: &str) -> Result<Exports> {
        self.system.require(self.module, specifier)
    }

    /// `require.resolve(specifier)` from this module.
    pub fn resolve(&mut self, specifier: &str) -> Result<Resolution> {
        self.system.resolve(self.module, specifier)
    }

    /// `require.main`.
    #[must_use]
    pub fn main_module(&self) -> Option<ModuleId> {
        self.system.main_module()
    }

    /// The module system this body runs in.
    #[must_use]
    pub fn system(&self) -> &ModuleSystem {
        &*self.system
    }
}
