//! The module system: resolution, the module registry and the load pipeline
//! behind one context object.

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::module::{
    strip_shebang, wrap, BuiltinModules, ExecutionService, ExtensionHandler, ExtensionTable,
    Exports, Module, ModuleId, ModuleRegistry, ModuleScope, NativeAddonLoader, NoExecution,
    NoNativeAddons, StaticBuiltins, ENTRY_MODULE_ID, PRELOAD_MODULE_ID,
};
use crate::resolver::{
    node_module_paths, resolve_lookup_paths, Deprecation, LookupEnv, LookupPaths, PathResolver,
};
use cjsload_util::path::{dirname, resolve};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// What a specifier resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A built-in module, by name.
    Builtin(String),
    /// An absolute filename.
    File(PathBuf),
}

impl Resolution {
    /// The filename, unless this is a built-in.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Builtin(_) => None,
            Self::File(path) => Some(path),
        }
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin(_))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(name) => f.write_str(name),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A CommonJS module system.
///
/// Single-threaded: module bodies run synchronously on the caller's stack and
/// nested requires recurse through [`ModuleScope::require`].
pub struct ModuleSystem {
    config: LoaderConfig,
    resolver: PathResolver,
    registry: ModuleRegistry,
    extensions: ExtensionTable,
    builtins: Box<dyn BuiltinModules>,
    execution: Rc<dyn ExecutionService>,
    native: Box<dyn NativeAddonLoader>,
    require_depth: usize,
    main: Option<ModuleId>,
}

impl ModuleSystem {
    /// A module system with Node's built-in names, no execution service and no
    /// native addon support.
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        let resolver = PathResolver::new(config.cwd.clone(), config.preserve_symlinks);
        Self {
            config,
            resolver,
            registry: ModuleRegistry::new(),
            extensions: ExtensionTable::default(),
            builtins: Box::new(StaticBuiltins::node()),
            execution: Rc::new(NoExecution),
            native: Box::new(NoNativeAddons),
            require_depth: 0,
            main: None,
        }
    }

    /// Use `service` to compile and run source modules.
    #[must_use]
    pub fn with_execution(mut self, service: impl ExecutionService + 'static) -> Self {
        self.execution = Rc::new(service);
        self
    }

    /// Replace the built-in module registry.
    #[must_use]
    pub fn with_builtins(mut self, builtins: impl BuiltinModules + 'static) -> Self {
        self.builtins = Box::new(builtins);
        self
    }

    /// Replace the native addon loader.
    #[must_use]
    pub fn with_native_addons(mut self, loader: impl NativeAddonLoader + 'static) -> Self {
        self.native = Box::new(loader);
        self
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    #[must_use]
    pub fn extensions(&self) -> &ExtensionTable {
        &self.extensions
    }

    /// Module record for `id`.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.registry[id]
    }

    /// The entry module, once [`ModuleSystem::run_main`] has created it.
    #[must_use]
    pub fn main_module(&self) -> Option<ModuleId> {
        self.main
    }

    /// Current `require` nesting depth.
    #[must_use]
    pub fn require_depth(&self) -> usize {
        self.require_depth
    }

    #[must_use]
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.exists(name)
    }

    /// Deprecation notices emitted so far.
    #[must_use]
    pub fn deprecations(&self) -> &[Deprecation] {
        self.resolver.deprecations()
    }

    /// Add or replace the handler for `extension` (with its leading dot).
    pub fn register_extension(&mut self, extension: impl Into<String>, handler: ExtensionHandler) {
        self.extensions.register(extension, handler);
    }

    /// `node_modules` chain of `from`, resolved against the configured cwd.
    #[must_use]
    pub fn node_module_paths(&self, from: &Path) -> Vec<PathBuf> {
        node_module_paths(&self.config.cwd, from)
    }

    /// Drop cached resolutions, manifests, real paths and probes.
    ///
    /// The module registry is left alone.
    pub fn clear_caches(&mut self) {
        self.resolver.clear();
    }

    /// Candidate directories and module id for `specifier`.
    pub fn resolve_lookup_paths(
        &mut self,
        specifier: &str,
        requester: Option<ModuleId>,
    ) -> LookupPaths {
        let env = LookupEnv {
            cwd: &self.config.cwd,
            global_paths: &self.config.global_paths,
            builtins: self.builtins.as_ref(),
        };
        let requester = requester.map(|id| &mut self.registry[id]);
        resolve_lookup_paths(specifier, requester, &env)
    }

    /// Resolve `specifier` as required by `requester`.
    ///
    /// # Errors
    /// [`Error::ModuleNotFound`] when no candidate matches; manifest and real
    /// path errors are passed through.
    pub fn resolve_filename(
        &mut self,
        specifier: &str,
        requester: Option<ModuleId>,
        is_main: bool,
    ) -> Result<Resolution> {
        if self.builtins.exists(specifier) {
            return Ok(Resolution::Builtin(specifier.to_string()));
        }

        let lookup = self.resolve_lookup_paths(specifier, requester);
        let exts = self.extensions.extensions();
        match self.resolver.find_path(specifier, &lookup.paths, &exts, is_main)? {
            Some(filename) => Ok(Resolution::File(filename)),
            None => Err(Error::ModuleNotFound {
                specifier: specifier.to_string(),
            }),
        }
    }

    /// Resolve, then return cached exports or create, register and load a new
    /// module.
    ///
    /// A module is registered before its body runs, so a cycle back to it sees
    /// its exports as they are at that point. If loading fails the registration
    /// is dropped and the error is returned as is.
    ///
    /// # Errors
    /// Resolution errors, and any error raised while loading the module.
    pub fn load(
        &mut self,
        specifier: &str,
        requester: Option<ModuleId>,
        is_main: bool,
    ) -> Result<Exports> {
        if let Some(parent) = requester {
            debug!(specifier, parent = %self.registry[parent].id, "load request");
        }

        let filename = match self.resolve_filename(specifier, requester, is_main)? {
            Resolution::Builtin(name) => {
                debug!(specifier, "load built-in module");
                return self.builtins.require(&name);
            }
            Resolution::File(filename) => filename,
        };

        if let Some(cached) = self.registry.lookup(&filename) {
            return Ok(self.registry[cached].exports.clone());
        }

        let id = if is_main {
            ENTRY_MODULE_ID.to_string()
        } else {
            filename.to_string_lossy().into_owned()
        };
        let module = self.registry.create(id, requester);
        if is_main {
            self.main = Some(module);
        }
        self.registry.register(filename.clone(), module);

        if let Err(err) = self.load_module(module, &filename) {
            self.registry.evict(&filename, module);
            return Err(err);
        }
        Ok(self.registry[module].exports.clone())
    }

    /// `require(specifier)` issued by `parent`'s code.
    ///
    /// # Errors
    /// [`Error::InvalidSpecifier`] for an empty specifier, otherwise as
    /// [`ModuleSystem::load`].
    pub fn require(&mut self, parent: ModuleId, specifier: &str) -> Result<Exports> {
        check_specifier(specifier)?;
        self.require_depth += 1;
        let result = self.load(specifier, Some(parent), false);
        self.require_depth -= 1;
        result
    }

    /// `require.resolve(specifier)` issued by `parent`'s code.
    ///
    /// # Errors
    /// As [`ModuleSystem::resolve_filename`].
    pub fn resolve(&mut self, parent: ModuleId, specifier: &str) -> Result<Resolution> {
        check_specifier(specifier)?;
        self.resolve_filename(specifier, Some(parent), false)
    }

    /// Load `filename` into `module` with the handler for its extension.
    ///
    /// # Errors
    /// [`Error::DoubleLoad`] if the module already finished loading, otherwise
    /// whatever the handler raises. `loaded` stays false on error.
    pub fn load_module(&mut self, module: ModuleId, filename: &Path) -> Result<()> {
        let record = &mut self.registry[module];
        if record.loaded {
            return Err(Error::DoubleLoad {
                filename: filename.to_path_buf(),
            });
        }
        debug!(filename = %filename.display(), id = %record.id, "load");

        record.filename = Some(filename.to_path_buf());
        record.paths = node_module_paths(&self.config.cwd, &dirname(filename));
        record.lookup_chain = None;

        let handler = self.extensions.handler_for(filename);
        handler.handle(self, module, filename)?;

        self.registry[module].loaded = true;
        Ok(())
    }

    /// Strip any `#!` line, wrap, compile and run a source module.
    ///
    /// Filesystem probes are memoized while an outermost module body runs.
    ///
    /// # Errors
    /// Compile and execution errors from the execution service.
    pub(crate) fn compile_and_run(
        &mut self,
        module: ModuleId,
        content: &str,
        filename: &Path,
    ) -> Result<()> {
        let wrapped = wrap(strip_shebang(content));
        let execution = Rc::clone(&self.execution);
        let compiled = execution.compile(&wrapped, filename)?;

        let depth = self.require_depth;
        if depth == 0 {
            self.resolver.stat_cache_mut().arm();
        }

        let result = {
            let mut scope =
                ModuleScope::new(self, module, filename.to_path_buf(), dirname(filename));
            execution.invoke(compiled.as_ref(), &mut scope)
        };

        if depth == 0 {
            self.resolver.stat_cache_mut().disarm();
        }
        result
    }

    pub(crate) fn open_native_addon(&mut self, module: ModuleId, path: &Path) -> Result<()> {
        self.native.open(&mut self.registry[module], path)
    }

    /// Create an unregistered module record under `parent`.
    pub fn new_module(&mut self, id: impl Into<String>, parent: Option<ModuleId>) -> ModuleId {
        self.registry.create(id, parent)
    }

    /// Create a parentless, unregistered module; with a filename it also gets
    /// that file's `node_modules` chain, so it can require packages.
    pub fn detached_module(&mut self, id: impl Into<String>, filename: Option<&Path>) -> ModuleId {
        let module = self.registry.create(id, None);
        if let Some(filename) = filename {
            let filename = resolve(&self.config.cwd, &[filename]);
            let paths = node_module_paths(&self.config.cwd, &dirname(&filename));
            let record = &mut self.registry[module];
            record.filename = Some(filename);
            record.paths = paths;
        }
        module
    }

    /// Require each of `specifiers`, in order, from a synthetic parent whose
    /// `node_modules` chain starts at the working directory.
    ///
    /// # Errors
    /// The first failing require stops the preload.
    pub fn preload<S: AsRef<str>>(&mut self, specifiers: &[S]) -> Result<ModuleId> {
        let parent = self.registry.create(PRELOAD_MODULE_ID, None);
        self.registry[parent].paths = node_module_paths(&self.config.cwd, &self.config.cwd);

        for specifier in specifiers {
            let specifier = specifier.as_ref();
            check_specifier(specifier)?;
            self.load(specifier, Some(parent), false)?;
        }
        Ok(parent)
    }

    /// Load the program entry point. `entry` is taken relative to the working
    /// directory and the module gets id `.`.
    ///
    /// # Errors
    /// As [`ModuleSystem::load`].
    pub fn run_main(&mut self, entry: &str) -> Result<Exports> {
        check_specifier(entry)?;
        let entry = resolve(&self.config.cwd, &[Path::new(entry)]);
        self.load(&entry.to_string_lossy(), None, true)
    }
}

fn check_specifier(specifier: &str) -> Result<()> {
    if specifier.is_empty() {
        return Err(Error::InvalidSpecifier {
            reason: "missing path",
        });
    }
    Ok(())
}
