//! Module records and the pieces that load them.
//!
//! A [`Module`] is owned by the [`ModuleRegistry`] arena and addressed by
//! [`ModuleId`]. Parent links are plain ids (non-owning); `children` is the
//! ordered list of ids this module required.

pub mod host;
pub mod loader;
pub mod registry;

pub use host::{
    BuiltinModules, CompiledWrapper, ExecutionService, ModuleScope, NativeAddonLoader,
    NoExecution, NoNativeAddons, StaticBuiltins,
};
pub use loader::{strip_shebang, wrap, ExtensionHandler, ExtensionTable, WRAPPER};
pub use registry::ModuleRegistry;

use serde_json::Value;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Id given to the entry module instead of its filename.
pub const ENTRY_MODULE_ID: &str = ".";

/// Id of the synthetic parent used by [`crate::ModuleSystem::preload`].
pub const PRELOAD_MODULE_ID: &str = "internal/preload";

/// Handle to a module record inside a [`ModuleRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    /// Position of the record in the registry arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shared exports value of a module.
///
/// Cloning the handle shares the value; [`Exports::ptr_eq`] tells whether two
/// handles are the same value. Code that assigns a new handle to
/// [`Module::exports`] replaces the module's exports outright.
#[derive(Clone, Default)]
pub struct Exports(Rc<RefCell<Value>>);

impl Exports {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// A fresh `{}`.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }

    /// Borrow the current value.
    ///
    /// # Panics
    /// Panics if the value is currently mutably borrowed through [`Exports::update`].
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    /// Snapshot of the current value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Mutate the value in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Set `key` on an object value, turning a non-object into `{}` first.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.update(|current| {
            if !current.is_object() {
                *current = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(map) = current {
                map.insert(key.into(), value);
            }
        });
    }

    /// Whether both handles point at the same value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(value) => f.debug_tuple("Exports").field(&*value).finish(),
            Err(_) => f.write_str("Exports(<borrowed>)"),
        }
    }
}

impl From<Value> for Exports {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// A CommonJS module record.
#[derive(Debug, Clone)]
pub struct Module {
    /// Module id: the resolved filename, or [`ENTRY_MODULE_ID`] for the entry module.
    pub id: String,
    /// Resolved filename, set when loading starts.
    pub filename: Option<PathBuf>,
    pub exports: Exports,
    /// Module that first required this one.
    pub parent: Option<ModuleId>,
    /// Modules this one required, in require order.
    pub children: Vec<ModuleId>,
    pub loaded: bool,
    /// This module's own `node_modules` ancestor chain.
    pub paths: Vec<PathBuf>,
    /// `paths` followed by the global roots; computed on first non-relative lookup.
    pub(crate) lookup_chain: Option<Vec<PathBuf>>,
}

impl Module {
    /// Create an unloaded module with empty-object exports.
    #[must_use]
    pub fn new(id: impl Into<String>, parent: Option<ModuleId>) -> Self {
        Self {
            id: id.into(),
            filename: None,
            exports: Exports::empty_object(),
            parent,
            children: Vec::new(),
            loaded: false,
            paths: Vec::new(),
            lookup_chain: None,
        }
    }

    /// Whether this is the entry module.
    #[must_use]
    pub fn is_entry(&self) -> bool {
        self.id == ENTRY_MODULE_ID
    }
}
