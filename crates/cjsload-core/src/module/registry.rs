//! Module registry: the arena that owns every module record, plus the
//! path-keyed cache that makes each resolved file a singleton.

use super::{Module, ModuleId};
use std::collections::HashMap;
use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};

/// Arena of module records and the filename → module cache.
///
/// Records are never removed from the arena, so ids held in `parent` and
/// `children` stay valid. [`ModuleRegistry::evict`] only drops the cache entry,
/// which makes the next require of that file start over.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    arena: Vec<Module>,
    cache: HashMap<PathBuf, ModuleId>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the arena and link it under its parent.
    pub fn insert(&mut self, module: Module) -> ModuleId {
        let id = ModuleId(self.arena.len());
        let parent = module.parent;
        self.arena.push(module);
        if let Some(parent) = parent {
            self.arena[parent.0].children.push(id);
        }
        id
    }

    /// Create a module with `id` under `parent` and add it to the arena.
    pub fn create(&mut self, id: impl Into<String>, parent: Option<ModuleId>) -> ModuleId {
        self.insert(Module::new(id, parent))
    }

    /// Make `module` the cached module for `filename`.
    pub fn register(&mut self, filename: PathBuf, module: ModuleId) {
        self.cache.insert(filename, module);
    }

    /// Cached module for `filename`.
    #[must_use]
    pub fn lookup(&self, filename: &Path) -> Option<ModuleId> {
        self.cache.get(filename).copied()
    }

    /// Drop the cache entry for `filename` if it still points at `module`.
    pub fn evict(&mut self, filename: &Path, module: ModuleId) -> bool {
        if self.cache.get(filename) == Some(&module) {
            self.cache.remove(filename);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.arena.get(id.0)
    }

    /// Number of cached (registered) modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of records in the arena, including evicted and synthetic ones.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }
}

impl Index<ModuleId> for ModuleRegistry {
    type Output = Module;

    fn index(&self, id: ModuleId) -> &Module {
        &self.arena[id.0]
    }
}

impl IndexMut<ModuleId> for ModuleRegistry {
    fn index_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.arena[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_links_children_in_order() {
        let mut registry = ModuleRegistry::new();
        let root = registry.create("root", None);
        let a = registry.create("/a.js", Some(root));
        let b = registry.create("/b.js", Some(root));

        assert_eq!(registry[root].children, vec![a, b]);
        assert_eq!(registry[a].parent, Some(root));
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ModuleRegistry::new();
        let a = registry.create("/a.js", None);
        registry.register(PathBuf::from("/a.js"), a);

        assert_eq!(registry.lookup(Path::new("/a.js")), Some(a));
        assert_eq!(registry.lookup(Path::new("/b.js")), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_evict_keeps_arena_record() {
        let mut registry = ModuleRegistry::new();
        let parent = registry.create("p", None);
        let a = registry.create("/a.js", Some(parent));
        registry.register(PathBuf::from("/a.js"), a);

        assert!(registry.evict(Path::new("/a.js"), a));
        assert!(registry.is_empty());
        assert_eq!(registry.arena_len(), 2);
        assert_eq!(registry[parent].children, vec![a]);
    }

    #[test]
    fn test_evict_ignores_replaced_entry() {
        let mut registry = ModuleRegistry::new();
        let first = registry.create("/a.js", None);
        let second = registry.create("/a.js", None);
        registry.register(PathBuf::from("/a.js"), second);

        assert!(!registry.evict(Path::new("/a.js"), first));
        assert_eq!(registry.lookup(Path::new("/a.js")), Some(second));
    }
}
