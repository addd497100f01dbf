//! Integration tests for specifier resolution through `ModuleSystem`.

use cjsload_core::{Error, LoaderConfig, ModuleSystem, Resolution};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    (dir, root)
}

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn system(root: &Path) -> ModuleSystem {
    ModuleSystem::new(LoaderConfig::new(root.to_path_buf()))
}

fn file(resolution: Resolution) -> PathBuf {
    resolution.path().unwrap().to_path_buf()
}

#[test]
fn test_resolution_is_cache_transparent() {
    let (_dir, root) = setup();
    write(&root, "node_modules/dep/package.json", r#"{"main": "main.js"}"#);
    write(&root, "node_modules/dep/main.js", "");
    write(&root, "app.js", "");

    let mut system = system(&root);
    let app = system.detached_module("app", Some(&root.join("app.js")));

    let first = system.resolve(app, "dep").unwrap();
    let second = system.resolve(app, "dep").unwrap();
    system.clear_caches();
    assert_eq!(system.resolver().path_cache_len(), 0);
    let third = system.resolve(app, "dep").unwrap();

    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn test_package_main_to_lib_index() {
    let (_dir, root) = setup();
    write(&root, "node_modules/pkg/package.json", r#"{"main": "./lib/index"}"#);
    let index = write(&root, "node_modules/pkg/lib/index.js", "");
    write(&root, "main.js", "");

    let mut system = system(&root);
    let main = system.detached_module("main", Some(&root.join("main.js")));
    assert_eq!(file(system.resolve(main, "pkg").unwrap()), index);
}

#[test]
fn test_directory_index_without_manifest() {
    let (_dir, root) = setup();
    let index = write(&root, "dir/index.js", "");

    let mut system = system(&root);
    let resolved = system.resolve_filename("./dir", None, false).unwrap();
    assert_eq!(file(resolved), index);
}

#[test]
fn test_manifest_without_main_falls_back_to_index() {
    let (_dir, root) = setup();
    write(&root, "lib/package.json", r#"{"name": "lib", "main": ""}"#);
    let index = write(&root, "lib/index.json", "{}");

    let mut system = system(&root);
    let resolved = system.resolve_filename("./lib", None, false).unwrap();
    assert_eq!(file(resolved), index);
}

#[test]
fn test_malformed_manifest_message() {
    let (_dir, root) = setup();
    let content = r#"{"main": "index.js",}"#;
    let manifest = write(&root, "broken/package.json", content);
    write(&root, "broken/index.js", "");

    let cause = serde_json::from_str::<serde_json::Value>(content)
        .unwrap_err()
        .to_string();

    let mut system = system(&root);
    let err = system.resolve_filename("./broken", None, false).unwrap_err();

    assert!(matches!(err, Error::ManifestParse { .. }));
    let message = err.to_string();
    assert!(message.contains(&manifest.display().to_string()));
    assert!(message.contains(&cause));
}

#[test]
fn test_relative_and_bare_ids_differ_from_root_context() {
    let (_dir, root) = setup();
    write(&root, "x.js", "");
    write(&root, "node_modules/x.js", "");

    let mut system = system(&root);
    let entry = system.detached_module(".", Some(&root.join("entry.js")));

    let relative = system.resolve_lookup_paths("./x", Some(entry));
    let bare = system.resolve_lookup_paths("x", Some(entry));
    assert_eq!(relative.id, root.join("x").to_string_lossy());
    assert_eq!(bare.id, "x");

    let nested = system.resolve_lookup_paths("./lib/a", Some(entry));
    assert_eq!(nested.id, root.join("lib").join("a").to_string_lossy());
    assert_ne!(relative.id, bare.id);
}

#[test]
fn test_not_found_carries_specifier() {
    let (_dir, root) = setup();
    let mut system = system(&root);
    let err = system.resolve_filename("nope", None, false).unwrap_err();

    assert!(matches!(err, Error::ModuleNotFound { ref specifier } if specifier == "nope"));
    assert_eq!(err.to_string(), "Cannot find module 'nope'");
}

#[test]
fn test_global_roots_searched_last() {
    let (_dir, root) = setup();
    let global = root.join("global");
    let global_copy = write(&root, "global/shared.js", "");
    let local_copy = write(&root, "app/node_modules/shared.js", "");
    write(&root, "app/main.js", "");
    let lonely = write(&root, "global/lonely.js", "");

    let config = LoaderConfig::new(root.clone()).with_global_paths(vec![global]);
    let mut system = ModuleSystem::new(config);
    let main = system.detached_module("main", Some(&root.join("app/main.js")));

    assert_eq!(file(system.resolve(main, "shared").unwrap()), local_copy);
    assert_eq!(file(system.resolve(main, "lonely").unwrap()), lonely);
    assert_ne!(local_copy, global_copy);
}

#[test]
fn test_builtin_shadows_node_modules() {
    let (_dir, root) = setup();
    write(&root, "node_modules/fs/index.js", "");

    let mut system = system(&root);
    assert_eq!(
        system.resolve_filename("fs", None, false).unwrap(),
        Resolution::Builtin("fs".to_string())
    );
}

#[test]
fn test_extension_order() {
    let (_dir, root) = setup();
    let js = write(&root, "both.js", "");
    write(&root, "both.json", "{}");

    let mut system = system(&root);
    assert_eq!(file(system.resolve_filename("./both", None, false).unwrap()), js);
}

#[cfg(unix)]
#[test]
fn test_symlinked_package_policy() {
    let (_dir, root) = setup();
    let real = write(&root, "packages/linked/index.js", "");
    fs::create_dir_all(root.join("app/node_modules")).unwrap();
    std::os::unix::fs::symlink(root.join("packages/linked"), root.join("app/node_modules/linked"))
        .unwrap();
    write(&root, "app/main.js", "");
    let through_link = root.join("app/node_modules/linked/index.js");

    let mut plain = system(&root);
    let main = plain.detached_module("main", Some(&root.join("app/main.js")));
    assert_eq!(file(plain.resolve(main, "linked").unwrap()), real);

    let config = LoaderConfig::new(root.clone()).with_preserve_symlinks(true);
    let mut preserving = ModuleSystem::new(config);
    let main = preserving.detached_module("main", Some(&root.join("app/main.js")));
    assert_eq!(file(preserving.resolve(main, "linked").unwrap()), through_link);

    // The entry module always gets its real path
    let entry = through_link.to_string_lossy().into_owned();
    assert_eq!(file(preserving.resolve_filename(&entry, None, true).unwrap()), real);
}
