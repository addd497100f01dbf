use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Environment variable holding extra global search roots.
pub const NODE_PATH_ENV: &str = "NODE_PATH";

/// Environment variable enabling preserve-symlinks mode when set to `1`.
pub const PRESERVE_SYMLINKS_ENV: &str = "NODE_PRESERVE_SYMLINKS";

/// Runtime configuration for the cjsload CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Keep symlinked paths instead of resolving them to real paths.
    pub preserve_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            preserve_symlinks: false,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Set preserve-symlinks mode.
    #[must_use]
    pub fn with_preserve_symlinks(mut self, preserve: bool) -> Self {
        self.preserve_symlinks = preserve;
        self
    }

    /// Build the loader configuration for this CLI invocation.
    ///
    /// Global search roots come from the process environment.
    #[must_use]
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::from_env(self.cwd.clone()).with_preserve_symlinks(self.preserve_symlinks)
    }
}

/// Configuration of a [`crate::ModuleSystem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory relative specifiers and candidate directories resolve against.
    pub cwd: PathBuf,

    /// Keep symlinked paths for non-entry modules.
    pub preserve_symlinks: bool,

    /// Global fallback search roots, searched after every `node_modules` chain.
    pub global_paths: Vec<PathBuf>,
}

impl LoaderConfig {
    /// Configuration with no global search roots.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            preserve_symlinks: false,
            global_paths: Vec::new(),
        }
    }

    /// Configuration whose global roots come from `NODE_PATH`, the home directory
    /// and the installation prefix of the running executable, and whose
    /// symlink mode comes from `NODE_PRESERVE_SYMLINKS`.
    #[must_use]
    pub fn from_env(cwd: PathBuf) -> Self {
        let node_path = std::env::var_os(NODE_PATH_ENV);
        let home = dirs_next::home_dir();
        let prefix = install_prefix();
        let global_paths =
            global_search_roots(node_path.as_deref(), home.as_deref(), prefix.as_deref());

        Self {
            cwd,
            preserve_symlinks: std::env::var_os(PRESERVE_SYMLINKS_ENV).is_some_and(|v| v == "1"),
            global_paths,
        }
    }

    /// Set preserve-symlinks mode.
    #[must_use]
    pub fn with_preserve_symlinks(mut self, preserve: bool) -> Self {
        self.preserve_symlinks = preserve;
        self
    }

    /// Replace the global search roots.
    #[must_use]
    pub fn with_global_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.global_paths = paths;
        self
    }
}

/// Compute the global fallback search roots.
///
/// Order: `NODE_PATH` entries (platform delimiter, empty entries dropped), then
/// `<home>/.node_modules`, `<home>/.node_libraries`, `<prefix>/lib/node`.
#[must_use]
pub fn global_search_roots(
    node_path: Option<&OsStr>,
    home: Option<&Path>,
    prefix: Option<&Path>,
) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = node_path
        .map(|value| {
            std::env::split_paths(value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();

    if let Some(home) = home {
        roots.push(home.join(".node_modules"));
        roots.push(home.join(".node_libraries"));
    }

    if let Some(prefix) = prefix {
        roots.push(prefix.join("lib").join("node"));
    }

    roots
}

/// Installation prefix: the executable's directory on Windows, its grandparent elsewhere.
fn install_prefix() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let bin_dir = exe.parent()?;
    if cfg!(windows) {
        Some(bin_dir.to_path_buf())
    } else {
        bin_dir.parent().map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[cfg(unix)]
    #[test]
    fn test_global_roots_order() {
        let roots = global_search_roots(
            Some(OsStr::new("/opt/a::/opt/b")),
            Some(Path::new("/home/u")),
            Some(Path::new("/usr")),
        );
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/opt/a"),
                PathBuf::from("/opt/b"),
                PathBuf::from("/home/u/.node_modules"),
                PathBuf::from("/home/u/.node_libraries"),
                PathBuf::from("/usr/lib/node"),
            ]
        );
    }

    #[test]
    fn test_global_roots_without_inputs() {
        assert!(global_search_roots(None, None, None).is_empty());
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_from_env_reads_node_path() {
        std::env::set_var(NODE_PATH_ENV, "/from/env");
        let config = LoaderConfig::from_env(PathBuf::from("/work"));
        std::env::remove_var(NODE_PATH_ENV);

        assert_eq!(config.global_paths.first(), Some(&PathBuf::from("/from/env")));
        assert!(!config.preserve_symlinks);
    }

    #[test]
    #[serial]
    fn test_from_env_without_node_path() {
        std::env::remove_var(NODE_PATH_ENV);
        let config = LoaderConfig::from_env(PathBuf::from("."));
        assert!(config
            .global_paths
            .iter()
            .all(|p| !p.as_os_str().is_empty()));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_preserve_symlinks() {
        std::env::set_var(PRESERVE_SYMLINKS_ENV, "1");
        let config = LoaderConfig::from_env(PathBuf::from("/work"));
        std::env::remove_var(PRESERVE_SYMLINKS_ENV);
        assert!(config.preserve_symlinks);

        std::env::set_var(PRESERVE_SYMLINKS_ENV, "0");
        let config = LoaderConfig::from_env(PathBuf::from("/work"));
        std::env::remove_var(PRESERVE_SYMLINKS_ENV);
        assert!(!config.preserve_symlinks);
    }

    #[test]
    fn test_config_builders() {
        let config = Config::new(PathBuf::from("/x"))
            .with_verbosity(2)
            .with_json_logs(true)
            .with_preserve_symlinks(true);
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
        assert!(config.loader_config().preserve_symlinks);
    }
}
