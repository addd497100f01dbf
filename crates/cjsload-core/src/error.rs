use std::path::PathBuf;
use thiserror::Error;

/// Core error type for module resolution and loading.
#[derive(Error, Debug)]
pub enum Error {
    /// No candidate directory, extension or manifest produced a file.
    #[error("Cannot find module '{specifier}'")]
    ModuleNotFound { specifier: String },

    /// A `package.json` exists but is not valid JSON.
    #[error("Error parsing {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A `.json` module is not valid JSON.
    #[error("{}: {source}", path.display())]
    JsonModuleParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `load` was called on a module that already finished loading.
    #[error("module {} is already loaded", filename.display())]
    DoubleLoad { filename: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve real path of {}: {source}", path.display())]
    Realpath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid module specifier: {reason}")]
    InvalidSpecifier { reason: &'static str },

    #[error("built-in module '{name}' is not available")]
    BuiltinUnavailable { name: String },

    #[error("cannot open native addon {}: {message}", path.display())]
    NativeAddon { path: PathBuf, message: String },

    /// Raised by an execution service while compiling or running module code.
    #[error("{message}")]
    Execution {
        filename: Option<PathBuf>,
        message: String,
    },
}

impl Error {
    /// Create an execution error not tied to a file.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            filename: None,
            message: message.into(),
        }
    }

    /// Create an execution error raised while running `filename`.
    #[must_use]
    pub fn execution_in(filename: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Execution {
            filename: Some(filename.into()),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModuleNotFound { .. } => "MODULE_NOT_FOUND",
            Self::ManifestParse { .. } => "MANIFEST_PARSE_ERROR",
            Self::JsonModuleParse { .. } => "JSON_MODULE_PARSE_ERROR",
            Self::DoubleLoad { .. } => "DOUBLE_LOAD",
            Self::ReadFile { .. } => "READ_FILE_ERROR",
            Self::Realpath { .. } => "REALPATH_ERROR",
            Self::InvalidSpecifier { .. } => "INVALID_SPECIFIER",
            Self::BuiltinUnavailable { .. } => "BUILTIN_UNAVAILABLE",
            Self::NativeAddon { .. } => "NATIVE_ADDON_ERROR",
            Self::Execution { .. } => "EXECUTION_ERROR",
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
