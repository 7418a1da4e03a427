//! Error types for modules, submodules and plugin loading

use crate::context::DataSourceError;
use crate::data::DataShape;
use crate::store::StoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running a submodule or an action
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("No data source is active")]
    NoDataSource,

    #[error("Submodule '{submodule}' cannot produce {shape} data")]
    UnsupportedShape { submodule: String, shape: DataShape },

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Parameter '{0}' is required")]
    MissingParameter(String),

    #[error("Action '{0}' is not enabled for the current selection")]
    ActionDisabled(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while loading one plugin manifest
///
/// These never escape the plugin loader: each failing manifest is logged and
/// skipped.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Manifest has no 'type' key")]
    MissingType,

    #[error("Plugin type '{0}' is not registered")]
    UnknownType(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Constructor for plugin type '{kind}' panicked: {message}")]
    ConstructorPanicked { kind: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
