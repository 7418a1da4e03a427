//! Inventag - browse and tag system-inventory facts through pluggable modules
//!
//! This library provides the pieces of an inventory browser: modules that
//! import facts into a knowledge store and present them as lists, tables or
//! trees, a YAML query language compiled into record filters, and actions
//! that tag or copy the selected records.

use thiserror::Error;

pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod data;
pub mod filters;
pub mod model;
pub mod modules;
pub mod output;
pub mod store;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum InventagError {
    /// A query could not be compiled
    #[error("Filter error: {0}")]
    Filter(#[from] filters::FilterBuildError),
    /// A module operation failed
    #[error("Module error: {0}")]
    Module(#[from] modules::ModuleError),
    /// A plugin could not be loaded
    #[error("Plugin error: {0}")]
    Plugin(#[from] modules::PluginError),
    /// The knowledge store rejected an operation
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Record input could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
