//! Configuration module for inventag
//!
//! Stores the plugin directory, the hidden-tag marker and the filter
//! interpreter defaults. Configuration lives in the user's config directory
//! and can be overridden with `INVENTAG_*` environment variables.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default plugin manifest directory, relative to the working directory
pub const DEFAULT_PLUGIN_DIR: &str = "modules/plugins";

fn default_plugin_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PLUGIN_DIR)
}

fn default_hidden_tag() -> String {
    crate::filters::HIDDEN_TAG.to_string()
}

fn default_filter() -> String {
    crate::filters::DEFAULT_FILTER.to_string()
}

const fn default_true() -> bool {
    true
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InventagConfig {
    /// Directory scanned for plugin manifests
    #[serde(default = "default_plugin_dir")]
    pub plugin_dir: PathBuf,

    /// Tag that marks records hidden from default queries
    #[serde(default = "default_hidden_tag")]
    pub hidden_tag: String,

    /// Wrap every query so hidden records are excluded
    #[serde(default = "default_true")]
    pub use_wrapper: bool,

    /// Decide filter applied to bare strings in queries
    #[serde(default = "default_filter")]
    pub default_filter: String,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,
}

impl Default for InventagConfig {
    fn default() -> Self {
        Self {
            plugin_dir: default_plugin_dir(),
            hidden_tag: default_hidden_tag(),
            use_wrapper: true,
            default_filter: default_filter(),
            quiet: false,
        }
    }
}

impl InventagConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("inventag").join("config.toml"))
    }

    /// Load configuration from the user's config file, writing the defaults
    /// there first if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Self::load_from(&path)
    }

    /// Load configuration from `path`, layered under `INVENTAG_*` variables
    ///
    /// A missing file yields the defaults (plus any environment overrides).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or a value has the
    /// wrong type.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("INVENTAG").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Save configuration to the user's config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config path cannot be determined or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration as TOML to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the
    /// configuration cannot be serialized, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))
    }
}
