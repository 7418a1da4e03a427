//! Plugin loader: modules described by TOML manifests on disk
//!
//! Every `*.toml` file below the plugin directory is a candidate. Its `type`
//! key selects a constructor from [`PluginTypes`], which receives the parsed
//! manifest. Files whose name starts with `_` are fragments and are skipped.
//!
//! The built-in `query` type describes a module declaratively:
//!
//! ```toml
//! type = "query"
//! name = "Services"
//! description = "Systemd units"
//!
//! [[interactive]]
//! name = "Enabled units"
//! query = "SELECT ?unit ?label WHERE { ?unit <http://inventag.local/name> ?label }"
//! resource = "unit"
//!
//! [[filters]]
//! key = "unit"
//! name = "Unit name"
//! ask = "ASK { ?uri <http://inventag.local/name> ?pattern }"
//! ```

use super::view::{View, rows_to_records};
use super::{Module, ModuleLoader, PluginError};
use crate::config::InventagConfig;
use crate::context::ModuleContext;
use crate::data::{DataContainer, DataShape, ListData, TableData};
use crate::filters::DecideFilterFactory;
use serde::Deserialize;
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Builds a module from a parsed manifest
pub type PluginConstructor = fn(&ModuleContext, &toml::Table) -> Result<Module, PluginError>;

/// Plugin type name to constructor
#[derive(Debug, Clone)]
pub struct PluginTypes {
    constructors: HashMap<String, PluginConstructor>,
}

impl PluginTypes {
    /// A registry without any types
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry holding the `query` type
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut types = Self::empty();
        types.register("query", query_module);
        types
    }

    /// Register a constructor, returning the one it replaces
    pub fn register(
        &mut self,
        name: impl Into<String>,
        constructor: PluginConstructor,
    ) -> Option<PluginConstructor> {
        self.constructors.insert(name.into(), constructor)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<PluginConstructor> {
        self.constructors.get(name).copied()
    }
}

impl Default for PluginTypes {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Loads modules from the manifests in a directory
#[derive(Debug, Clone)]
pub struct PluginLoader {
    dir: PathBuf,
    types: PluginTypes,
}

impl PluginLoader {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            types: PluginTypes::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &InventagConfig) -> Self {
        Self::new(&config.plugin_dir)
    }

    #[must_use]
    pub fn with_types(mut self, types: PluginTypes) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Manifest files in traversal order, creating the directory if needed
    fn candidates(&self) -> Vec<PathBuf> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "cannot create plugin directory");
            return Vec::new();
        }

        WalkDir::new(&self.dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| {
                entry
                    .map_err(|e| warn!(error = %e, "skipping unreadable plugin entry"))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .filter(|path| {
                let fragment = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('_'));
                if fragment {
                    debug!(path = %path.display(), "skipping manifest fragment");
                }
                !fragment
            })
            .collect()
    }

    /// Build the module described by one manifest
    ///
    /// # Errors
    ///
    /// Returns `PluginError` if the manifest cannot be read or parsed, names
    /// no known type, or its constructor rejects it or panics.
    pub fn load_manifest(&self, ctx: &ModuleContext, path: &Path) -> Result<Module, PluginError> {
        let text = fs::read_to_string(path).map_err(|source| PluginError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: toml::Table = toml::from_str(&text).map_err(|source| PluginError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let kind = manifest
            .get("type")
            .and_then(toml::Value::as_str)
            .ok_or(PluginError::MissingType)?;
        let constructor = self
            .types
            .get(kind)
            .ok_or_else(|| PluginError::UnknownType(kind.to_string()))?;
        // A misbehaving constructor must only cost its own candidate
        panic::catch_unwind(AssertUnwindSafe(|| constructor(ctx, &manifest)))
            .unwrap_or_else(|payload| {
                Err(PluginError::ConstructorPanicked {
                    kind: kind.to_string(),
                    message: panic_message(payload.as_ref()),
                })
            })
    }
}

impl ModuleLoader for PluginLoader {
    fn load_modules(&self, ctx: &ModuleContext) -> Vec<Module> {
        self.candidates()
            .iter()
            .filter_map(|path| match self.load_manifest(ctx, path) {
                Ok(module) => {
                    info!(path = %path.display(), "loaded plugin");
                    Some(module)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping plugin");
                    None
                }
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn default_label() -> String {
    "label".to_string()
}

#[derive(Debug, Deserialize)]
struct QueryManifest {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    interactive: Vec<QueryView>,
    #[serde(default)]
    filters: Vec<QueryFilter>,
}

#[derive(Debug, Deserialize)]
struct QueryView {
    name: String,
    #[serde(default)]
    description: String,
    query: String,
    /// Variable bound to the display string
    #[serde(default = "default_label")]
    label: String,
    /// Variable bound to the subject URI
    resource: Option<String>,
    #[serde(default)]
    columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QueryFilter {
    key: String,
    name: String,
    #[serde(default)]
    description: String,
    ask: String,
}

fn query_view(ctx: &ModuleContext, spec: QueryView) -> View {
    let QueryView {
        name,
        description,
        query,
        label,
        resource,
        columns,
    } = spec;
    View::new(
        ctx,
        name,
        description,
        &[DataShape::List, DataShape::Table],
        move |ctx, shape| {
            let rows = ctx.store().execute_select(&query)?;
            let records = rows_to_records(ctx, rows, &label, resource.as_deref());
            Ok(match shape {
                DataShape::Table if columns.is_empty() => DataContainer::Table(TableData::new(records)),
                DataShape::Table => {
                    DataContainer::Table(TableData::new(records).with_columns(columns.clone()))
                }
                _ => DataContainer::List(ListData::new(records)),
            })
        },
    )
}

/// Constructor of the built-in `query` plugin type
///
/// # Errors
///
/// Returns `PluginError::InvalidManifest` if required keys are missing or
/// have the wrong type.
pub fn query_module(ctx: &ModuleContext, manifest: &toml::Table) -> Result<Module, PluginError> {
    let manifest: QueryManifest = toml::Value::Table(manifest.clone())
        .try_into()
        .map_err(|e: toml::de::Error| PluginError::InvalidManifest(e.message().to_string()))?;
    if manifest.name.trim().is_empty() {
        return Err(PluginError::InvalidManifest("name must not be empty".to_string()));
    }

    let mut module = Module::new(manifest.name, manifest.description);
    for view in manifest.interactive {
        module = module.with_interactive(Arc::new(query_view(ctx, view)));
    }
    for filter in manifest.filters {
        module = module.with_filter(DecideFilterFactory::ask_template(
            filter.key,
            filter.name,
            filter.description,
            filter.ask,
            Arc::clone(ctx.store()),
        ));
    }
    Ok(module)
}
