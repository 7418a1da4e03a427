//! Module framework
//!
//! A [`Module`] bundles submodules and decide-filter factories. Modules come
//! from loaders: the [`BuiltInLoader`] returns the compiled-in modules and the
//! [`PluginLoader`] builds modules from manifests found on disk. The
//! [`ModuleManager`] runs every loader once and exposes the flattened
//! submodule lists and filter registry as an immutable snapshot.
//!
//! # Submodules
//!
//! - **Import**: pulls facts from the active data source into the store
//! - **Export**: writes facts from the store somewhere, driven by parameters
//! - **Interactive**: produces record containers in one or more shapes and
//!   offers actions on them

pub mod error;
pub mod filesystem;
pub mod general;
pub mod loader;
pub mod manager;
pub mod packages;
pub mod plugin;
pub mod view;

pub use error::{ModuleError, PluginError};
pub use loader::{BuiltInLoader, ModuleLoader};
pub use manager::ModuleManager;
pub use plugin::{PluginConstructor, PluginLoader, PluginTypes};
pub use view::View;

use crate::actions::{Action, Parameter};
use crate::context::{DataSource, ModuleContext};
use crate::data::{DataContainer, DataShape};
use crate::filters::DecideFilterFactory;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Anything shown to users with a name and a description
pub trait Describable {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
}

type ProgressCallback = Box<dyn Fn(f64, &str) + Send + Sync>;

/// Progress reporting for long-running imports and exports
///
/// Reported fractions are clamped into `[0, 1]`.
pub struct Progress {
    state: Mutex<(f64, String)>,
    callback: Option<ProgressCallback>,
}

impl Progress {
    #[must_use]
    pub fn new(callback: impl Fn(f64, &str) + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new((0.0, String::new())),
            callback: Some(Box::new(callback)),
        }
    }

    /// Progress that is only recorded
    #[must_use]
    pub fn silent() -> Self {
        Self {
            state: Mutex::new((0.0, String::new())),
            callback: None,
        }
    }

    pub fn report(&self, fraction: f64, message: &str) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = (fraction, message.to_string());
        if let Some(callback) = &self.callback {
            callback(fraction, message);
        }
    }

    #[must_use]
    pub fn fraction(&self) -> f64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).0
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).1.clone()
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("fraction", &self.fraction())
            .finish_non_exhaustive()
    }
}

pub trait ImportSubmodule: Describable + Send + Sync {
    /// # Errors
    ///
    /// Returns `ModuleError` if the import fails; nothing is retried.
    fn do_import(&self, progress: &Progress) -> Result<(), ModuleError>;
}

pub trait ExportSubmodule: Describable + Send + Sync {
    /// Declared parameters, in the order they should be asked for
    fn parameters(&self) -> Vec<Parameter>;

    /// # Errors
    ///
    /// Returns `ModuleError` if a parameter is missing or the export fails.
    fn export(&self, progress: &Progress) -> Result<(), ModuleError>;
}

pub trait InteractiveSubmodule: Describable + Send + Sync {
    fn supported_shapes(&self) -> &[DataShape];

    /// # Errors
    ///
    /// Returns `ModuleError::UnsupportedShape` for shapes not listed in
    /// [`InteractiveSubmodule::supported_shapes`], or the error raised while
    /// querying the store.
    fn data(&self, shape: DataShape) -> Result<DataContainer, ModuleError>;

    fn actions(&self) -> Vec<Arc<Action>>;
}

/// The active data source of `ctx`, or `ModuleError::NoDataSource`
///
/// # Errors
///
/// Returns `ModuleError::NoDataSource` if none is set.
pub fn active_source(ctx: &ModuleContext) -> Result<Arc<dyn DataSource>, ModuleError> {
    ctx.data_sources().active().ok_or(ModuleError::NoDataSource)
}

/// A named bundle of submodules and filter factories
pub struct Module {
    name: String,
    description: String,
    imports: Vec<Arc<dyn ImportSubmodule>>,
    exports: Vec<Arc<dyn ExportSubmodule>>,
    interactive: Vec<Arc<dyn InteractiveSubmodule>>,
    filters: Vec<Arc<DecideFilterFactory>>,
}

impl Module {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            imports: Vec::new(),
            exports: Vec::new(),
            interactive: Vec::new(),
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_import(mut self, submodule: impl ImportSubmodule + 'static) -> Self {
        self.imports.push(Arc::new(submodule));
        self
    }

    #[must_use]
    pub fn with_export(mut self, submodule: impl ExportSubmodule + 'static) -> Self {
        self.exports.push(Arc::new(submodule));
        self
    }

    #[must_use]
    pub fn with_interactive(mut self, submodule: Arc<dyn InteractiveSubmodule>) -> Self {
        self.interactive.push(submodule);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, factory: DecideFilterFactory) -> Self {
        self.filters.push(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn imports(&self) -> &[Arc<dyn ImportSubmodule>] {
        &self.imports
    }

    #[must_use]
    pub fn exports(&self) -> &[Arc<dyn ExportSubmodule>] {
        &self.exports
    }

    #[must_use]
    pub fn interactive(&self) -> &[Arc<dyn InteractiveSubmodule>] {
        &self.interactive
    }

    #[must_use]
    pub fn filters(&self) -> &[Arc<DecideFilterFactory>] {
        &self.filters
    }
}

impl Describable for Module {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("imports", &self.imports.len())
            .field("exports", &self.exports.len())
            .field("interactive", &self.interactive.len())
            .field("filters", &self.filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_clamps() {
        let progress = Progress::silent();
        progress.report(1.5, "over");
        assert!((progress.fraction() - 1.0).abs() < f64::EPSILON);
        progress.report(-0.2, "under");
        assert!(progress.fraction().abs() < f64::EPSILON);
        progress.report(f64::NAN, "nan");
        assert!(progress.fraction().abs() < f64::EPSILON);
        assert_eq!(progress.message(), "nan");
    }

    #[test]
    fn test_progress_forwards_to_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let progress = Progress::new(move |fraction, message| {
            assert!((0.0..=1.0).contains(&fraction));
            assert_eq!(message, "step");
            counter.fetch_add(1, Ordering::SeqCst);
        });
        progress.report(0.5, "step");
        progress.report(3.0, "step");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_module_builder() {
        let module = Module::new("demo", "Demo module")
            .with_filter(DecideFilterFactory::text())
            .with_filter(DecideFilterFactory::tag());
        assert_eq!(module.name(), "demo");
        assert_eq!(module.filters().len(), 2);
        assert!(module.imports().is_empty());
        assert!(module.interactive().is_empty());
    }

    #[test]
    fn test_active_source_requires_one() {
        let (ctx, _) = crate::testing::mock_context();
        assert!(matches!(active_source(&ctx), Err(ModuleError::NoDataSource)));
    }
}
