//! Aggregation of every loaded module

use super::{
    BuiltInLoader, ExportSubmodule, ImportSubmodule, InteractiveSubmodule, Module, ModuleLoader,
    PluginLoader,
};
use crate::config::InventagConfig;
use crate::context::ModuleContext;
use crate::filters::FilterRegistry;
use std::sync::Arc;
use tracing::info;

/// Immutable snapshot of all modules and the registries derived from them
///
/// Built once by running every loader in order; nothing is loaded lazily.
#[derive(Debug)]
pub struct ModuleManager {
    modules: Vec<Module>,
    filters: FilterRegistry,
}

impl ModuleManager {
    /// Run `loaders` in order and aggregate their modules
    ///
    /// Decide-filter factories are registered in module order, so a later
    /// module replaces an earlier factory with the same key. Combine factories
    /// are always the built-in `and`, `or` and `not`.
    #[must_use]
    pub fn build(ctx: &ModuleContext, loaders: &[Box<dyn ModuleLoader>]) -> Self {
        let modules: Vec<Module> = loaders
            .iter()
            .flat_map(|loader| loader.load_modules(ctx))
            .collect();

        let mut filters = FilterRegistry::with_builtin_combinators();
        for factory in modules.iter().flat_map(Module::filters) {
            filters.register_decide(Arc::clone(factory));
        }

        info!(
            modules = modules.len(),
            filters = filters.decide_factories().len(),
            "modules loaded"
        );
        Self { modules, filters }
    }

    /// Built-in modules followed by the plugins of `config.plugin_dir`
    #[must_use]
    pub fn with_default_loaders(ctx: &ModuleContext, config: &InventagConfig) -> Self {
        let loaders: Vec<Box<dyn ModuleLoader>> = vec![
            Box::new(BuiltInLoader),
            Box::new(PluginLoader::from_config(config)),
        ];
        Self::build(ctx, &loaders)
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn interactive_submodules(&self) -> Vec<Arc<dyn InteractiveSubmodule>> {
        self.modules
            .iter()
            .flat_map(|m| m.interactive().iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn import_submodules(&self) -> Vec<Arc<dyn ImportSubmodule>> {
        self.modules.iter().flat_map(|m| m.imports().iter().cloned()).collect()
    }

    #[must_use]
    pub fn export_submodules(&self) -> Vec<Arc<dyn ExportSubmodule>> {
        self.modules.iter().flat_map(|m| m.exports().iter().cloned()).collect()
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterRegistry {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DecideFilterFactory, TagFilter};
    use crate::modules::Describable;
    use crate::testing::{mock_context, tagged};
    use std::fs;
    use tempfile::TempDir;

    /// One module contributing a `text` factory that actually matches tags
    struct Shadowing(&'static str);

    impl ModuleLoader for Shadowing {
        fn load_modules(&self, _ctx: &ModuleContext) -> Vec<Module> {
            let factory = DecideFilterFactory::new("text", self.0, "", |pattern| {
                Ok(Box::new(TagFilter::new(pattern)))
            });
            vec![Module::new(self.0, "").with_filter(factory)]
        }
    }

    #[test]
    fn test_built_in_aggregation() {
        let (ctx, _) = mock_context();
        let loaders: Vec<Box<dyn ModuleLoader>> = vec![Box::new(BuiltInLoader)];
        let manager = ModuleManager::build(&ctx, &loaders);

        assert_eq!(manager.modules().len(), 3);
        let views: Vec<String> = manager
            .interactive_submodules()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(
            views,
            vec!["Resources", "Tagged resources", "Files and directories", "Symlinks", "Packages"]
        );
        assert_eq!(manager.import_submodules().len(), 3);
        assert_eq!(manager.export_submodules().len(), 1);

        let keys: Vec<&str> = manager.filters().decide_factories().iter().map(|f| f.key()).collect();
        assert_eq!(keys, vec!["dpkg", "name", "regex", "sparql", "tag", "text", "uri"]);
        let combinators: Vec<&str> = manager.filters().combine_factories().iter().map(|f| f.key()).collect();
        assert_eq!(combinators, vec!["and", "not", "or"]);
    }

    #[test]
    fn test_last_writer_wins() {
        let (ctx, _) = mock_context();
        let loaders: Vec<Box<dyn ModuleLoader>> = vec![
            Box::new(BuiltInLoader),
            Box::new(Shadowing("first")),
            Box::new(Shadowing("second")),
        ];
        let manager = ModuleManager::build(&ctx, &loaders);

        let factory = manager.filters().decide("text").unwrap();
        assert_eq!(factory.name(), "second");
        let filter = factory.build("starred").unwrap();
        assert!(filter.matches(&tagged("x", &["starred"])));
    }

    #[test]
    fn test_default_loaders_include_plugins() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("extra.toml"),
            "type = \"query\"\nname = \"Extra\"\n",
        )
        .unwrap();
        let config = InventagConfig {
            plugin_dir: dir.path().to_path_buf(),
            ..InventagConfig::default()
        };

        let (ctx, _) = mock_context();
        let manager = ModuleManager::with_default_loaders(&ctx, &config);
        let names: Vec<&str> = manager.modules().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["General", "Filesystem", "Packages", "Extra"]);
    }
}
