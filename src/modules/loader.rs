//! Module loaders

use super::{Module, filesystem, general, packages};
use crate::context::ModuleContext;

/// Produces modules for a context
///
/// Loaders never fail as a whole: a candidate that cannot be built is logged
/// and left out.
pub trait ModuleLoader: Send + Sync {
    fn load_modules(&self, ctx: &ModuleContext) -> Vec<Module>;
}

/// Returns the compiled-in modules: general, filesystem and packages
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltInLoader;

impl ModuleLoader for BuiltInLoader {
    fn load_modules(&self, ctx: &ModuleContext) -> Vec<Module> {
        vec![general::module(ctx), filesystem::module(ctx), packages::module(ctx)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::Describable;
    use crate::testing::mock_context;

    #[test]
    fn test_built_in_modules() {
        let (ctx, _) = mock_context();
        let modules = BuiltInLoader.load_modules(&ctx);
        let names: Vec<&str> = modules.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["General", "Filesystem", "Packages"]);
    }
}
