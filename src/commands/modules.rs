//! Modules command - list loaded modules and what they contribute

use crate::{InventagError, modules::{Describable, ModuleManager}, output};

type Result<T> = std::result::Result<T, InventagError>;

/// Execute the modules command
pub fn execute(manager: &ModuleManager, quiet: bool) -> Result<()> {
    if manager.modules().is_empty() {
        if !quiet {
            println!("No modules loaded.");
        }
        return Ok(());
    }

    for module in manager.modules() {
        println!("{}", output::heading(module.name(), quiet));
        if quiet {
            continue;
        }
        if !module.description().is_empty() {
            println!("  {}", module.description());
        }
        for view in module.interactive() {
            let shapes: Vec<String> = view.supported_shapes().iter().map(ToString::to_string).collect();
            println!("  view    {} ({})", view.name(), shapes.join(", "));
            for action in view.actions() {
                println!("            action {} [{}]", action.name(), action.kind());
            }
        }
        for import in module.imports() {
            println!("  import  {}", import.name());
        }
        for export in module.exports() {
            println!("  export  {}", export.name());
        }
        for factory in module.filters() {
            println!("  filter  {}", factory.key());
        }
    }
    Ok(())
}
