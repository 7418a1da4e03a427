//! Filters command - list registered filter factories

use crate::{InventagError, filters::FilterRegistry, modules::Describable, output};

type Result<T> = std::result::Result<T, InventagError>;

/// Execute the filters command
pub fn execute(registry: &FilterRegistry, quiet: bool) -> Result<()> {
    if !quiet {
        println!("{}", output::heading("Decide filters:", quiet));
    }
    for factory in registry.decide_factories() {
        println!(
            "{}",
            output::factory_line(factory.key(), factory.name(), factory.description(), quiet)
        );
    }

    if !quiet {
        println!("{}", output::heading("Combine filters:", quiet));
    }
    for factory in registry.combine_factories() {
        println!(
            "{}",
            output::factory_line(factory.key(), factory.name(), factory.description(), quiet)
        );
    }
    Ok(())
}
