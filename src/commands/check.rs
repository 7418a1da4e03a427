//! Check command - compile a query and show the filter tree it produces

use crate::{
    InventagError,
    filters::{FilterBuilder, FilterRegistry},
};

type Result<T> = std::result::Result<T, InventagError>;

/// Execute the check command
pub fn execute(
    query: &str,
    builder: &FilterBuilder,
    registry: &FilterRegistry,
    quiet: bool,
) -> Result<()> {
    let filter = builder.build_filter(query, registry)?;
    if !quiet {
        println!("Query compiles to:");
    }
    println!("{}", filter.describe());
    Ok(())
}
