//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI args
//! and runs against the loaded modules and filter registry.

pub mod check;
pub mod filter;
pub mod filters;
pub mod modules;

// Re-export execute functions for convenience
pub use check::execute as check;
pub use filter::execute as filter;
pub use filters::execute as filters;
pub use modules::execute as modules;
