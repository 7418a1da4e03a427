//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for inventag using the `clap` crate.
//!
//! # Commands
//!
//! - **modules**: List loaded modules with their submodules and filters
//! - **filters**: List decide and combine filter factories
//! - **check**: Compile a query and report the resulting filter tree
//! - **filter**: Apply a query to records read from a JSON file
//!
//! # Examples
//!
//! ```no_run
//! use inventag::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_args();
//! if let Commands::Check { query, .. } = &cli.command {
//!     println!("checking {query}");
//! }
//! ```

use crate::data::DataShape;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "inventag")]
#[command(about = "Browse and tag system-inventory facts through pluggable modules", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Directory scanned for plugin manifests (overrides config)
    #[arg(long = "plugin-dir", value_name = "DIR", global = true)]
    pub plugin_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List loaded modules, their submodules and filter factories
    #[command(visible_alias = "m")]
    Modules,

    /// List decide and combine filter factories
    #[command(visible_alias = "f")]
    Filters,

    /// Compile a query and print the resulting filter tree
    #[command(visible_alias = "c")]
    Check {
        /// Query text, e.g. '{and: [foo, {tag: starred}]}'
        #[arg(value_name = "QUERY")]
        query: String,

        /// Do not exclude hidden records
        #[arg(long = "no-wrapper")]
        no_wrapper: bool,
    },

    /// Filter records read from a JSON file
    Filter {
        /// Query text, e.g. '{and: [foo, {tag: starred}]}'
        #[arg(value_name = "QUERY")]
        query: String,

        /// JSON file holding an array of records (or one root record for trees)
        #[arg(short = 'i', long = "input", value_name = "FILE")]
        input: PathBuf,

        /// Shape the records are arranged in
        #[arg(short = 's', long = "shape", value_enum, default_value_t = DataShape::List)]
        shape: DataShape,

        /// Do not exclude hidden records
        #[arg(long = "no-wrapper")]
        no_wrapper: bool,
    },
}

impl Cli {
    /// Parse command-line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
