//! Inventag CLI application entry point
//!
//! This is the main executable for the inventag inventory browser. It loads
//! the built-in modules and any plugin manifests, then compiles and applies
//! filter queries against the views those modules provide.
//!
//! # Usage
//!
//! ```bash
//! # Show loaded modules and their views, imports, exports and filters
//! inventag modules
//! inventag m
//!
//! # List filter factories usable in queries
//! inventag filters
//!
//! # See what a query compiles to
//! inventag check '{and: [foo, {tag: starred}]}'
//!
//! # Filter records exported to JSON
//! inventag filter '{regex: "^ssh"}' -i records.json --shape tree
//!
//! # Quiet mode (only output results)
//! inventag -q filter needle -i records.json
//! ```
//!
//! # Configuration
//!
//! Configuration is stored in the user's config directory
//! (`~/.config/inventag/config.toml` on Linux) and written with defaults on
//! first run. `INVENTAG_*` environment variables override file values, and
//! `RUST_LOG` controls log output on stderr.

use inventag::{
    InventagError,
    actions::ActionSettings,
    cli::{Cli, Commands},
    commands,
    config::InventagConfig,
    context::{LocalShell, ModuleContext},
    filters::FilterBuilder,
    modules::ModuleManager,
    store::{OfflineStore, Store},
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, InventagError>;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let mut config = InventagConfig::load()?;
    if let Some(dir) = &cli.plugin_dir {
        config.plugin_dir.clone_from(dir);
    }
    let quiet = cli.quiet || config.quiet;

    let store: Arc<dyn Store> = Arc::new(OfflineStore);
    let ctx = ModuleContext::new(Arc::clone(&store)).with_action_settings(ActionSettings {
        hidden_tag: config.hidden_tag.clone(),
        ..ActionSettings::default()
    });
    ctx.data_sources().set(Arc::new(LocalShell));

    let manager = ModuleManager::with_default_loaders(&ctx, &config);
    let mut builder = FilterBuilder::from_config(&config);

    match &cli.command {
        Commands::Modules => commands::modules(&manager, quiet)?,
        Commands::Filters => commands::filters(manager.filters(), quiet)?,
        Commands::Check { query, no_wrapper } => {
            if *no_wrapper {
                builder.set_use_wrapper(false);
            }
            commands::check(query, &builder, manager.filters(), quiet)?;
        }
        Commands::Filter { query, input, shape, no_wrapper } => {
            if *no_wrapper {
                builder.set_use_wrapper(false);
            }
            commands::filter(query, input, *shape, &builder, manager.filters(), &store, quiet)?;
        }
    }

    Ok(())
}
