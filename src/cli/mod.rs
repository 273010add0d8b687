//! Command-line interface module.
//!
//! # Modules
//!
//! - `args` - clap definitions
//! - `host` - in-memory bundler host driving the plugin hooks
//! - `inspect` / `transform` / `watch` - one module per subcommand

mod args;
pub mod host;
pub mod inspect;
pub mod transform;
pub mod watch;

pub use args::{Cli, Commands};

use std::time::Duration;

use anyhow::Result;

use crate::config::SfcConfig;
use crate::plugin::VuePlugin;
use host::DevHost;

/// Run a parsed command line against a loaded config.
pub async fn run(cli: &Cli, config: &SfcConfig) -> Result<()> {
    let mut plugin = VuePlugin::new(config.resolve(cli.production))?;

    match &cli.command {
        Commands::Inspect { file } => {
            println!("{}", inspect::inspect(&plugin, file).await?);
        }
        Commands::Transform { id } => {
            let mut host = DevHost::new(plugin);
            println!("{}", transform::transform_id(&mut host, id).await?);
        }
        Commands::Watch { dir } => {
            plugin.configure_server();
            let dir = match dir {
                Some(dir) => config.root.join(dir),
                None => config.watch_root(),
            };
            let mut host = DevHost::new(plugin);
            watch::watch(&mut host, &dir, Duration::from_millis(config.watch.debounce_ms)).await?;
        }
    }
    Ok(())
}
