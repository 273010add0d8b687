//! sfcpack dev host.

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use sfcpack::cli::{self, Cli};
use sfcpack::config::SfcConfig;
use sfcpack::logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let config = SfcConfig::load(&cli.config, &cwd)?;

    // One event loop: compiles and hot updates interleave, never run in parallel
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(cli::run(&cli, &config))
}
