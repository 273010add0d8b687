//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Dev host for the single-file component plugin
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sfcpack.toml)
    #[arg(short = 'C', long, global = true, default_value = "sfcpack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Compile in production mode (no hot reload, no `__file`)
    #[arg(long, global = true)]
    pub production: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the parsed descriptor of a component as JSON
    #[command(visible_alias = "i")]
    Inspect {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Run resolve, load and transform for a file or sub-request id
    #[command(visible_alias = "t")]
    Transform {
        /// Module id, e.g. `src/App.vue` or `src/App.vue?vue&type=template&lang.js`
        id: String,
    },

    /// Load every component, then print the modules each edit invalidates
    #[command(visible_alias = "w")]
    Watch {
        /// Directory to watch (default: `[watch] root`)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transform() {
        let cli = Cli::parse_from(["sfcpack", "--production", "transform", "src/App.vue"]);
        assert!(cli.production);
        assert_eq!(cli.config, PathBuf::from("sfcpack.toml"));
        assert!(matches!(cli.command, Commands::Transform { ref id } if id == "src/App.vue"));
    }

    #[test]
    fn test_parse_watch_defaults() {
        let cli = Cli::parse_from(["sfcpack", "-V", "watch"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Watch { dir: None }));
    }
}
