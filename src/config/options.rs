//! Options as seen by the plugin hooks.
//!
//! Built from [`SfcConfig`](super::SfcConfig) and then updated by the host
//! lifecycle (`config_resolved`, `configure_server`).

use std::path::PathBuf;

/// Custom block wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBlockOptions {
    /// Re-emit custom blocks as functions merging onto the component options.
    pub wire: bool,
    /// Component option the block values are collected under.
    pub field: String,
}

impl Default for CustomBlockOptions {
    fn default() -> Self {
        Self {
            wire: true,
            field: "__customBlock".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// Project root; ids and `__file` are derived relative to it.
    pub root: PathBuf,
    pub is_production: bool,
    /// Set once a dev server is attached. Gates the hot-reload bootstrap.
    pub dev_server: bool,
    pub sourcemap: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Enable the embedded-markup script path and pre-bundle loader.
    pub jsx: bool,
    pub template_options: toml::Table,
    pub custom_blocks: CustomBlockOptions,
}

impl ResolvedOptions {
    /// Defaults rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            is_production: false,
            dev_server: false,
            sourcemap: true,
            include: vec![r"\.vue$".to_string()],
            exclude: Vec::new(),
            jsx: false,
            template_options: toml::Table::new(),
            custom_blocks: CustomBlockOptions::default(),
        }
    }

    /// Whether main modules carry the hot-reload bootstrap.
    pub fn hot_reload(&self) -> bool {
        self.dev_server && !self.is_production
    }
}
