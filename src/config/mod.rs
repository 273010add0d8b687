//! Plugin configuration management for `sfcpack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error      # ConfigError
//! ├── options    # ResolvedOptions (what the hooks read)
//! └── mod.rs     # SfcConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[plugin]`         | include/exclude filter, jsx, sourcemap           |
//! | `[template]`       | Options forwarded to the template compiler       |
//! | `[custom_blocks]`  | Custom block wiring                              |
//! | `[watch]`          | Dev host watch root and debounce                 |
//!
//! # Example
//!
//! ```toml
//! [plugin]
//! include = ["\\.vue$"]
//! exclude = ["legacy/"]
//! jsx = true
//!
//! [template.compiler_options]
//! whitespace = "condense"
//!
//! [custom_blocks]
//! field = "__i18n"
//! ```

mod error;
mod options;

pub use error::ConfigError;
pub use options::{CustomBlockOptions, ResolvedOptions};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::compiler::filter::ModuleFilter;
use crate::log;

// ============================================================================
// sections
// ============================================================================

/// `[plugin]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSection {
    /// Regexes a document path must match to be compiled.
    pub include: Vec<String>,
    /// Regexes excluding document paths, checked after `include`.
    pub exclude: Vec<String>,
    /// Compile `.jsx`/`.tsx` and markup-bearing `.js` modules.
    pub jsx: bool,
    pub sourcemap: bool,
    pub production: bool,
}

impl Default for PluginSection {
    fn default() -> Self {
        Self {
            include: vec![r"\.vue$".to_string()],
            exclude: Vec::new(),
            jsx: false,
            sourcemap: true,
            production: false,
        }
    }
}

/// `[template]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSection {
    pub compiler_options: toml::Table,
}

/// `[custom_blocks]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomBlocksSection {
    pub wire: bool,
    pub field: String,
}

impl Default for CustomBlocksSection {
    fn default() -> Self {
        let defaults = CustomBlockOptions::default();
        Self {
            wire: defaults.wire,
            field: defaults.field,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Directory watched by `sfcpack watch`, relative to the project root.
    pub root: PathBuf,
    /// Quiet period before a burst of file events is handled.
    pub debounce_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            debounce_ms: 100,
        }
    }
}

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sfcpack.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SfcConfig {
    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub plugin: PluginSection,

    #[serde(default)]
    pub template: TemplateSection,

    #[serde(default)]
    pub custom_blocks: CustomBlocksSection,

    #[serde(default)]
    pub watch: WatchSection,
}

impl SfcConfig {
    /// Load configuration, searching upward from `cwd` for `config_name`.
    ///
    /// A missing file yields the defaults rooted at `cwd`.
    pub fn load(config_name: &Path, cwd: &Path) -> Result<Self> {
        let mut config = match find_config_file(config_name, cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config
            }
            None => Self {
                root: cwd.to_path_buf(),
                ..Self::default()
            },
        };
        if config.root.as_os_str().is_empty() {
            config.root = cwd.to_path_buf();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}:", display_path);
        log!("warning"; "ignoring:");
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Check the filter patterns compile and the wiring field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ModuleFilter::new(&self.plugin.include, &self.plugin.exclude)
            .map_err(|e| ConfigError::Validation(format!("[plugin] include/exclude: {e}")))?;

        if self.custom_blocks.field.trim().is_empty() {
            return Err(ConfigError::Validation(
                "[custom_blocks] field must not be empty".to_string(),
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "[watch] debounce_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Options for the plugin hooks. `production` forces production mode.
    pub fn resolve(&self, production: bool) -> ResolvedOptions {
        ResolvedOptions {
            root: self.root.clone(),
            is_production: self.plugin.production || production,
            dev_server: false,
            sourcemap: self.plugin.sourcemap,
            include: self.plugin.include.clone(),
            exclude: self.plugin.exclude.clone(),
            jsx: self.plugin.jsx,
            template_options: self.template.compiler_options.clone(),
            custom_blocks: CustomBlockOptions {
                wire: self.custom_blocks.wire,
                field: self.custom_blocks.field.clone(),
            },
        }
    }

    /// Absolute directory watched by the dev host.
    pub fn watch_root(&self) -> PathBuf {
        if self.watch.root.is_absolute() {
            self.watch.root.clone()
        } else {
            self.root.join(&self.watch.root)
        }
    }
}

/// Find config file by walking up from `start`.
///
/// ```text
/// /home/user/app/src/components/  ← start
/// /home/user/app/sfcpack.toml     ← found!
/// ```
fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Parse a config snippet, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SfcConfig {
    let (parsed, ignored) = SfcConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
