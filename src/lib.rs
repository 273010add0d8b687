//! sfcpack - single-file component support for a dev-server bundler.
//!
//! # Modules
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `core`     | Blocks, descriptors, sub-request grammar, line maps  |
//! | `sfc`      | Section parsing and descriptor construction          |
//! | `cache`    | Current and previous descriptor per document         |
//! | `router`   | Virtual module resolve/load                          |
//! | `compiler` | Transform dispatch and back ends                     |
//! | `reload`   | Module graph and hot-update diffing                  |
//! | `plugin`   | `VuePlugin`, the host hook surface                   |
//! | `prebundle`| Dependency pre-bundling loader                       |
//! | `config`   | `sfcpack.toml`                                       |
//! | `cli`      | Dev host commands                                    |

pub mod logger;

pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod core;
pub mod embed;
pub mod error;
pub mod plugin;
pub mod prebundle;
pub mod reload;
pub mod router;
pub mod sfc;
pub mod utils;

pub use error::{BackendError, PluginError};
pub use plugin::VuePlugin;
