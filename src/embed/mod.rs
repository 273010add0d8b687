//! Embedded runtime modules.
//!
//! Both runtimes are minified at build time (see `build.rs`) and served
//! verbatim for the fixed virtual ids in [`crate::router`].
//!
//! - `NORMALIZER_JS` - attaches render functions, scope id and style
//!   injection onto a component's options
//! - `HOT_RELOAD_JS` - per-component record table with `reload` / `rerender`

/// Component normalizer (`export default function(scriptExports, render, ...)`).
pub const NORMALIZER_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/normalizer.min.js"));

/// Hot-reload runtime (`export default { install, createRecord, ... }`).
pub const HOT_RELOAD_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/hot-reload.min.js"));
