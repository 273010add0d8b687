//! Hot update.
//!
//! # Modules
//!
//! - `graph` - Module records and `importers` back-references
//! - `diff` - Descriptor diffing into the set of records to invalidate
//!
//! ```text
//! edit -> handle_hot_update -> DescriptorCache (prev/current) -> diff_descriptors -> HotUpdate
//! ```

pub mod diff;
pub mod graph;

pub use diff::{HmrContext, HotUpdate, diff_descriptors, handle_hot_update};
pub use graph::{ModuleGraph, ModuleId, ModuleNode};
