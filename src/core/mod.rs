//! Core data model: sections, descriptors, sub-request ids and source maps.

pub mod block;
pub mod descriptor;
pub mod map;
pub mod query;

pub use block::{AttrValue, Attrs, Block, BlockKind, blocks_equal};
pub use descriptor::{Descriptor, descriptor_id};
pub use map::SourceMap;
pub use query::{VueQuery, VueRequest, block_request, is_css_request};
