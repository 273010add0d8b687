//! Descriptor: the parsed form of a component document at one revision.

use std::path::Path;

use serde::Serialize;

use super::block::{Block, BlockKind};
use crate::utils::path::{normalize_lexically, relative_to, slash};

/// Parsed section snapshot of one document.
///
/// Immutable once stored in the cache; an edit produces a new descriptor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Scope hash, see [`descriptor_id`].
    pub id: String,
    /// Slash-normalized document path.
    pub filename: String,
    pub script: Option<Block>,
    pub template: Option<Block>,
    pub styles: Vec<Block>,
    pub custom_blocks: Vec<Block>,
}

impl Descriptor {
    /// Look up the section a sub-request addresses.
    ///
    /// Custom blocks are addressed by index alone, so any non-core kind
    /// selects from `custom_blocks`.
    pub fn block(&self, kind: &BlockKind, index: Option<usize>) -> Option<&Block> {
        match kind {
            BlockKind::Script => self.script.as_ref(),
            BlockKind::Template => self.template.as_ref(),
            BlockKind::Style => self.styles.get(index?),
            BlockKind::Custom(_) => self.custom_blocks.get(index?),
        }
    }

    /// Whether any style section is `scoped`.
    pub fn has_scoped_style(&self) -> bool {
        self.styles.iter().any(|s| s.scoped)
    }

    /// `<template functional>`
    pub fn is_functional(&self) -> bool {
        self.template.as_ref().is_some_and(Block::is_functional)
    }
}

/// Compute the descriptor id.
///
/// Derived from the root-relative normalized path; production builds also
/// hash the full source so the id follows content changes.
pub fn descriptor_id(root: &Path, filename: &Path, source: &str, is_production: bool) -> String {
    let normalized = slash(&normalize_lexically(&relative_to(root, filename)));
    let mut hasher = blake3::Hasher::new();
    hasher.update(normalized.as_bytes());
    if is_production {
        hasher.update(source.as_bytes());
    }
    hex::encode(&hasher.finalize().as_bytes()[..4])
}
