//! Hot-update differ.
//!
//! Compares the previous and current descriptor of a document section by
//! section and returns the module records to invalidate.
//!
//! # Function Types
//!
//! - `diff_descriptors()` - Pure function over two descriptors
//! - `handle_hot_update()` - Effectful: re-reads, re-parses, updates cache
//!
//! Styles and custom blocks are compared by position. A block that only
//! moved shows up as changed at both indices.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::graph::{ModuleGraph, ModuleId};
use crate::cache::DescriptorCache;
use crate::config::ResolvedOptions;
use crate::core::{BlockKind, Descriptor, VueQuery, VueRequest, blocks_equal, is_css_request};
use crate::debug;
use crate::error::PluginError;
use crate::sfc::DescriptorBuilder;

/// Result of one hot-update cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotUpdate {
    /// Records to invalidate, deduplicated, in discovery order.
    pub modules: Vec<ModuleId>,
    /// Template changed.
    pub rerender: bool,
    /// At least one style block changed or was added.
    pub styles: bool,
}

impl HotUpdate {
    /// `template&style` style label for logging, `None` when neither changed.
    pub fn update_type(&self) -> Option<String> {
        let mut kinds = Vec::new();
        if self.rerender {
            kinds.push("template");
        }
        if self.styles {
            kinds.push("style");
        }
        (!kinds.is_empty()).then(|| kinds.join("&"))
    }
}

/// Ordered set that ignores missing records.
#[derive(Default)]
struct AffectedSet {
    order: Vec<ModuleId>,
    seen: FxHashSet<ModuleId>,
}

impl AffectedSet {
    fn add(&mut self, id: Option<ModuleId>) {
        if let Some(id) = id
            && self.seen.insert(id)
        {
            self.order.push(id);
        }
    }
}

/// A document's records with their parsed queries.
struct Records<'a> {
    parsed: Vec<(ModuleId, VueRequest)>,
    graph: &'a ModuleGraph,
}

impl<'a> Records<'a> {
    fn new(modules: &[ModuleId], graph: &'a ModuleGraph) -> Self {
        let parsed = modules
            .iter()
            .filter_map(|&id| graph.node(id).map(|n| (id, VueRequest::parse(&n.url))))
            .collect();
        Self { parsed, graph }
    }

    fn find(&self, pred: impl Fn(&VueQuery) -> bool) -> Option<ModuleId> {
        self.parsed.iter().find(|(_, r)| pred(&r.query)).map(|(id, _)| *id)
    }

    /// No sub-request type, or the script sub-request.
    fn main(&self) -> Option<ModuleId> {
        self.parsed.iter().find(|(_, r)| r.is_main_like()).map(|(id, _)| *id)
    }

    fn template(&self) -> Option<ModuleId> {
        self.find(|q| q.kind == Some(BlockKind::Template))
    }

    fn indexed(&self, kind: &BlockKind, index: usize) -> Option<ModuleId> {
        self.find(|q| q.kind.as_ref() == Some(kind) && q.index == Some(index))
    }
}

/// Compute the records invalidated by going from `prev` to `next`.
///
/// `modules` are the graph's records for the document.
pub fn diff_descriptors(prev: &Descriptor, next: &Descriptor, modules: &[ModuleId], graph: &ModuleGraph) -> HotUpdate {
    let records = Records::new(modules, graph);
    let main = records.main();
    let template = records.template();
    let mut affected = AffectedSet::default();
    let mut rerender = false;
    let mut styles = false;

    if !blocks_equal(prev.script.as_ref(), next.script.as_ref()) {
        let script_module = next
            .script
            .as_ref()
            .filter(|s| s.src.is_none())
            .and_then(|s| s.lang.as_deref())
            .and_then(|lang| {
                records.find(|q| q.kind == Some(BlockKind::Script) && q.lang.as_deref() == Some(lang))
            });
        affected.add(script_module.or(main));
    }

    if !blocks_equal(prev.template.as_ref(), next.template.as_ref()) {
        affected.add(template);
        rerender = true;
    }

    // scoping changes how markup compiles
    if prev.has_scoped_style() != next.has_scoped_style() {
        affected.add(template);
        affected.add(main);
    }

    for (i, next_style) in next.styles.iter().enumerate() {
        let changed = prev.styles.get(i).is_none_or(|p| !p.same_as(next_style));
        if changed {
            styles = true;
            // a style the graph never loaded cannot be patched in
            affected.add(records.indexed(&BlockKind::Style, i).or(main));
        }
    }
    if prev.styles.len() > next.styles.len() {
        affected.add(main);
    }

    if prev.custom_blocks.len() != next.custom_blocks.len() {
        affected.add(main);
    } else {
        for (i, (p, n)) in prev.custom_blocks.iter().zip(&next.custom_blocks).enumerate() {
            if !p.same_as(n) {
                affected.add(records.indexed(&p.kind, i).or(main));
            }
        }
    }

    if rerender {
        match (template, main) {
            // template is inlined into main
            (None, _) => affected.add(main),
            (Some(_), Some(main)) => {
                for importer in records.graph.importers(main) {
                    if is_css_request(&importer.url) {
                        affected.add(Some(importer.id));
                    }
                }
            }
            (Some(_), None) => {}
        }
    }

    HotUpdate {
        modules: affected.order,
        rerender,
        styles,
    }
}

/// What the host passes on a file change.
#[derive(Clone, Copy)]
pub struct HmrContext<'a> {
    pub file: &'a str,
    /// The graph's records for `file`.
    pub modules: &'a [ModuleId],
    pub graph: &'a ModuleGraph,
}

/// Run one hot-update cycle for a changed document.
///
/// Returns `Ok(None)` when the document was never parsed (not yet in the
/// graph, e.g. an async component). Otherwise the previous descriptor is
/// recorded, `read` supplies the new text, the fresh descriptor is stored
/// and the diff is returned; an empty module list means nothing changed.
pub async fn handle_hot_update<F>(
    ctx: HmrContext<'_>,
    read: F,
    builder: &DescriptorBuilder,
    options: &ResolvedOptions,
    cache: &DescriptorCache,
) -> Result<Option<HotUpdate>, PluginError>
where
    F: Future<Output = io::Result<String>>,
{
    let Some(prev) = cache.try_get(ctx.file) else {
        return Ok(None);
    };
    cache.set_previous(ctx.file, Arc::clone(&prev));

    let content = read
        .await
        .map_err(|e| PluginError::Io(PathBuf::from(ctx.file), e))?;
    let next = builder.create_descriptor(&content, ctx.file, options, cache)?;

    let update = diff_descriptors(&prev, &next, ctx.modules, ctx.graph);
    if let Some(kind) = update.update_type() {
        debug!("hmr"; "vue:update({}) {}", kind, ctx.file);
    }
    Ok(Some(update))
}
