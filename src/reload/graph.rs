//! Module graph surface consumed by the hot-update differ.
//!
//! Mirrors what a bundler host exposes: one record per loaded module url,
//! the physical file it belongs to, and `importers` back-references.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

/// Index of a record in its [`ModuleGraph`].
pub type ModuleId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    pub id: ModuleId,
    /// Full module url including any sub-request query.
    pub url: String,
    /// Physical file (url without query).
    pub file: String,
    pub importers: BTreeSet<ModuleId>,
}

#[derive(Debug, Default)]
pub struct ModuleGraph {
    nodes: Vec<ModuleNode>,
    by_url: FxHashMap<String, ModuleId>,
    by_file: FxHashMap<String, Vec<ModuleId>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the record for `url`.
    pub fn ensure(&mut self, url: &str) -> ModuleId {
        if let Some(&id) = self.by_url.get(url) {
            return id;
        }
        let id = self.nodes.len();
        let file = url.split_once('?').map_or(url, |(file, _)| file).to_string();
        self.by_file.entry(file.clone()).or_default().push(id);
        self.by_url.insert(url.to_string(), id);
        self.nodes.push(ModuleNode {
            id,
            url: url.to_string(),
            file,
            importers: BTreeSet::new(),
        });
        id
    }

    /// Record that `importer` imports `imported`, creating both as needed.
    pub fn add_import(&mut self, importer: &str, imported: &str) -> (ModuleId, ModuleId) {
        let from = self.ensure(importer);
        let to = self.ensure(imported);
        self.nodes[to].importers.insert(from);
        (from, to)
    }

    pub fn node(&self, id: ModuleId) -> Option<&ModuleNode> {
        self.nodes.get(id)
    }

    pub fn by_url(&self, url: &str) -> Option<ModuleId> {
        self.by_url.get(url).copied()
    }

    /// Records belonging to a physical file, in creation order.
    pub fn modules_for_file(&self, file: &str) -> Vec<ModuleId> {
        self.by_file.get(file).cloned().unwrap_or_default()
    }

    /// Records importing `id`.
    pub fn importers(&self, id: ModuleId) -> impl Iterator<Item = &ModuleNode> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|node| node.importers.iter())
            .filter_map(|&importer| self.nodes.get(importer))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_is_idempotent() {
        let mut graph = ModuleGraph::new();
        let a = graph.ensure("/App.vue");
        let b = graph.ensure("/App.vue");
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_modules_for_file_groups_sub_requests() {
        let mut graph = ModuleGraph::new();
        let main = graph.ensure("/App.vue");
        let tpl = graph.ensure("/App.vue?vue&type=template&lang.js");
        graph.ensure("/Other.vue");

        assert_eq!(graph.modules_for_file("/App.vue"), vec![main, tpl]);
        assert_eq!(graph.node(tpl).unwrap().file, "/App.vue");
        assert!(graph.modules_for_file("/Missing.vue").is_empty());
    }

    #[test]
    fn test_importers() {
        let mut graph = ModuleGraph::new();
        let (main, style) = graph.add_import("/App.vue", "/App.vue?vue&type=style&index=0&lang.css");
        let (css, _) = graph.add_import("/theme.css", "/App.vue");

        let importers: Vec<_> = graph.importers(style).map(|n| n.id).collect();
        assert_eq!(importers, vec![main]);
        let importers: Vec<_> = graph.importers(main).map(|n| n.id).collect();
        assert_eq!(importers, vec![css]);
        assert_eq!(graph.by_url("/theme.css"), Some(css));
    }
}
