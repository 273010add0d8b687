//! In-memory bundler host.
//!
//! Drives a [`VuePlugin`] the way a dev server would: every requested id goes
//! through resolve -> load -> transform, imports of the result are followed
//! and recorded in a [`ModuleGraph`], and file edits are fed to the
//! hot-update hook with the graph's records for that file.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::error::PluginError;
use crate::plugin::VuePlugin;
use crate::reload::{HmrContext, HotUpdate, ModuleGraph};

/// Static imports in generated code. Specifiers are JSON-quoted.
static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:from|import)[ \t]+("(?:[^"\\]|\\.)*")"#).expect("valid regex")
});

pub struct DevHost {
    plugin: VuePlugin,
    graph: ModuleGraph,
}

impl DevHost {
    pub fn new(plugin: VuePlugin) -> Self {
        Self {
            plugin,
            graph: ModuleGraph::new(),
        }
    }

    pub fn plugin(&self) -> &VuePlugin {
        &self.plugin
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Resolve, load and transform one id.
    ///
    /// Ids the plugin does not claim are read from disk; claimed ids whose
    /// section no longer exists load as empty modules.
    pub async fn request(&self, id: &str) -> Result<String, PluginError> {
        let claimed = self.plugin.resolve_id(id);
        let resolved = claimed.as_deref().unwrap_or(id);

        let code = match self.plugin.load(resolved).await? {
            Some(loaded) => loaded.code,
            None if claimed.is_some() => String::new(),
            None => {
                let file = resolved.split_once('?').map_or(resolved, |(file, _)| file);
                tokio::fs::read_to_string(file)
                    .await
                    .map_err(|e| PluginError::Io(PathBuf::from(file), e))?
            }
        };

        Ok(match self.plugin.transform(&code, resolved).await? {
            Some(compiled) => compiled.code,
            None => code,
        })
    }

    /// Request `url` and every plugin-claimed module it pulls in.
    pub async fn warm(&mut self, url: &str) -> Result<(), PluginError> {
        self.graph.ensure(url);
        let mut queue = VecDeque::from([url.to_string()]);
        let mut seen = FxHashSet::default();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let code = self.request(&current).await?;
            for import in imports(&code) {
                if self.plugin.resolve_id(&import).is_none() {
                    continue;
                }
                self.graph.add_import(&current, &import);
                queue.push_back(import);
            }
        }
        Ok(())
    }

    /// Feed an edit of `file` to the hot-update hook.
    ///
    /// Affected modules are requested again so the graph follows the new
    /// section layout.
    pub async fn on_change(&mut self, file: &str) -> Result<Option<HotUpdate>, PluginError> {
        let modules = self.graph.modules_for_file(file);
        let ctx = HmrContext {
            file,
            modules: &modules,
            graph: &self.graph,
        };
        let path = PathBuf::from(file);
        let update = self
            .plugin
            .handle_hot_update(ctx, async move { tokio::fs::read_to_string(path).await })
            .await?;

        if let Some(update) = &update {
            for url in self.urls(update) {
                self.warm(&url).await?;
            }
        }
        Ok(update)
    }

    /// Module urls of an update, in update order.
    pub fn urls(&self, update: &HotUpdate) -> Vec<String> {
        update
            .modules
            .iter()
            .filter_map(|&id| self.graph.node(id))
            .map(|node| node.url.clone())
            .collect()
    }
}

/// Import specifiers of generated code, in source order.
fn imports(code: &str) -> Vec<String> {
    IMPORT
        .captures_iter(code)
        .filter_map(|caps| serde_json::from_str::<String>(&caps[1]).ok())
        .collect()
}
