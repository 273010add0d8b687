//! `sfcpack watch`: hot-update loop over a directory.
//!
//! ```text
//! notify -> bridge thread -> Debouncer -> DevHost::on_change -> WatchStatus
//! ```
//!
//! The watcher is started before components are loaded so edits made during
//! warm-up are buffered instead of lost.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use jwalk::WalkDir;
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use super::host::DevHost;
use crate::logger::{status_error, status_success, status_unchanged};
use crate::utils::path::{normalize_lexically, slash};
use crate::{debug, log};

/// Directories never descended into when collecting components.
const SKIP_DIRS: &[&str] = &["node_modules", "target", "dist"];

pub async fn watch(host: &mut DevHost, dir: &Path, debounce: Duration) -> Result<()> {
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;
    watcher
        .watch(dir, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;

    let components = collect_components(dir, host)?;
    for file in &components {
        if let Err(e) = host.warm(file).await {
            status_error(file, &e.to_string());
        }
    }
    log!("watch"; "loaded {} components ({} modules), watching {}", components.len(), host.graph().len(), dir.display());

    let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);
    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if async_tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => log!("watch"; "notify error: {}", e),
            }
        }
    });

    let mut debouncer = Debouncer::new(debounce);
    loop {
        tokio::select! {
            biased;
            Some(event) = async_rx.recv() => debouncer.add_event(&event),
            _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                for path in debouncer.take_if_ready().unwrap_or_default() {
                    report(host, &slash(&path)).await;
                }
            }
        }
    }
}

/// Run one hot update and show its outcome.
async fn report(host: &mut DevHost, file: &str) {
    if !host.plugin().handles(file) {
        return;
    }
    match host.on_change(file).await {
        Ok(None) => debug!("watch"; "{} is not in the graph yet", file),
        Ok(Some(update)) if update.modules.is_empty() => {
            status_unchanged(&format!("{file}: nothing to update"));
        }
        Ok(Some(update)) => {
            let kind = update.update_type().unwrap_or_else(|| "reload".to_string());
            let mut message = format!("{file}: vue:update({kind})");
            for url in host.urls(&update) {
                message.push_str("\n  ");
                message.push_str(&url);
            }
            status_success(&message);
        }
        Err(e) => status_error(file, &e.to_string()),
    }
}

/// Component documents under `dir` that pass the plugin filter, sorted.
///
/// Hidden entries and [`SKIP_DIRS`] are pruned before they are read.
fn collect_components(dir: &Path, host: &DevHost) -> Result<Vec<String>> {
    if !dir.is_dir() {
        anyhow::bail!("failed to read {}: not a directory", dir.display());
    }

    let walker = WalkDir::new(dir)
        .skip_hidden(true)
        .sort(true)
        .process_read_dir(|_depth, _path, _state, children| {
            children.retain(|entry| {
                entry.as_ref().map_or(true, |e| {
                    let name = e.file_name().to_str().unwrap_or_default();
                    !(e.file_type().is_dir() && SKIP_DIRS.contains(&name))
                })
            });
        });

    let mut found: Vec<String> = walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| slash(&normalize_lexically(&e.path())))
        .filter(|file| host.plugin().handles(file))
        .collect();
    found.sort();
    Ok(found)
}

// ============================================================================
// Debouncer
// ============================================================================

/// Collects changed paths until no event arrived for one window.
struct Debouncer {
    changes: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            changes: FxHashSet::default(),
            last_event: None,
            window,
        }
    }

    /// Record content changes. Removals and metadata-only events are ignored.
    fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match event.kind {
            EventKind::Create(_) => {}
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            self.changes.insert(normalize_lexically(path));
            self.last_event = Some(Instant::now());
        }
    }

    fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        let last_event = self.last_event?;
        if last_event.elapsed() < self.window {
            return None;
        }
        self.last_event = None;

        let mut paths: Vec<_> = self.changes.drain().collect();
        paths.sort();
        (!paths.is_empty()).then_some(paths)
    }

    fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedOptions;
    use crate::plugin::VuePlugin;
    use notify::EventKind;
    use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind};
    use std::fs;

    fn make_event(paths: Vec<&str>, kind: EventKind) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.into_iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn modify() -> EventKind {
        EventKind::Modify(ModifyKind::Data(DataChange::Content))
    }

    #[test]
    fn test_debouncer_dedups_and_waits() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        assert!(debouncer.take_if_ready().is_none());

        debouncer.add_event(&make_event(vec!["/p/App.vue"], modify()));
        debouncer.add_event(&make_event(vec!["/p/App.vue"], EventKind::Create(CreateKind::File)));
        debouncer.add_event(&make_event(vec!["/p/B.vue"], modify()));

        let paths = debouncer.take_if_ready().unwrap();
        assert_eq!(paths, vec![PathBuf::from("/p/App.vue"), PathBuf::from("/p/B.vue")]);
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_debouncer_holds_within_window() {
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        debouncer.add_event(&make_event(vec!["/p/App.vue"], modify()));
        assert!(debouncer.take_if_ready().is_none());
        assert!(debouncer.sleep_duration() <= Duration::from_secs(60));
    }

    #[test]
    fn test_debouncer_ignores_noise() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.add_event(&make_event(
            vec!["/p/App.vue"],
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
        ));
        debouncer.add_event(&make_event(vec!["/p/App.vue"], EventKind::Remove(RemoveKind::File)));
        debouncer.add_event(&make_event(vec!["/p/.App.vue.swp", "/p/App.vue~"], modify()));
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_collect_components_skips_deps() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/components")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/lib")).unwrap();
        fs::write(dir.path().join("src/App.vue"), "").unwrap();
        fs::write(dir.path().join("src/components/Button.vue"), "").unwrap();
        fs::write(dir.path().join("src/main.js"), "").unwrap();
        fs::write(dir.path().join("node_modules/lib/Dep.vue"), "").unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache/Old.vue"), "").unwrap();

        let host = DevHost::new(VuePlugin::new(ResolvedOptions::for_root(dir.path())).unwrap());
        let found = collect_components(dir.path(), &host).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("src/App.vue"));
        assert!(found[1].ends_with("src/components/Button.vue"));
    }

    #[test]
    fn test_collect_components_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let host = DevHost::new(VuePlugin::new(ResolvedOptions::for_root(dir.path())).unwrap());
        assert!(collect_components(&dir.path().join("gone"), &host).is_err());
    }
}
