//! `sfcpack inspect`: print a component's descriptor.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::plugin::VuePlugin;
use crate::utils::path::{normalize_lexically, slash};

/// Parse `file` through the plugin and render its descriptor as JSON.
pub async fn inspect(plugin: &VuePlugin, file: &Path) -> Result<String> {
    let path = normalize_lexically(&plugin.options().root.join(file));
    let id = slash(&path);
    let code = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    if plugin.transform(&code, &id).await?.is_none() {
        bail!("{} is not matched by [plugin] include/exclude", file.display());
    }
    let descriptor = plugin.cache().get(&id)?;
    Ok(serde_json::to_string_pretty(&*descriptor)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedOptions;
    use std::fs;

    #[tokio::test]
    async fn test_inspect_prints_sections() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("App.vue"),
            "<template><p/></template>\n<style scoped>p {}</style>",
        )
        .unwrap();
        let plugin = VuePlugin::new(ResolvedOptions::for_root(dir.path())).unwrap();

        let json = inspect(&plugin, Path::new("App.vue")).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["template"]["content"], "<p/>");
        assert_eq!(value["styles"][0]["attrs"]["scoped"], true);
        assert_eq!(value["id"].as_str().map(str::len), Some(8));
    }

    #[tokio::test]
    async fn test_inspect_filtered_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.js"), "export default 1").unwrap();
        let plugin = VuePlugin::new(ResolvedOptions::for_root(dir.path())).unwrap();

        let err = inspect(&plugin, Path::new("main.js")).await.unwrap_err();
        assert!(err.to_string().contains("include/exclude"));
    }
}
