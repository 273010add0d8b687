//! Virtual module router.
//!
//! Claims the two fixed runtime ids and every `?vue` sub-request, and loads
//! them: runtimes from embedded sources, `src` sections from disk, and
//! everything else from the cached descriptor.

use std::path::PathBuf;

use crate::cache::DescriptorCache;
use crate::core::{SourceMap, VueRequest};
use crate::embed;
use crate::error::PluginError;

/// Component normalization runtime id.
pub const COMPONENT_NORMALIZER: &str = "\0/vite/vueComponentNormalizer";

/// Hot-reload runtime id.
pub const HOT_RELOAD: &str = "\0/vite/vueHotReload";

/// Loaded module source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub code: String,
    pub map: Option<SourceMap>,
}

impl LoadResult {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

/// Claim runtime ids and sub-requests; `None` lets the host resolve normally.
pub fn resolve_id(id: &str) -> Option<String> {
    if id == COMPONENT_NORMALIZER || id == HOT_RELOAD {
        return Some(id.to_string());
    }
    VueRequest::parse(id).query.vue.then(|| id.to_string())
}

/// Load a claimed id.
///
/// Returns `Ok(None)` for ids this router does not serve and for sections
/// that no longer exist in the current descriptor.
pub async fn load(id: &str, cache: &DescriptorCache) -> Result<Option<LoadResult>, PluginError> {
    match id {
        COMPONENT_NORMALIZER => return Ok(Some(LoadResult::code(embed::NORMALIZER_JS))),
        HOT_RELOAD => return Ok(Some(LoadResult::code(embed::HOT_RELOAD_JS))),
        _ => {}
    }

    let VueRequest { filename, query } = VueRequest::parse(id);
    if !query.vue {
        return Ok(None);
    }

    if query.src {
        let code = tokio::fs::read_to_string(&filename)
            .await
            .map_err(|e| PluginError::Io(PathBuf::from(&filename), e))?;
        return Ok(Some(LoadResult::code(code)));
    }

    let descriptor = cache.get(&filename)?;
    let Some(kind) = query.kind else {
        return Ok(None);
    };

    Ok(descriptor
        .block(&kind, query.index)
        .map(|block| LoadResult {
            code: block.content.clone(),
            map: block.map.clone(),
        }))
}
