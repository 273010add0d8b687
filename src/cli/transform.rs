//! `sfcpack transform`: run one id through the module hooks.

use std::path::Path;

use anyhow::Result;

use super::host::DevHost;
use crate::core::VueRequest;
use crate::utils::path::{normalize_lexically, slash};

/// Compile `id` (relative to the project root) and return the output code.
///
/// Sub-requests need their owning document parsed first, so the owner is
/// loaded through the host before the section itself is requested.
pub async fn transform_id(host: &mut DevHost, id: &str) -> Result<String> {
    let id = absolute_id(&host.plugin().options().root, id);
    let request = VueRequest::parse(&id);

    if request.query.vue {
        let owner = request.query.from.as_deref().unwrap_or(&request.filename);
        host.warm(owner).await?;
    }
    Ok(host.request(&id).await?)
}

/// Root-anchor the path part of an id, keeping its query.
fn absolute_id(root: &Path, id: &str) -> String {
    let (file, query) = match id.split_once('?') {
        Some((file, query)) => (file, Some(query)),
        None => (id, None),
    };
    let file = slash(&normalize_lexically(&root.join(file)));
    match query {
        Some(query) => format!("{file}?{query}"),
        None => file,
    }
}
