//! Transform dispatch.
//!
//! Every id is classified into one [`RequestShape`] by an ordered check
//! (first match wins), then handed to the matching compile path:
//!
//! 1. `JsxModule`  - `.jsx` / `.tsx` file or sub-request
//! 2. `SniffedJsx` - plain `.js` outside the sub-request namespace whose
//!    content looks like markup
//! 3. `Declined`   - filtered out, or `raw`
//! 4. `Main`       - whole document
//! 5. `Block`      - section sub-request

pub mod backend;
pub mod block;
pub mod filter;
pub mod main;

use std::sync::LazyLock;

use regex::Regex;

use crate::cache::DescriptorCache;
use crate::config::ResolvedOptions;
use crate::core::VueRequest;
use crate::error::PluginError;
use crate::sfc::DescriptorBuilder;
use backend::{Backends, CompiledModule, ScriptInput};
use filter::ModuleFilter;

static JSX_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(tsx|jsx)$").expect("valid regex"));

static JS_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.js$").expect("valid regex"));

/// Everything a transform needs besides the code and id.
pub struct TransformContext<'a> {
    pub options: &'a ResolvedOptions,
    pub cache: &'a DescriptorCache,
    pub builder: &'a DescriptorBuilder,
    pub backends: &'a Backends,
    pub filter: &'a ModuleFilter,
}

/// Closed set of request shapes, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    JsxModule,
    SniffedJsx,
    Declined,
    Main,
    Block,
}

impl RequestShape {
    /// Classify an id. The order of the checks is the dispatch priority.
    pub fn classify(code: &str, id: &str, request: &VueRequest, ctx: &TransformContext<'_>) -> Self {
        let query = &request.query;

        if JSX_ID.is_match(id) {
            return Self::JsxModule;
        }
        if !query.vue && JS_ID.is_match(id) && ctx.builder.detector().looks_like_markup(code) {
            return Self::SniffedJsx;
        }
        if (!query.vue && !ctx.filter.matches(&request.filename)) || query.raw {
            return Self::Declined;
        }
        if !query.vue {
            return Self::Main;
        }
        Self::Block
    }
}

/// Transform one module. `Ok(None)` means not handled.
pub async fn transform(code: &str, id: &str, ctx: &TransformContext<'_>) -> Result<Option<CompiledModule>, PluginError> {
    let request = VueRequest::parse(id);

    match RequestShape::classify(code, id, &request, ctx) {
        RequestShape::JsxModule | RequestShape::SniffedJsx => {
            let compiled = ctx
                .backends
                .script
                .compile(ScriptInput { code, id })
                .await
                .map_err(|e| PluginError::compile(id, e))?;
            Ok(Some(compiled))
        }
        RequestShape::Declined => Ok(None),
        RequestShape::Main => main::transform_main(code, &request.filename, ctx).map(Some),
        RequestShape::Block => block::transform_block(code, id, &request, ctx).await,
    }
}
