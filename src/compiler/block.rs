//! Section sub-request compile.
//!
//! Templates and styles go to their back ends; scripts pass through; custom
//! blocks are optionally wrapped so they merge onto the component options.

use super::TransformContext;
use super::backend::{CompiledModule, StyleInput, TemplateInput};
use super::main::bind_default;
use crate::core::{BlockKind, VueRequest};
use crate::debug;
use crate::error::PluginError;

/// Binding a custom block's value is assigned to before wrapping.
const CUSTOM_BINDING: &str = "__customBlock";

/// Compile one section sub-request.
///
/// `Ok(None)` leaves the loaded code to the host (scripts, unwired custom
/// blocks, sections missing from the current descriptor).
pub async fn transform_block(
    code: &str,
    id: &str,
    request: &VueRequest,
    ctx: &TransformContext<'_>,
) -> Result<Option<CompiledModule>, PluginError> {
    let query = &request.query;
    let owner = query.from.as_deref().unwrap_or(&request.filename);
    let descriptor = ctx.cache.get(owner)?;

    let Some(kind) = &query.kind else {
        return Ok(None);
    };

    match kind {
        BlockKind::Script => Ok(None),

        BlockKind::Template => {
            let Some(block) = &descriptor.template else {
                return Ok(None);
            };
            let compiled = ctx
                .backends
                .template
                .compile(TemplateInput {
                    source: code,
                    block,
                    descriptor: &descriptor,
                    filename: &request.filename,
                    compiler_options: &ctx.options.template_options,
                    is_production: ctx.options.is_production,
                })
                .await
                .map_err(|e| PluginError::compile(id, e))?;
            Ok(Some(compiled))
        }

        BlockKind::Style => {
            let Some(index) = query.index.filter(|&i| i < descriptor.styles.len()) else {
                return Ok(None);
            };
            let compiled = ctx
                .backends
                .style
                .transform(StyleInput {
                    source: code,
                    descriptor: &descriptor,
                    index,
                    filename: &request.filename,
                    is_production: ctx.options.is_production,
                })
                .await
                .map_err(|e| PluginError::compile(id, e))?;

            if descriptor.styles[index].scoped && !compiled.scoped {
                debug!("transform"; "{} is scoped but was emitted unscoped", id);
            }
            match compiled.exports {
                Some(exports) => Ok(Some(css_module_code(&compiled.module.code, &exports))),
                None => Ok(Some(compiled.module)),
            }
        }

        BlockKind::Custom(tag) => {
            let wiring = &ctx.options.custom_blocks;
            if !wiring.wire {
                return Ok(None);
            }
            Ok(Some(CompiledModule::code(wire_custom_block(code, tag, &wiring.field))))
        }
    }
}

/// JS module exposing the printed CSS and the class-name mapping.
fn css_module_code(css: &str, exports: &std::collections::BTreeMap<String, String>) -> CompiledModule {
    let css = serde_json::to_string(css).unwrap_or_default();
    let exports = serde_json::to_string(exports).unwrap_or_else(|_| "{}".to_string());
    CompiledModule::code(format!("export const css = {css}\nexport default {exports}\n"))
}

/// Value expression for a custom block without `export default`.
///
/// JSON content is used as-is, anything else becomes a string literal.
fn custom_value(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return "{}".to_string();
    }
    if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return trimmed.to_string();
    }
    serde_json::to_string(code).unwrap_or_else(|_| "\"\"".to_string())
}

/// Re-emit a custom block as a merge function.
///
/// The block value is pushed onto `options[field][tag]`, so several blocks
/// of the same kind accumulate instead of overwriting each other.
pub fn wire_custom_block(code: &str, tag: &str, field: &str) -> String {
    let body = bind_default(code, CUSTOM_BINDING)
        .unwrap_or_else(|| format!("const {CUSTOM_BINDING} = {}", custom_value(code)));
    let field = serde_json::to_string(field).unwrap_or_default();
    let tag = serde_json::to_string(tag).unwrap_or_default();

    format!(
        "{body}\n\
         export default function (component) {{\n  \
           const options = component.options || component\n  \
           const blocks = options[{field}] || (options[{field}] = {{}})\n  \
           const list = blocks[{tag}] || (blocks[{tag}] = [])\n  \
           list.push({CUSTOM_BINDING})\n\
         }}\n"
    )
}
