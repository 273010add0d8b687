//! Main-module synthesis.
//!
//! A whole document compiles to a module that imports each section through
//! its sub-request id, hands the pieces to the normalizer runtime and
//! default-exports the component.

use std::fmt::Write;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::ast::ast::Statement;
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType};

use super::TransformContext;
use super::backend::CompiledModule;
use crate::core::{Block, Descriptor, block_request};
use crate::debug;
use crate::error::PluginError;
use crate::router::{COMPONENT_NORMALIZER, HOT_RELOAD};
use crate::utils::path::{relative_to, resolve_sibling, slash};

/// Binding the script's default export is rewritten to.
const SCRIPT_BINDING: &str = "__vue2_script";

/// Rebind the default export of `code` to `const <binding>`.
///
/// Covers `export default <value>` and `export { x as default }`; only the
/// export itself is rewritten. `None` when the module has no default export.
pub fn bind_default(code: &str, binding: &str) -> Option<String> {
    let allocator = Allocator::default();
    let program = Parser::new(&allocator, code, SourceType::mjs()).parse().program;

    for stmt in &program.body {
        match stmt {
            Statement::ExportDefaultDeclaration(decl) => {
                let start = decl.span.start as usize;
                let value = decl.declaration.span().start as usize;
                return Some(format!("{}const {binding} = {}", &code[..start], &code[value..]));
            }
            Statement::ExportNamedDeclaration(decl) if decl.source.is_none() => {
                let Some(pos) = decl
                    .specifiers
                    .iter()
                    .position(|s| s.exported.name().as_str() == "default")
                else {
                    continue;
                };
                let local = decl.specifiers[pos].local.name().as_str();
                let rest: Vec<&str> = decl
                    .specifiers
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != pos)
                    .map(|(_, s)| s.span.source_text(code))
                    .collect();
                let kept = if rest.is_empty() {
                    String::new()
                } else {
                    format!("export {{ {} }}", rest.join(", "))
                };
                let (start, end) = (decl.span.start as usize, decl.span.end as usize);
                return Some(format!(
                    "{}{kept}{}\nconst {binding} = {local}",
                    &code[..start],
                    &code[end..]
                ));
            }
            _ => {}
        }
    }
    None
}

/// Rewrite the default export into `const <binding> = <value>`.
///
/// Code without a default export keeps its body and binds an empty object.
pub fn rewrite_default(code: &str, binding: &str) -> String {
    bind_default(code, binding).unwrap_or_else(|| format!("{code}\nconst {binding} = {{}}"))
}

#[inline]
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Resolved `src` path of a section, slash-normalized.
fn src_path(document: &str, block: &Block) -> Option<String> {
    let src = block.src.as_deref()?;
    Some(slash(&resolve_sibling(Path::new(document), src)))
}

fn request(document: &str, block: &Block, index: Option<usize>) -> String {
    block_request(document, src_path(document, block).as_deref(), block, index)
}

/// Compile a whole document into its main module.
///
/// Parsing failures surface as [`PluginError::Parse`]; the previously
/// cached descriptor, if any, stays current.
pub fn transform_main(code: &str, filename: &str, ctx: &TransformContext<'_>) -> Result<CompiledModule, PluginError> {
    let options = ctx.options;
    let descriptor = ctx
        .builder
        .create_descriptor(code, filename, options, ctx.cache)?;
    let document = descriptor.filename.as_str();

    let (script_code, map) = gen_script(&descriptor, document);
    let mut out = script_code;
    out.push('\n');
    out.push_str(&gen_template(&descriptor, document));
    out.push_str("\nconst cssModules = {}");
    out.push_str(&gen_styles(&descriptor, document));

    // bare id; the normalizer prefixes `data-v-`
    let scope_id = if descriptor.has_scoped_style() {
        js_string(&descriptor.id)
    } else {
        "null".to_string()
    };
    let _ = write!(
        out,
        "\n/* normalize component */\n\
         import __vue2_normalizer from {normalizer}\n\
         var __component__ = /*#__PURE__*/__vue2_normalizer(\n  \
           {SCRIPT_BINDING},\n  \
           __vue2_render,\n  \
           __vue2_staticRenderFns,\n  \
           {functional},\n  \
           __vue2_injectStyles,\n  \
           {scope_id},\n  \
           null,\n  \
           null\n\
         )\n\
         \n\
         function __vue2_injectStyles (context) {{\n  \
           for (let o in cssModules) {{\n    \
             this[o] = cssModules[o]\n  \
           }}\n\
         }}\n",
        normalizer = js_string(COMPONENT_NORMALIZER),
        functional = descriptor.is_functional(),
    );

    out.push_str(&gen_custom_blocks(&descriptor, document));

    if !options.is_production {
        let file = slash(&relative_to(&options.root, Path::new(document)));
        let _ = write!(out, "\n__component__.options.__file = {}", js_string(&file));
    }

    if options.hot_reload() {
        out.push_str(&gen_hot_reload(&descriptor));
    }

    out.push_str("\nexport default /*#__PURE__*/(function () { return __component__.exports })()\n");

    debug!("transform"; "main module for {} ({} styles, {} custom blocks)",
        document, descriptor.styles.len(), descriptor.custom_blocks.len());

    Ok(CompiledModule { code: out, map })
}

/// Script is inlined when it is plain JS without `src`; otherwise it is
/// imported (and its named exports re-exported) through a sub-request.
fn gen_script(descriptor: &Descriptor, document: &str) -> (String, Option<crate::core::SourceMap>) {
    let Some(script) = &descriptor.script else {
        return (format!("const {SCRIPT_BINDING} = {{}}"), None);
    };

    let plain = matches!(script.lang.as_deref(), None | Some("js"));
    if plain && script.src.is_none() {
        return (rewrite_default(&script.content, SCRIPT_BINDING), script.map.clone());
    }

    let req = js_string(&request(document, script, None));
    (
        format!("import {SCRIPT_BINDING} from {req}\nexport * from {req}"),
        None,
    )
}

fn gen_template(descriptor: &Descriptor, document: &str) -> String {
    match &descriptor.template {
        None => "let __vue2_render, __vue2_staticRenderFns".to_string(),
        Some(template) => format!(
            "import {{ render as __vue2_render, staticRenderFns as __vue2_staticRenderFns }} from {}",
            js_string(&request(document, template, None))
        ),
    }
}

fn gen_styles(descriptor: &Descriptor, document: &str) -> String {
    let mut code = String::new();
    for (i, style) in descriptor.styles.iter().enumerate() {
        let req = js_string(&request(document, style, Some(i)));
        match style.module_name() {
            Some(name) => {
                let _ = write!(
                    code,
                    "\nimport style{i} from {req}\ncssModules[{}] = style{i}",
                    js_string(name)
                );
            }
            None => {
                let _ = write!(code, "\nimport {req}");
            }
        }
    }
    code
}

fn gen_custom_blocks(descriptor: &Descriptor, document: &str) -> String {
    let mut code = String::new();
    for (i, block) in descriptor.custom_blocks.iter().enumerate() {
        let req = js_string(&request(document, block, Some(i)));
        let _ = write!(
            code,
            "import block{i} from {req}\n\
             if (typeof block{i} === 'function') block{i}(__component__)\n"
        );
    }
    code
}

fn gen_hot_reload(descriptor: &Descriptor) -> String {
    let id = js_string(&descriptor.id);
    let method = if descriptor.is_functional() {
        "rerender"
    } else {
        "reload"
    };
    format!(
        "\n/* hot reload */\n\
         import __VUE_HMR_RUNTIME__ from {runtime}\n\
         import vue from \"vue\"\n\
         __VUE_HMR_RUNTIME__.install(vue)\n\
         if (__VUE_HMR_RUNTIME__.compatible) {{\n  \
           if (!__VUE_HMR_RUNTIME__.isRecorded({id})) {{\n    \
             __VUE_HMR_RUNTIME__.createRecord({id}, __component__.options)\n  \
           }}\n  \
           import.meta.hot.accept((update) => {{\n    \
             __VUE_HMR_RUNTIME__.{method}({id}, update.default)\n  \
           }})\n\
         }} else {{\n  \
           console.log(\"The hmr is not compatible.\")\n\
         }}\n",
        runtime = js_string(HOT_RELOAD),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DescriptorCache;
    use crate::compiler::backend::Backends;
    use crate::compiler::filter::ModuleFilter;
    use crate::config::ResolvedOptions;
    use crate::sfc::DescriptorBuilder;

    struct Fixture {
        options: ResolvedOptions,
        cache: DescriptorCache,
        builder: DescriptorBuilder,
        backends: Backends,
        filter: ModuleFilter,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                options: ResolvedOptions::for_root("/p"),
                cache: DescriptorCache::new(),
                builder: DescriptorBuilder::default(),
                backends: Backends::default(),
                filter: ModuleFilter::default(),
            }
        }

        fn ctx(&self) -> TransformContext<'_> {
            TransformContext {
                options: &self.options,
                cache: &self.cache,
                builder: &self.builder,
                backends: &self.backends,
                filter: &self.filter,
            }
        }

        fn main(&self, code: &str) -> String {
            transform_main(code, "/p/src/App.vue", &self.ctx()).unwrap().code
        }
    }

    #[test]
    fn test_rewrite_default() {
        assert_eq!(
            rewrite_default("export default { a: 1 }", "__s"),
            "const __s = { a: 1 }"
        );
        assert_eq!(
            rewrite_default("import x from 'x'\n  export default x", "__s"),
            "import x from 'x'\n  const __s = x"
        );
        assert_eq!(rewrite_default("const a = 1", "__s"), "const a = 1\nconst __s = {}");
    }

    #[test]
    fn test_rewrite_default_without_whitespace() {
        assert_eq!(
            rewrite_default("export default{ name: 'A' }", "__s"),
            "const __s = { name: 'A' }"
        );
        assert_eq!(
            rewrite_default("import x from 'x'; export default x", "__s"),
            "import x from 'x'; const __s = x"
        );
    }

    #[test]
    fn test_rewrite_default_leaves_other_text() {
        let code = "const s = 'export default 1'\nexport default { s }";
        let out = rewrite_default(code, "__s");
        assert_eq!(out, "const s = 'export default 1'\nconst __s = { s }");
        assert_eq!(out.matches("export default").count(), 1);
    }

    #[test]
    fn test_rewrite_default_specifier() {
        assert_eq!(
            rewrite_default("const a = {}\nexport { a as default }", "__s"),
            "const a = {}\n\nconst __s = a"
        );
        assert_eq!(
            rewrite_default("const a = {}, b = 1\nexport { b, a as default }", "__s"),
            "const a = {}, b = 1\nexport { b }\nconst __s = a"
        );
        assert!(bind_default("export const a = 1", "__s").is_none());
    }

    #[test]
    fn test_main_single_default_export() {
        let f = Fixture::new();
        let code = f.main("<template><p/></template><script>import x from 'x'; export default{ name: 'A' }</script>");
        assert!(code.contains("import x from 'x'; const __vue2_script = { name: 'A' }"));
        assert_eq!(code.matches("export default").count(), 1);
    }

    #[test]
    fn test_main_inlines_plain_script() {
        let f = Fixture::new();
        let code = f.main("<template><p/></template><script>export default { name: 'A' }</script>");
        assert!(code.contains("const __vue2_script = { name: 'A' }"));
        assert!(code.contains(
            r#"import { render as __vue2_render, staticRenderFns as __vue2_staticRenderFns } from "/p/src/App.vue?vue&type=template&lang.js""#
        ));
        assert!(code.contains(r#"import __vue2_normalizer from "\u0000/vite/vueComponentNormalizer""#));
        assert!(code.contains(r#"__component__.options.__file = "src/App.vue""#));
        assert!(code.ends_with("export default /*#__PURE__*/(function () { return __component__.exports })()\n"));
        assert!(f.cache.try_get("/p/src/App.vue").is_some());
    }

    #[test]
    fn test_main_imports_typed_script() {
        let f = Fixture::new();
        let code = f.main("<script lang=\"ts\">export default {}</script>");
        let req = r#""/p/src/App.vue?vue&type=script&lang.ts""#;
        assert!(code.contains(&format!("import __vue2_script from {req}")));
        assert!(code.contains(&format!("export * from {req}")));
        assert!(code.contains("let __vue2_render, __vue2_staticRenderFns"));
    }

    #[test]
    fn test_main_without_script() {
        let f = Fixture::new();
        let code = f.main("<template><p/></template>");
        assert!(code.starts_with("const __vue2_script = {}"));
    }

    #[test]
    fn test_main_styles_and_scope() {
        let f = Fixture::new();
        let code = f.main(
            "<template><p/></template>\n<style scoped>.a{}</style>\n<style module>.b{}</style>",
        );
        assert!(code.contains(r#"import "/p/src/App.vue?vue&type=style&index=0&scoped&lang.css""#));
        assert!(code.contains(r#"import style1 from "/p/src/App.vue?vue&type=style&index=1&module&lang.css""#));
        assert!(code.contains(r#"cssModules["$style"] = style1"#));

        let id = f.cache.get("/p/src/App.vue").unwrap().id.clone();
        assert!(code.contains(&format!("  \"{id}\",\n  null,\n  null\n)")));
        // the normalizer runtime adds the attribute prefix
        assert!(!code.contains("data-v-"));
    }

    #[test]
    fn test_main_unscoped_passes_null_scope() {
        let f = Fixture::new();
        let code = f.main("<template><p/></template><style>.a{}</style>");
        assert!(code.contains("__vue2_injectStyles,\n  null,\n  null,\n  null\n)"));
    }

    #[test]
    fn test_main_src_sections_link_back() {
        let f = Fixture::new();
        let code = f.main("<template src=\"./tpl.html\"></template><style src=\"../a.css\"></style>");
        assert!(code.contains(r#""/p/src/tpl.html?vue&type=template&src&from=%2Fp%2Fsrc%2FApp.vue&lang.js""#));
        assert!(code.contains(r#""/p/a.css?vue&type=style&index=0&src&from=%2Fp%2Fsrc%2FApp.vue&lang.css""#));
    }

    #[test]
    fn test_main_custom_blocks() {
        let f = Fixture::new();
        let code = f.main("<template><p/></template><i18n>{}</i18n><docs>x</docs>");
        assert!(code.contains(r#"import block0 from "/p/src/App.vue?vue&type=i18n&index=0&lang.i18n""#));
        assert!(code.contains("if (typeof block1 === 'function') block1(__component__)"));
    }

    #[test]
    fn test_main_functional_template() {
        let mut f = Fixture::new();
        f.options.dev_server = true;
        let code = f.main("<template functional><p/></template>");
        assert!(code.contains("  true,\n  __vue2_injectStyles"));
        assert!(code.contains("__VUE_HMR_RUNTIME__.rerender("));
    }

    #[test]
    fn test_main_hot_reload_only_with_dev_server() {
        let mut f = Fixture::new();
        let plain = f.main("<template><p/></template>");
        assert!(!plain.contains("__VUE_HMR_RUNTIME__"));

        f.options.dev_server = true;
        let dev = f.main("<template><p/></template>");
        assert!(dev.contains(r#"import __VUE_HMR_RUNTIME__ from "\u0000/vite/vueHotReload""#));
        assert!(dev.contains("__VUE_HMR_RUNTIME__.reload("));

        f.options.is_production = true;
        let prod = f.main("<template><p/></template>");
        assert!(!prod.contains("__VUE_HMR_RUNTIME__"));
        assert!(!prod.contains("__file"));
    }

    #[test]
    fn test_main_parse_error() {
        let f = Fixture::new();
        let err = transform_main("<template></template><template></template>", "/p/A.vue", &f.ctx())
            .unwrap_err();
        assert!(matches!(err, PluginError::Parse { .. }));
        assert!(f.cache.try_get("/p/A.vue").is_none());
    }

    #[test]
    fn test_main_keeps_inline_script_map() {
        let f = Fixture::new();
        let out = transform_main("<script>\nexport default {}\n</script>", "/p/B.vue", &f.ctx()).unwrap();
        assert!(out.map.is_some());
    }
}
