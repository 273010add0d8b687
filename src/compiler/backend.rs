//! Compiler back ends.
//!
//! The dispatcher never compiles anything itself; it calls one of three
//! async traits. Defaults:
//!
//! - [`RuntimeTemplateCompiler`] - defers template compilation to the
//!   browser via `Vue.compileToFunctions` (requires the full Vue build)
//! - [`CssStyleTransformer`] - validates and prints plain CSS with
//!   lightningcss, exporting class names for `<style module>`
//! - [`OxcScriptCompiler`] - parses and re-emits script with oxc, reporting
//!   syntax errors with their position. Markup is kept as written; lowering
//!   it is left to the host's script transpiler
//!
//! Hosts with a real template compiler or preprocessors plug in their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lightningcss::css_modules::Config as CssModulesConfig;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::core::map::position_of;
use crate::core::{Block, Descriptor, SourceMap, VueRequest};
use crate::error::BackendError;

/// Code plus optional map returned by a back end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    pub code: String,
    pub map: Option<SourceMap>,
}

impl CompiledModule {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

// ============================================================================
// Template
// ============================================================================

pub struct TemplateInput<'a> {
    /// Loaded template text (from the section or its `src` file).
    pub source: &'a str,
    pub block: &'a Block,
    pub descriptor: &'a Descriptor,
    pub filename: &'a str,
    /// `[template] compiler_options` passed through untouched.
    pub compiler_options: &'a toml::Table,
    pub is_production: bool,
}

/// Markup compiler: template text to `render` / `staticRenderFns` exports.
#[async_trait]
pub trait TemplateCompiler: Send + Sync {
    async fn compile(&self, input: TemplateInput<'_>) -> Result<CompiledModule, BackendError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeTemplateCompiler;

#[async_trait]
impl TemplateCompiler for RuntimeTemplateCompiler {
    async fn compile(&self, input: TemplateInput<'_>) -> Result<CompiledModule, BackendError> {
        let template = serde_json::to_string(input.source.trim())
            .map_err(|e| BackendError::new(e.to_string()))?;
        let options = serde_json::to_string(input.compiler_options)
            .map_err(|e| BackendError::new(e.to_string()))?;

        Ok(CompiledModule::code(format!(
            "import Vue from \"vue\"\n\
             const {{ render, staticRenderFns }} = Vue.compileToFunctions({template}, {options})\n\
             export {{ render, staticRenderFns }}\n"
        )))
    }
}

// ============================================================================
// Style
// ============================================================================

pub struct StyleInput<'a> {
    pub source: &'a str,
    pub descriptor: &'a Descriptor,
    pub index: usize,
    pub filename: &'a str,
    pub is_production: bool,
}

impl StyleInput<'_> {
    pub fn block(&self) -> Option<&Block> {
        self.descriptor.styles.get(self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    pub module: CompiledModule,
    /// Whether the output was rewritten for `scoped`; a transformer that
    /// ignores scoping reports `false`.
    pub scoped: bool,
    /// Class-name mapping for `<style module>`.
    pub exports: Option<BTreeMap<String, String>>,
}

/// Style transformer: preprocessing, scoping and CSS modules.
#[async_trait]
pub trait StyleTransformer: Send + Sync {
    async fn transform(&self, input: StyleInput<'_>) -> Result<CompiledStyle, BackendError>;
}

/// Plain-CSS transformer. Preprocessor languages pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssStyleTransformer;

#[async_trait]
impl StyleTransformer for CssStyleTransformer {
    async fn transform(&self, input: StyleInput<'_>) -> Result<CompiledStyle, BackendError> {
        let block = input.block();
        let lang = block.and_then(|b| b.lang.as_deref());
        if !matches!(lang, None | Some("css" | "postcss" | "pcss")) {
            return Ok(CompiledStyle {
                module: CompiledModule::code(input.source),
                scoped: false,
                exports: None,
            });
        }

        let wants_modules = block.is_some_and(|b| b.module_name().is_some());
        let options = ParserOptions {
            filename: input.filename.to_string(),
            css_modules: wants_modules.then(CssModulesConfig::default),
            ..ParserOptions::default()
        };

        let stylesheet = StyleSheet::parse(input.source, options).map_err(|e| {
            let err = BackendError::new(e.kind.to_string());
            match e.loc {
                Some(loc) => err.at(loc.line + 1, loc.column),
                None => err,
            }
        })?;
        let printed = stylesheet
            .to_css(PrinterOptions {
                minify: input.is_production,
                ..PrinterOptions::default()
            })
            .map_err(|e| BackendError::new(e.kind.to_string()))?;

        let exports = printed.exports.map(|exports| {
            exports
                .into_iter()
                .map(|(class, export)| (class, export.name))
                .collect()
        });

        Ok(CompiledStyle {
            module: CompiledModule::code(printed.code),
            scoped: false,
            exports,
        })
    }
}

// ============================================================================
// Script
// ============================================================================

pub struct ScriptInput<'a> {
    pub code: &'a str,
    /// Real path or sub-request id; decides the dialect.
    pub id: &'a str,
}

/// Script / markup-in-script compiler.
#[async_trait]
pub trait ScriptCompiler: Send + Sync {
    async fn compile(&self, input: ScriptInput<'_>) -> Result<CompiledModule, BackendError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OxcScriptCompiler;

/// Dialect from the `lang.<ext>` query or the path extension.
pub fn source_type_for(id: &str) -> SourceType {
    let request = VueRequest::parse(id);
    let ext = request
        .query
        .lang
        .or_else(|| {
            request
                .filename
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
        })
        .unwrap_or_default();

    match ext.as_str() {
        "ts" => SourceType::ts(),
        "tsx" => SourceType::tsx(),
        // plain `.js` may carry markup (sniffed upstream)
        _ => SourceType::jsx(),
    }
}

#[async_trait]
impl ScriptCompiler for OxcScriptCompiler {
    async fn compile(&self, input: ScriptInput<'_>) -> Result<CompiledModule, BackendError> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, input.code, source_type_for(input.id)).parse();

        if let Some(error) = ret.errors.first() {
            let err = BackendError::new(error.to_string());
            let offset = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset());
            return Err(match offset {
                Some(offset) => {
                    let (line, column) = position_of(input.code, offset);
                    err.at(line, column)
                }
                None => err,
            });
        }

        Ok(CompiledModule::code(Codegen::new().build(&ret.program).code))
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// The three back ends a plugin dispatches to.
#[derive(Clone)]
pub struct Backends {
    pub template: Arc<dyn TemplateCompiler>,
    pub style: Arc<dyn StyleTransformer>,
    pub script: Arc<dyn ScriptCompiler>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            template: Arc::new(RuntimeTemplateCompiler),
            style: Arc::new(CssStyleTransformer),
            script: Arc::new(OxcScriptCompiler),
        }
    }
}
