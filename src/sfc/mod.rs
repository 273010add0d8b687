//! Section parsing and descriptor construction.
//!
//! Parsing itself sits behind [`SfcParser`] so hosts can swap in a full
//! markup parser; [`scan::BlockScanner`] is the built-in one.

pub mod jsx;
pub mod scan;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::DescriptorCache;
use crate::config::ResolvedOptions;
use crate::core::map::position_of;
use crate::core::{Block, Descriptor, descriptor_id};
use crate::error::PluginError;
use crate::log;
use crate::utils::path::slash;
use jsx::{MarkupDetector, RegexMarkupDetector, infer_script_lang};
use scan::BlockScanner;

/// Sections of a document, before id assignment.
#[derive(Debug, Clone, Default)]
pub struct SfcBlocks {
    pub script: Option<Block>,
    pub template: Option<Block>,
    pub styles: Vec<Block>,
    pub custom_blocks: Vec<Block>,
}

/// Malformed document structure, with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct SfcParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl SfcParseError {
    /// Build an error positioned at byte `offset` of `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = position_of(source, offset);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Inputs a parser needs besides the text.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions<'a> {
    pub filename: &'a str,
    /// Root that source-map `sources` are made relative to.
    pub source_root: &'a Path,
    pub need_map: bool,
}

/// Section Parser Adapter.
pub trait SfcParser: Send + Sync {
    fn parse(&self, source: &str, options: &ParseOptions<'_>) -> Result<SfcBlocks, SfcParseError>;
}

/// Turns document text into a stored [`Descriptor`].
#[derive(Clone)]
pub struct DescriptorBuilder {
    parser: Arc<dyn SfcParser>,
    detector: Arc<dyn MarkupDetector>,
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new(Arc::new(BlockScanner), Arc::new(RegexMarkupDetector::default()))
    }
}

impl DescriptorBuilder {
    pub fn new(parser: Arc<dyn SfcParser>, detector: Arc<dyn MarkupDetector>) -> Self {
        Self { parser, detector }
    }

    pub fn with_parser(mut self, parser: Arc<dyn SfcParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn MarkupDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn detector(&self) -> &dyn MarkupDetector {
        self.detector.as_ref()
    }

    /// Parse `source`, tag untagged markup-bearing scripts as `jsx`, assign
    /// the id and store the result as the current descriptor for `filename`.
    ///
    /// On a parse error nothing is stored, so a previously cached descriptor
    /// stays current.
    pub fn create_descriptor(
        &self,
        source: &str,
        filename: &str,
        options: &ResolvedOptions,
        cache: &DescriptorCache,
    ) -> Result<Arc<Descriptor>, PluginError> {
        let parse_options = ParseOptions {
            filename,
            source_root: &options.root,
            need_map: options.sourcemap,
        };
        let mut blocks = self
            .parser
            .parse(source, &parse_options)
            .map_err(|e| PluginError::Parse {
                path: filename.to_string(),
                line: e.line,
                column: e.column,
                message: e.message,
            })?;

        if let Some(script) = blocks.script.as_mut()
            && infer_script_lang(script, self.detector.as_ref())
        {
            log!("sfc"; "script in {} looks like jsx, tagged lang=\"jsx\"", filename);
        }

        let descriptor = Arc::new(Descriptor {
            id: descriptor_id(&options.root, Path::new(filename), source, options.is_production),
            filename: slash(Path::new(filename)),
            script: blocks.script,
            template: blocks.template,
            styles: blocks.styles,
            custom_blocks: blocks.custom_blocks,
        });

        cache.store(filename, Arc::clone(&descriptor));
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BlockKind;

    fn options() -> ResolvedOptions {
        ResolvedOptions::for_root("/proj")
    }

    #[test]
    fn test_parse_error_position() {
        let err = SfcParseError::at("ab\ncd\nef", 4, "bad");
        assert_eq!((err.line, err.column), (2, 2));
        assert_eq!(err.to_string(), "2:2: bad");
    }

    #[test]
    fn test_create_descriptor_stores_in_cache() {
        let cache = DescriptorCache::new();
        let builder = DescriptorBuilder::default();
        let source = "<template><p>{{ a }}</p></template>\n<script>export default {}</script>";

        let descriptor = builder
            .create_descriptor(source, "/proj/src/App.vue", &options(), &cache)
            .unwrap();

        assert_eq!(descriptor.filename, "/proj/src/App.vue");
        assert_eq!(descriptor.id.len(), 8);
        let cached = cache.get("/proj/src/App.vue").unwrap();
        assert!(Arc::ptr_eq(&cached, &descriptor));
    }

    #[test]
    fn test_create_descriptor_infers_jsx() {
        let cache = DescriptorCache::new();
        let builder = DescriptorBuilder::default();
        let source = "<script>export default { render() { return <div>hi</div> } }</script>";

        let descriptor = builder
            .create_descriptor(source, "/proj/Jsx.vue", &options(), &cache)
            .unwrap();
        assert_eq!(descriptor.script.as_ref().unwrap().lang.as_deref(), Some("jsx"));
    }

    #[test]
    fn test_create_descriptor_keeps_explicit_lang() {
        let cache = DescriptorCache::new();
        let builder = DescriptorBuilder::default();
        let source = "<script lang=\"tsx\">const a = <div/></script>";

        let descriptor = builder
            .create_descriptor(source, "/proj/Tsx.vue", &options(), &cache)
            .unwrap();
        assert_eq!(descriptor.script.as_ref().unwrap().lang.as_deref(), Some("tsx"));
    }

    #[test]
    fn test_parse_error_keeps_previous_descriptor() {
        let cache = DescriptorCache::new();
        let builder = DescriptorBuilder::default();
        let good = builder
            .create_descriptor("<template>a</template>", "/proj/A.vue", &options(), &cache)
            .unwrap();

        let err = builder
            .create_descriptor(
                "<template>a</template><template>b</template>",
                "/proj/A.vue",
                &options(),
                &cache,
            )
            .unwrap_err();
        assert!(matches!(err, PluginError::Parse { line: 1, .. }));
        assert!(Arc::ptr_eq(&cache.get("/proj/A.vue").unwrap(), &good));
    }

    #[test]
    fn test_custom_parser_is_used() {
        struct OnlyTemplate;
        impl SfcParser for OnlyTemplate {
            fn parse(&self, source: &str, _: &ParseOptions<'_>) -> Result<SfcBlocks, SfcParseError> {
                Ok(SfcBlocks {
                    template: Some(Block::new(
                        BlockKind::Template,
                        source,
                        Default::default(),
                        0..source.len(),
                    )),
                    ..Default::default()
                })
            }
        }

        let cache = DescriptorCache::new();
        let builder = DescriptorBuilder::default().with_parser(Arc::new(OnlyTemplate));
        let descriptor = builder
            .create_descriptor("anything", "/proj/B.vue", &options(), &cache)
            .unwrap();
        assert_eq!(descriptor.template.as_ref().unwrap().content, "anything");
    }
}
