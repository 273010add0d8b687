//! Sub-request URL grammar.
//!
//! Every section of a document is addressable as
//!
//! ```text
//! <path>?vue&type=<script|template|style|custom>[&index=<n>][&src][&from=<encoded>][&<attr>[=<v>]]*&lang.<ext>
//! ```
//!
//! Parsing accepts any parameter order; [`block_request`] always emits the
//! order above so `lang.<ext>` stays the trailing segment.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

use super::block::{Attrs, AttrValue, Block, BlockKind};

/// Characters left intact by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Built-in query keys; attributes with these names never reach the URL.
const RESERVED_ATTRS: &[&str] = &["id", "index", "src", "type", "lang"];

static CSS_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(css|less|sass|scss|styl|stylus|pcss|postcss)($|\?)").expect("valid regex")
});

/// Parsed query part of a module id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VueQuery {
    /// Carries the sub-request marker.
    pub vue: bool,
    pub kind: Option<BlockKind>,
    pub index: Option<usize>,
    /// From the `lang.<ext>` key.
    pub lang: Option<String>,
    pub src: bool,
    pub raw: bool,
    pub scoped: bool,
    /// Decoded owning document for `src` sections.
    pub from: Option<String>,
    /// Remaining attribute parameters in order of appearance.
    pub attrs: Vec<(String, Option<String>)>,
}

/// A module id split into file and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VueRequest {
    pub filename: String,
    pub query: VueQuery,
}

impl VueRequest {
    /// Split an id at the first `?` and decode its parameters.
    pub fn parse(id: &str) -> Self {
        let (filename, raw_query) = id.split_once('?').unwrap_or((id, ""));
        let mut query = VueQuery::default();

        for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (decode(k), Some(decode(v))),
                None => (decode(pair), None),
            };
            match key.as_str() {
                "vue" => query.vue = true,
                "src" => query.src = true,
                "raw" => query.raw = true,
                "scoped" => query.scoped = true,
                "type" => query.kind = value.as_deref().map(BlockKind::from_tag),
                "index" => query.index = value.and_then(|v| v.parse().ok()),
                "from" => query.from = value,
                _ => {
                    if let Some(ext) = key.strip_prefix("lang.") {
                        query.lang = Some(ext.to_string());
                    } else {
                        query.attrs.push((key, value));
                    }
                }
            }
        }

        Self {
            filename: filename.to_string(),
            query,
        }
    }

    /// Main module: no sub-request type, or the script sub-request.
    pub fn is_main_like(&self) -> bool {
        matches!(self.query.kind, None | Some(BlockKind::Script))
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Percent-encode like `encodeURIComponent`.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Append non-reserved attributes and the `lang.<ext>` suffix.
///
/// The suffix uses the block's own `lang` unless `force_fallback` is set, in
/// which case `fallback` always wins (templates compile to JS whatever
/// their markup dialect).
pub fn attrs_to_query(attrs: &Attrs, fallback: &str, force_fallback: bool) -> String {
    let mut query = String::new();
    for (name, value) in attrs {
        if RESERVED_ATTRS.contains(&name.as_str()) {
            continue;
        }
        query.push('&');
        query.push_str(&encode_component(name));
        if let AttrValue::Value(v) = value
            && !v.is_empty()
        {
            query.push('=');
            query.push_str(&encode_component(v));
        }
    }

    let lang = match attrs.get("lang").and_then(AttrValue::as_str) {
        Some(lang) if !force_fallback => lang,
        _ => fallback,
    };
    query.push_str("&lang.");
    query.push_str(lang);
    query
}

/// Build the sub-request id for `block` of `document`.
///
/// Sections with `src` point at the external file and carry
/// `from=<document>` so the owning descriptor can be found.
pub fn block_request(document: &str, src_path: Option<&str>, block: &Block, index: Option<usize>) -> String {
    let base = src_path.unwrap_or(document);
    let mut id = format!("{base}?vue&type={}", encode_component(block.kind.as_str()));
    if let Some(index) = index {
        id.push_str(&format!("&index={index}"));
    }
    if src_path.is_some() {
        id.push_str("&src&from=");
        id.push_str(&encode_component(document));
    }

    let (fallback, force) = match &block.kind {
        BlockKind::Script => ("js", false),
        BlockKind::Template => ("js", true),
        BlockKind::Style => ("css", false),
        BlockKind::Custom(tag) => (tag.as_str(), false),
    };
    id.push_str(&attrs_to_query(&block.attrs, fallback, force));
    id
}

/// Whether a module id is a stylesheet request (plain or sub-request).
pub fn is_css_request(id: &str) -> bool {
    CSS_REQUEST.is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::test_block;

    #[test]
    fn test_parse_plain_file() {
        let req = VueRequest::parse("/src/App.vue");
        assert_eq!(req.filename, "/src/App.vue");
        assert!(!req.query.vue);
        assert!(req.is_main_like());
    }

    #[test]
    fn test_parse_style_request() {
        let req = VueRequest::parse("/src/App.vue?vue&type=style&index=1&scoped&lang.scss");
        assert!(req.query.vue);
        assert_eq!(req.query.kind, Some(BlockKind::Style));
        assert_eq!(req.query.index, Some(1));
        assert!(req.query.scoped);
        assert_eq!(req.query.lang.as_deref(), Some("scss"));
        assert!(!req.is_main_like());
    }

    #[test]
    fn test_parse_src_with_from() {
        let req = VueRequest::parse(
            "/src/t.html?vue&type=template&src&from=%2Fsrc%2FApp.vue&lang.js",
        );
        assert_eq!(req.filename, "/src/t.html");
        assert!(req.query.src);
        assert_eq!(req.query.from.as_deref(), Some("/src/App.vue"));
    }

    #[test]
    fn test_parse_custom_and_raw() {
        let req = VueRequest::parse("/a.vue?vue&type=i18n&index=0&locale=en&raw&lang.i18n");
        assert_eq!(req.query.kind, Some(BlockKind::Custom("i18n".into())));
        assert!(req.query.raw);
        assert_eq!(
            req.query.attrs,
            vec![("locale".to_string(), Some("en".to_string()))]
        );
    }

    #[test]
    fn test_script_request_is_main_like() {
        let req = VueRequest::parse("/a.vue?vue&type=script&lang.ts");
        assert!(req.is_main_like());
    }

    #[test]
    fn test_attrs_to_query_skips_reserved() {
        let block = test_block(
            BlockKind::Style,
            "",
            &[("lang", Some("scss")), ("scoped", None), ("index", Some("9"))],
        );
        assert_eq!(attrs_to_query(&block.attrs, "css", false), "&scoped&lang.scss");
    }

    #[test]
    fn test_attrs_to_query_forced_fallback() {
        let block = test_block(BlockKind::Template, "", &[("lang", Some("pug"))]);
        assert_eq!(attrs_to_query(&block.attrs, "js", true), "&lang.js");
        assert_eq!(attrs_to_query(&block.attrs, "js", false), "&lang.pug");
    }

    #[test]
    fn test_block_request_shapes() {
        let style = test_block(BlockKind::Style, "", &[("scoped", None)]);
        assert_eq!(
            block_request("/src/App.vue", None, &style, Some(0)),
            "/src/App.vue?vue&type=style&index=0&scoped&lang.css"
        );

        let template = test_block(BlockKind::Template, "", &[("src", Some("./t.html"))]);
        assert_eq!(
            block_request("/src/App.vue", Some("/src/t.html"), &template, None),
            "/src/t.html?vue&type=template&src&from=%2Fsrc%2FApp.vue&lang.js"
        );

        let custom = test_block(BlockKind::Custom("docs".into()), "", &[]);
        assert_eq!(
            block_request("/a.vue", None, &custom, Some(2)),
            "/a.vue?vue&type=docs&index=2&lang.docs"
        );
    }

    #[test]
    fn test_request_round_trip_through_parse() {
        let style = test_block(BlockKind::Style, "", &[("module", Some("x y"))]);
        let id = block_request("/a b.vue", None, &style, Some(3));
        let req = VueRequest::parse(&id);
        assert_eq!(req.filename, "/a b.vue");
        assert_eq!(req.query.index, Some(3));
        assert_eq!(
            req.query.attrs,
            vec![("module".to_string(), Some("x y".to_string()))]
        );
    }

    #[test]
    fn test_is_css_request() {
        assert!(is_css_request("/a.vue?vue&type=style&index=0&lang.css"));
        assert!(is_css_request("/main.scss"));
        assert!(is_css_request("/main.css?direct"));
        assert!(!is_css_request("/a.vue?vue&type=template&lang.js"));
        assert!(!is_css_request("/a.vue"));
    }
}
