//! Parsed document sections.
//!
//! A component decomposes into at most one script, at most one template,
//! and ordered style / custom sections. All four kinds share [`Block`]; the
//! kind tag carries the element name for custom sections.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Serialize, Serializer};

use super::map::SourceMap;

/// Kind of a section, taken from its top-level element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Script,
    Template,
    Style,
    /// Any other top-level element (`<i18n>`, `<docs>`, ...)
    Custom(String),
}

impl BlockKind {
    /// Classify a top-level element name.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "script" => Self::Script,
            "template" => Self::Template,
            "style" => Self::Style,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The `type=` value used in sub-request URLs.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Script => "script",
            Self::Template => "template",
            Self::Style => "style",
            Self::Custom(tag) => tag,
        }
    }

    /// Styles and custom blocks are addressed by position.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Style | Self::Custom(_))
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BlockKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Attribute value on a section's opening tag.
///
/// `<style scoped>` carries a [`AttrValue::Flag`], `<style lang="scss">` a
/// [`AttrValue::Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Flag,
    Value(String),
}

impl AttrValue {
    /// String value, `None` for bare flags.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Flag => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flag => serializer.serialize_bool(true),
            Self::Value(v) => serializer.serialize_str(v),
        }
    }
}

/// Attribute mapping. Ordered so equality and URL generation are stable.
pub type Attrs = BTreeMap<String, AttrValue>;

/// One parsed section of a component document.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
    pub attrs: Attrs,
    pub lang: Option<String>,
    /// External file reference; when set, `content` is not authoritative.
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<SourceMap>,
    /// Only ever true for style sections.
    pub scoped: bool,
    /// Byte range of `content` within the document.
    pub range: Range<usize>,
}

impl Block {
    /// Build a block, deriving `lang`, `src` and `scoped` from its attributes.
    pub fn new(kind: BlockKind, content: impl Into<String>, attrs: Attrs, range: Range<usize>) -> Self {
        let lang = attrs.get("lang").and_then(AttrValue::as_str).map(str::to_string);
        let src = attrs.get("src").and_then(AttrValue::as_str).map(str::to_string);
        let scoped = kind == BlockKind::Style && attrs.contains_key("scoped");
        Self {
            kind,
            content: content.into(),
            attrs,
            lang,
            src,
            map: None,
            scoped,
            range,
        }
    }

    pub fn with_map(mut self, map: SourceMap) -> Self {
        self.map = Some(map);
        self
    }

    #[inline]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Set the language tag on both the attribute map and `lang`.
    pub fn set_lang(&mut self, lang: &str) {
        self.attrs
            .insert("lang".to_string(), AttrValue::Value(lang.to_string()));
        self.lang = Some(lang.to_string());
    }

    /// CSS-modules binding name for `<style module>` / `<style module="name">`.
    pub fn module_name(&self) -> Option<&str> {
        match self.attrs.get("module")? {
            AttrValue::Flag => Some("$style"),
            AttrValue::Value(name) => Some(name),
        }
    }

    /// `<template functional>`
    #[inline]
    pub fn is_functional(&self) -> bool {
        self.kind == BlockKind::Template && self.has_attr("functional")
    }

    /// Section equality used by the hot-update differ.
    ///
    /// Blocks pointing at the same external `src` are equal regardless of
    /// content, since the external file triggers its own update. Otherwise
    /// content and the full attribute mapping must match.
    pub fn same_as(&self, other: &Block) -> bool {
        if let (Some(a), Some(b)) = (&self.src, &other.src)
            && a == b
        {
            return true;
        }
        self.content == other.content && self.attrs == other.attrs
    }
}

/// Nullable section equality: both absent is equal, one absent is not.
pub fn blocks_equal(a: Option<&Block>, b: Option<&Block>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_as(b),
        _ => false,
    }
}

#[cfg(test)]
pub(crate) fn test_block(kind: BlockKind, content: &str, attrs: &[(&str, Option<&str>)]) -> Block {
    let attrs = attrs
        .iter()
        .map(|(k, v)| {
            let value = v.map_or(AttrValue::Flag, |v| AttrValue::Value(v.to_string()));
            (k.to_string(), value)
        })
        .collect();
    Block::new(kind, content, attrs, 0..content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_from_tag() {
        assert_eq!(BlockKind::from_tag("script"), BlockKind::Script);
        assert_eq!(BlockKind::from_tag("template"), BlockKind::Template);
        assert_eq!(BlockKind::from_tag("style"), BlockKind::Style);
        assert_eq!(
            BlockKind::from_tag("i18n"),
            BlockKind::Custom("i18n".to_string())
        );
        assert!(BlockKind::Style.is_indexed());
        assert!(!BlockKind::Template.is_indexed());
    }

    #[test]
    fn test_block_derives_fields_from_attrs() {
        let style = test_block(
            BlockKind::Style,
            "a{}",
            &[("lang", Some("scss")), ("scoped", None)],
        );
        assert_eq!(style.lang.as_deref(), Some("scss"));
        assert!(style.scoped);
        assert!(style.src.is_none());

        // `scoped` on a non-style block is just an attribute
        let template = test_block(BlockKind::Template, "<p/>", &[("scoped", None)]);
        assert!(!template.scoped);
    }

    #[test]
    fn test_equality_nulls() {
        let a = test_block(BlockKind::Script, "x", &[]);
        assert!(blocks_equal(None, None));
        assert!(!blocks_equal(Some(&a), None));
        assert!(!blocks_equal(None, Some(&a)));
    }

    #[test]
    fn test_equality_reflexive_and_symmetric() {
        let a = test_block(BlockKind::Style, "a{}", &[("scoped", None)]);
        let b = test_block(BlockKind::Style, "a{}", &[]);
        assert!(blocks_equal(Some(&a), Some(&a)));
        assert_eq!(
            blocks_equal(Some(&a), Some(&b)),
            blocks_equal(Some(&b), Some(&a))
        );
        assert!(!blocks_equal(Some(&a), Some(&b)));
    }

    #[test]
    fn test_equality_same_src_ignores_content() {
        let a = test_block(BlockKind::Style, "old", &[("src", Some("./a.css"))]);
        let b = test_block(BlockKind::Style, "new", &[("src", Some("./a.css"))]);
        assert!(blocks_equal(Some(&a), Some(&b)));

        let c = test_block(BlockKind::Style, "old", &[("src", Some("./c.css"))]);
        assert!(!blocks_equal(Some(&a), Some(&c)));
    }

    #[test]
    fn test_equality_attr_values_compared() {
        let a = test_block(BlockKind::Style, "a{}", &[("lang", Some("css"))]);
        let b = test_block(BlockKind::Style, "a{}", &[("lang", Some("scss"))]);
        assert!(!blocks_equal(Some(&a), Some(&b)));
    }

    #[test]
    fn test_module_name() {
        let plain = test_block(BlockKind::Style, "", &[("module", None)]);
        assert_eq!(plain.module_name(), Some("$style"));
        let named = test_block(BlockKind::Style, "", &[("module", Some("classes"))]);
        assert_eq!(named.module_name(), Some("classes"));
        let none = test_block(BlockKind::Style, "", &[]);
        assert_eq!(none.module_name(), None);
    }

    #[test]
    fn test_set_lang_updates_attrs() {
        let mut script = test_block(BlockKind::Script, "x", &[]);
        script.set_lang("jsx");
        assert_eq!(script.lang.as_deref(), Some("jsx"));
        assert_eq!(
            script.attrs.get("lang"),
            Some(&AttrValue::Value("jsx".to_string()))
        );
    }
}
