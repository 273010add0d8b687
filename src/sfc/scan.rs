//! Top-level block scanner.
//!
//! Splits a component document into its top-level elements. Only the outer
//! structure is parsed: block contents are sliced verbatim, comments and
//! text between blocks are skipped.

use super::{ParseOptions, SfcBlocks, SfcParseError, SfcParser};
use crate::core::map::line_of;
use crate::core::{AttrValue, Attrs, Block, BlockKind, SourceMap};
use crate::utils::path::{relative_to, slash};
use std::path::Path;

/// Default [`SfcParser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockScanner;

impl SfcParser for BlockScanner {
    fn parse(&self, source: &str, options: &ParseOptions<'_>) -> Result<SfcBlocks, SfcParseError> {
        let mut blocks = SfcBlocks::default();
        let map_source = slash(&relative_to(options.source_root, Path::new(options.filename)));

        for raw in scan_blocks(source)? {
            let mut block = Block::new(
                BlockKind::from_tag(raw.tag),
                &source[raw.content.clone()],
                raw.attrs,
                raw.content.clone(),
            );

            // Template and custom blocks are not mapped
            if options.need_map && matches!(block.kind, BlockKind::Script | BlockKind::Style) {
                let lines = block.content.split('\n').count();
                let start = line_of(source, raw.content.start);
                block = block.with_map(SourceMap::line_offset(&map_source, source, start, lines));
            }

            match block.kind {
                BlockKind::Template if blocks.template.is_some() => {
                    return Err(SfcParseError::at(
                        source,
                        raw.start,
                        "Single file component can contain only one <template> element",
                    ));
                }
                BlockKind::Script if blocks.script.is_some() => {
                    return Err(SfcParseError::at(
                        source,
                        raw.start,
                        "Single file component can contain only one <script> element",
                    ));
                }
                BlockKind::Template => blocks.template = Some(block),
                BlockKind::Script => blocks.script = Some(block),
                BlockKind::Style => blocks.styles.push(block),
                BlockKind::Custom(_) => blocks.custom_blocks.push(block),
            }
        }

        Ok(blocks)
    }
}

/// A top-level element before classification.
#[derive(Debug, Clone)]
pub struct RawBlock<'a> {
    pub tag: &'a str,
    pub attrs: Attrs,
    /// Offset of the opening `<`.
    pub start: usize,
    /// Byte range of the inner content.
    pub content: std::ops::Range<usize>,
}

struct OpenTag<'a> {
    name: &'a str,
    attrs: Attrs,
    /// Offset just past the closing `>`.
    end: usize,
    self_closing: bool,
}

/// Scan all top-level elements of `source` in document order.
pub fn scan_blocks(source: &str) -> Result<Vec<RawBlock<'_>>, SfcParseError> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(rel) = source[pos..].find('<') {
        let at = pos + rel;
        let rest = &source[at..];

        if rest.starts_with("<!--") {
            pos = rest.find("-->").map_or(source.len(), |end| at + end + 3);
            continue;
        }
        if rest.starts_with("</") || rest.starts_with("<!") || rest.starts_with("<?") {
            pos = rest.find('>').map_or(source.len(), |end| at + end + 1);
            continue;
        }

        let Some(tag) = parse_open_tag(source, at)? else {
            pos = at + 1;
            continue;
        };

        if tag.self_closing {
            blocks.push(RawBlock {
                tag: tag.name,
                attrs: tag.attrs,
                start: at,
                content: tag.end..tag.end,
            });
            pos = tag.end;
            continue;
        }

        let Some((close_start, close_end)) = find_close(source, tag.name, tag.end)? else {
            return Err(SfcParseError::at(
                source,
                at,
                format!("Element <{}> is missing end tag", tag.name),
            ));
        };

        blocks.push(RawBlock {
            tag: tag.name,
            attrs: tag.attrs,
            start: at,
            content: tag.end..close_start,
        });
        pos = close_end;
    }

    Ok(blocks)
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

/// Parse an opening tag at `at` (which points at `<`).
///
/// Returns `None` when the `<` does not start an element name.
fn parse_open_tag(source: &str, at: usize) -> Result<Option<OpenTag<'_>>, SfcParseError> {
    let bytes = source.as_bytes();
    let name_start = at + 1;
    if !bytes.get(name_start).is_some_and(u8::is_ascii_alphabetic) {
        return Ok(None);
    }
    let mut i = name_start;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = &source[name_start..i];
    let mut attrs = Attrs::new();

    loop {
        while i < bytes.len() && is_space(bytes[i]) {
            i += 1;
        }
        match bytes.get(i) {
            None => {
                return Err(SfcParseError::at(
                    source,
                    at,
                    format!("Unclosed start tag <{name}>"),
                ));
            }
            Some(b'>') => {
                return Ok(Some(OpenTag {
                    name,
                    attrs,
                    end: i + 1,
                    self_closing: false,
                }));
            }
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                return Ok(Some(OpenTag {
                    name,
                    attrs,
                    end: i + 2,
                    self_closing: true,
                }));
            }
            Some(b'/') => {
                i += 1;
                continue;
            }
            Some(_) => {}
        }

        let attr_start = i;
        while i < bytes.len() && !is_space(bytes[i]) && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let attr_name = source[attr_start..i].to_string();

        let mut j = i;
        while j < bytes.len() && is_space(bytes[j]) {
            j += 1;
        }
        if bytes.get(j) != Some(&b'=') {
            attrs.insert(attr_name, AttrValue::Flag);
            continue;
        }

        j += 1;
        while j < bytes.len() && is_space(bytes[j]) {
            j += 1;
        }
        let value = match bytes.get(j) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = j + 1;
                let Some(len) = source[value_start..].find(quote as char) else {
                    return Err(SfcParseError::at(
                        source,
                        attr_start,
                        format!("Unclosed attribute value for `{attr_name}`"),
                    ));
                };
                i = value_start + len + 1;
                &source[value_start..value_start + len]
            }
            _ => {
                let value_start = j;
                while j < bytes.len() && !is_space(bytes[j]) && bytes[j] != b'>' {
                    j += 1;
                }
                i = j;
                &source[value_start..j]
            }
        };
        attrs.insert(attr_name, AttrValue::Value(value.to_string()));
    }
}

/// Whether `source[at..]` starts `<name` or `</name` as a whole tag name.
fn tag_name_at(source: &str, at: usize, name: &str) -> bool {
    source[at..].starts_with(name)
        && source
            .as_bytes()
            .get(at + name.len())
            .is_none_or(|&b| !is_name_byte(b))
}

/// Find the matching `</name>` after `from`.
///
/// `script` and `style` hold raw text, so the first closing tag wins. Other
/// elements track nesting of same-named tags.
fn find_close(source: &str, name: &str, from: usize) -> Result<Option<(usize, usize)>, SfcParseError> {
    let raw_text = matches!(name, "script" | "style");
    let mut depth = 0usize;
    let mut pos = from;

    while let Some(rel) = source[pos..].find('<') {
        let at = pos + rel;

        if source[at..].starts_with("</") && tag_name_at(source, at + 2, name) {
            let Some(gt) = source[at..].find('>') else {
                return Ok(None);
            };
            if depth == 0 {
                return Ok(Some((at, at + gt + 1)));
            }
            depth -= 1;
            pos = at + gt + 1;
            continue;
        }

        if !raw_text && tag_name_at(source, at + 1, name)
            && let Some(nested) = parse_open_tag(source, at)?
        {
            if !nested.self_closing {
                depth += 1;
            }
            pos = nested.end;
            continue;
        }

        pos = at + 1;
    }

    Ok(None)
}
