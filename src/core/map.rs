//! Source maps for sections extracted from a document.
//!
//! A section's content is a verbatim slice of the document, so its map is a
//! pure line offset: generated line `n` maps to original line `start + n`.

use serde::{Deserialize, Serialize};

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Source map v3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(default)]
    pub sources_content: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Map `line_count` generated lines onto `source` starting at 0-based `start_line`.
    pub fn line_offset(filename: &str, source: &str, start_line: usize, line_count: usize) -> Self {
        let mut mappings = String::new();
        for line in 0..line_count {
            if line > 0 {
                mappings.push(';');
            }
            // [generated column, source index, source line delta, source column]
            mappings.push_str("AA");
            let delta = if line == 0 { start_line as i64 } else { 1 };
            encode_vlq(&mut mappings, delta);
            mappings.push('A');
        }

        Self {
            version: 3,
            file: None,
            sources: vec![filename.to_string()],
            sources_content: vec![source.to_string()],
            names: Vec::new(),
            mappings,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Append one base64 VLQ value.
fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// 0-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
}

/// 1-based `(line, column)` of a byte offset, column counted in chars.
pub fn position_of(source: &str, offset: usize) -> (u32, u32) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    (
        line_of(source, offset) as u32 + 1,
        source[line_start..offset].chars().count() as u32 + 1,
    )
}
