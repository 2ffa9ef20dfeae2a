//! Source Map v3 generation.
//!
//! Mappings are collected in generation order and serialized with Base64 VLQ
//! deltas. Declaration maps reference the original module paths and embed their
//! content so a consumer can navigate back without the sources on disk.

use serde::Serialize;

/// A single mapping between generated and original positions (all zero-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_index: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name_index: Option<u32>,
}

/// Base64 VLQ encoding as used by the `mappings` field.
pub mod vlq {
    const BASE64_CHARS: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    const VLQ_BASE_SHIFT: u32 = 5;
    const VLQ_BASE: i64 = 1 << VLQ_BASE_SHIFT;
    const VLQ_BASE_MASK: i64 = VLQ_BASE - 1;
    const VLQ_CONTINUATION_BIT: i64 = VLQ_BASE;

    /// Append the VLQ encoding of `value` to `out`.
    pub fn encode_into(value: i32, out: &mut String) {
        let mut vlq: i64 = if value < 0 {
            ((-(value as i64)) << 1) | 1
        } else {
            (value as i64) << 1
        };
        loop {
            let mut digit = vlq & VLQ_BASE_MASK;
            vlq >>= VLQ_BASE_SHIFT;
            if vlq > 0 {
                digit |= VLQ_CONTINUATION_BIT;
            }
            out.push(BASE64_CHARS[digit as usize] as char);
            if vlq == 0 {
                break;
            }
        }
    }

    #[must_use]
    pub fn encode(value: i32) -> String {
        let mut out = String::new();
        encode_into(value, &mut out);
        out
    }

    /// Decode one VLQ value, returning it with the number of bytes consumed.
    #[must_use]
    pub fn decode(input: &str) -> Option<(i32, usize)> {
        let mut result: i64 = 0;
        let mut shift = 0u32;
        for (idx, byte) in input.bytes().enumerate() {
            let digit = BASE64_CHARS.iter().position(|&c| c == byte)? as i64;
            result += (digit & VLQ_BASE_MASK) << shift;
            if digit & VLQ_CONTINUATION_BIT == 0 {
                let negative = result & 1 == 1;
                let magnitude = (result >> 1) as i32;
                return Some((if negative { -magnitude } else { magnitude }, idx + 1));
            }
            shift += VLQ_BASE_SHIFT;
            if shift > 60 {
                return None;
            }
        }
        None
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap<'a> {
    version: u32,
    file: &'a str,
    source_root: &'a str,
    sources: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    sources_content: Option<Vec<Option<&'a str>>>,
    names: &'a [String],
    mappings: String,
}

/// Collects sources, names and mappings for one generated file.
#[derive(Debug, Default)]
pub struct SourceMapGenerator {
    file: String,
    source_root: String,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    #[must_use]
    pub fn new(file: String) -> Self {
        SourceMapGenerator {
            file,
            ..Default::default()
        }
    }

    pub fn set_source_root(&mut self, root: String) {
        self.source_root = root;
    }

    /// Register a source, returning its index. Registering the same path twice
    /// returns the existing index.
    pub fn add_source(&mut self, source: String) -> u32 {
        if let Some(idx) = self.sources.iter().position(|s| *s == source) {
            return idx as u32;
        }
        self.sources.push(source);
        self.sources_content.push(None);
        (self.sources.len() - 1) as u32
    }

    pub fn add_source_with_content(&mut self, source: String, content: String) -> u32 {
        let idx = self.add_source(source);
        self.sources_content[idx as usize] = Some(content);
        idx
    }

    pub fn add_name(&mut self, name: String) -> u32 {
        if let Some(idx) = self.names.iter().position(|n| *n == name) {
            return idx as u32;
        }
        self.names.push(name);
        (self.names.len() - 1) as u32
    }

    pub fn add_simple_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.add_mapping(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            name_index: None,
        });
    }

    pub fn add_named_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
        name_index: u32,
    ) {
        self.add_mapping(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            name_index: Some(name_index),
        });
    }

    pub fn add_mapping(&mut self, mapping: Mapping) {
        // Skip exact duplicates of the previous segment.
        if self.mappings.last() == Some(&mapping) {
            return;
        }
        self.mappings.push(mapping);
    }

    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn serialize_mappings(&self) -> String {
        let mut sorted = self.mappings.clone();
        sorted.sort_by_key(|m| (m.generated_line, m.generated_column));

        let mut out = String::with_capacity(sorted.len() * 6);
        let mut line = 0u32;
        let mut prev_column = 0i32;
        let mut prev_source = 0i32;
        let mut prev_original_line = 0i32;
        let mut prev_original_column = 0i32;
        let mut prev_name = 0i32;
        let mut first_in_line = true;

        for mapping in &sorted {
            while line < mapping.generated_line {
                out.push(';');
                line += 1;
                prev_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            vlq::encode_into(mapping.generated_column as i32 - prev_column, &mut out);
            prev_column = mapping.generated_column as i32;
            vlq::encode_into(mapping.source_index as i32 - prev_source, &mut out);
            prev_source = mapping.source_index as i32;
            vlq::encode_into(mapping.original_line as i32 - prev_original_line, &mut out);
            prev_original_line = mapping.original_line as i32;
            vlq::encode_into(
                mapping.original_column as i32 - prev_original_column,
                &mut out,
            );
            prev_original_column = mapping.original_column as i32;
            if let Some(name) = mapping.name_index {
                vlq::encode_into(name as i32 - prev_name, &mut out);
                prev_name = name as i32;
            }
        }
        out
    }

    /// Serialize to a Source Map v3 JSON document.
    #[must_use]
    pub fn to_json(&self) -> String {
        let has_content = self.sources_content.iter().any(Option::is_some);
        let raw = RawSourceMap {
            version: 3,
            file: &self.file,
            source_root: &self.source_root,
            sources: &self.sources,
            sources_content: has_content
                .then(|| self.sources_content.iter().map(Option::as_deref).collect()),
            names: &self.names,
            mappings: self.serialize_mappings(),
        };
        // Serializing plain strings and vectors cannot fail.
        serde_json::to_string(&raw).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "source_map_tests.rs"]
mod tests;
