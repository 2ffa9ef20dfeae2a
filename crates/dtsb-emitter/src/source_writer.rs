//! Output buffer that tracks the generated line/column and records source map
//! segments for text written on behalf of a parsed node.

use dtsb_common::{NewLineKind, SourceMapGenerator};
use memchr::{memchr_iter, memrchr};

/// Original location of a node, already resolved to a source index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePosition {
    pub source_index: u32,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug)]
pub struct SourceWriter {
    output: String,
    line: u32,
    column: u32,
    new_line: NewLineKind,
    source_map: Option<SourceMapGenerator>,
}

impl SourceWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        SourceWriter {
            output: String::with_capacity(capacity),
            line: 0,
            column: 0,
            new_line: NewLineKind::Lf,
            source_map: None,
        }
    }

    pub fn set_new_line(&mut self, new_line: NewLineKind) {
        self.new_line = new_line;
    }

    pub fn enable_source_map(&mut self, output_name: String) {
        self.source_map = Some(SourceMapGenerator::new(output_name));
    }

    #[inline]
    pub fn has_source_map(&self) -> bool {
        self.source_map.is_some()
    }

    /// Register a source file, returning its index (or `None` without a source map).
    pub fn add_source(&mut self, name: String, content: Option<String>) -> Option<u32> {
        let map = self.source_map.as_mut()?;
        Some(match content {
            Some(content) => map.add_source_with_content(name, content),
            None => map.add_source(name),
        })
    }

    /// Write text, keeping line and column in sync even if it spans lines.
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let bytes = text.as_bytes();
        match memrchr(b'\n', bytes) {
            Some(last) => {
                self.line += memchr_iter(b'\n', bytes).count() as u32;
                self.column = (bytes.len() - last - 1) as u32;
            }
            None => self.column += bytes.len() as u32,
        }
        self.output.push_str(text);
    }

    pub fn write_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.write(ch.encode_utf8(&mut buf));
    }

    pub fn write_space(&mut self) {
        self.write(" ");
    }

    pub fn write_line(&mut self) {
        self.output.push_str(self.new_line.as_str());
        self.line += 1;
        self.column = 0;
    }

    /// Write `text` with one mapping at its start.
    pub fn write_node(&mut self, text: &str, source_pos: SourcePosition) {
        if let Some(map) = &mut self.source_map {
            map.add_simple_mapping(
                self.line,
                self.column,
                source_pos.source_index,
                source_pos.line,
                source_pos.column,
            );
        }
        self.write(text);
    }

    /// Write `text` that is identical to the original, mapping every character.
    pub fn write_node_hires(&mut self, text: &str, source_pos: SourcePosition) {
        if let Some(map) = &mut self.source_map {
            for (offset, _) in text.char_indices() {
                let offset = offset as u32;
                map.add_simple_mapping(
                    self.line,
                    self.column + offset,
                    source_pos.source_index,
                    source_pos.line,
                    source_pos.column + offset,
                );
            }
        }
        self.write(text);
    }

    /// Write `text` with a mapping that records `original_name` in `names`.
    pub fn write_node_with_name(
        &mut self,
        text: &str,
        source_pos: SourcePosition,
        original_name: &str,
    ) {
        if let Some(map) = &mut self.source_map {
            let name_index = map.add_name(original_name.to_string());
            map.add_named_mapping(
                self.line,
                self.column,
                source_pos.source_index,
                source_pos.line,
                source_pos.column,
                name_index,
            );
        }
        self.write(text);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.output.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// The output ends at the start of a line.
    pub fn is_at_line_start(&self) -> bool {
        self.column == 0
    }

    pub fn get_output(&self) -> &str {
        &self.output
    }

    /// Consume the writer, returning the text and the serialized source map.
    pub fn finish(self) -> (String, Option<String>) {
        let map = self.source_map.map(|map| map.to_json());
        (self.output, map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_columns_across_multiline_writes() {
        let mut writer = SourceWriter::with_capacity(16);
        writer.write("abc");
        assert_eq!((writer.line, writer.column), (0, 3));
        writer.write("de\nfgh");
        assert_eq!((writer.line, writer.column), (1, 3));
        writer.write_line();
        assert_eq!((writer.line, writer.column), (2, 0));
        assert!(writer.is_at_line_start());
    }

    #[test]
    fn crlf_new_lines_count_as_one_line() {
        let mut writer = SourceWriter::with_capacity(16);
        writer.set_new_line(NewLineKind::Crlf);
        writer.write("a;");
        writer.write_line();
        writer.write("b;");
        assert_eq!(writer.get_output(), "a;\r\nb;");
        assert_eq!(writer.line, 1);
    }

    #[test]
    fn hires_writes_map_each_character() {
        let mut writer = SourceWriter::with_capacity(16);
        writer.enable_source_map("out.d.ts".to_string());
        let source_index = writer
            .add_source("a.d.ts".to_string(), Some("Foo".to_string()))
            .unwrap();
        writer.write("type ");
        writer.write_node_hires(
            "Foo",
            SourcePosition {
                source_index,
                line: 0,
                column: 0,
            },
        );
        let (code, map) = writer.finish();
        assert_eq!(code, "type Foo");
        let map = map.unwrap();
        // Columns 5, 6, 7 mapped to 0, 1, 2.
        assert!(map.contains("\"mappings\":\"KAAA,CAAC,CAAC\""), "{map}");
    }

    #[test]
    fn without_source_map_sources_are_not_registered() {
        let mut writer = SourceWriter::with_capacity(16);
        assert_eq!(writer.add_source("a.d.ts".to_string(), None), None);
        writer.write_node(
            "x",
            SourcePosition {
                source_index: 0,
                line: 0,
                column: 0,
            },
        );
        assert_eq!(writer.finish(), ("x".to_string(), None));
    }
}
