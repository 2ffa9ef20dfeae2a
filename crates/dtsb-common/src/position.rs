//! Line/column positions computed from byte offsets.

use memchr::memchr_iter;

/// Zero-based line and UTF-16-agnostic byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// Precomputed line start offsets for a source text.
#[derive(Clone, Debug, Default)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    #[must_use]
    pub fn build(text: &str) -> Self {
        let mut line_starts = Vec::with_capacity(text.len() / 32 + 1);
        line_starts.push(0);
        for idx in memchr_iter(b'\n', text.as_bytes()) {
            line_starts.push(idx as u32 + 1);
        }
        LineMap { line_starts }
    }

    /// Convert a byte offset to a line/column position.
    #[must_use]
    pub fn offset_to_position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        Position::new(line as u32, offset.saturating_sub(start))
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_lines_and_columns() {
        let map = LineMap::build("interface A {}\nexport { A };\n");
        assert_eq!(map.offset_to_position(0), Position::new(0, 0));
        assert_eq!(map.offset_to_position(10), Position::new(0, 10));
        assert_eq!(map.offset_to_position(15), Position::new(1, 0));
        assert_eq!(map.offset_to_position(24), Position::new(1, 9));
        assert_eq!(map.line_count(), 3);
    }
}
