use super::Printer;
use crate::source_writer::SourcePosition;
use dtsb_common::Span;
use dtsb_parser::ast::{Ident, ModifierFlags, Str};

impl Printer {
    // =========================================================================
    // Source positions
    // =========================================================================

    fn source_position(&self, span: Span) -> Option<SourcePosition> {
        if span.is_dummy() || !self.writer.has_source_map() {
            return None;
        }
        let source = self.current_source.as_ref()?;
        if span.end as usize > source.text.len() {
            return None;
        }
        let pos = source.line_map.offset_to_position(span.start);
        Some(SourcePosition {
            source_index: source.index,
            line: pos.line,
            column: pos.character,
        })
    }

    /// Map the next written token to the start of `span`.
    pub(super) fn queue_source_mapping(&mut self, span: Span) {
        self.pending_source_pos = self.source_position(span);
    }

    fn take_pending_source_pos(&mut self) -> Option<SourcePosition> {
        self.pending_source_pos.take()
    }

    // =========================================================================
    // Output Helpers (delegate to SourceWriter)
    // =========================================================================

    pub(super) fn write_raw(&mut self, text: &str) {
        self.writer.write(text);
    }

    pub(super) fn write(&mut self, text: &str) {
        if let Some(source_pos) = self.take_pending_source_pos() {
            self.writer.write_node(text, source_pos);
        } else {
            self.writer.write(text);
        }
    }

    /// Write an identifier. Unchanged names map per character; renamed ones
    /// record the original name.
    pub(super) fn write_identifier(&mut self, ident: &Ident) {
        let Some(source_pos) = self.source_position(ident.span) else {
            self.write(&ident.name);
            return;
        };
        self.pending_source_pos = None;
        let original = match &self.current_source {
            Some(source) => ident.span.slice(&source.text),
            None => "",
        };
        if original == ident.name {
            self.writer.write_node_hires(&ident.name, source_pos);
        } else if original.is_empty() {
            self.writer.write_node(&ident.name, source_pos);
        } else {
            self.writer
                .write_node_with_name(&ident.name, source_pos, original);
        }
    }

    /// Import/export specifier names may be string literals (`export { "a-b" as c }`).
    pub(super) fn write_module_export_name(&mut self, ident: &Ident) {
        if is_identifier_text(&ident.name) {
            self.write_identifier(ident);
        } else {
            self.write_string_literal(&Str {
                value: ident.name.clone(),
                span: ident.span,
            });
        }
    }

    pub(super) fn write_string_literal(&mut self, literal: &Str) {
        if let Some(source_pos) = self.source_position(literal.span) {
            self.pending_source_pos = None;
            self.writer.write_node(&quote_string(&literal.value), source_pos);
        } else {
            self.write(&quote_string(&literal.value));
        }
    }

    pub(super) fn write_line(&mut self) {
        self.writer.write_line();
    }

    pub(super) fn write_space(&mut self) {
        self.writer.write_space();
    }

    pub(super) fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.write_raw("    ");
        }
    }

    pub(super) fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    pub(super) fn decrease_indent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Write a `/** */` comment at the current indentation, re-indenting its
    /// continuation lines.
    pub(super) fn write_doc(&mut self, doc: Option<&str>) {
        let Some(doc) = doc else {
            return;
        };
        let mut lines = doc.lines();
        self.write_indent();
        if let Some(first) = lines.next() {
            self.write_raw(first.trim_end());
        }
        for line in lines {
            self.write_line();
            self.write_indent();
            let line = line.trim();
            if line.starts_with('*') {
                self.write_space();
            }
            self.write_raw(line);
        }
        self.write_line();
    }

    /// Write each modifier in `flags` followed by a space.
    pub(super) fn write_modifiers(&mut self, flags: ModifierFlags) {
        for (flag, text) in ModifierFlags::PRINT_ORDER {
            if flags.contains(flag) {
                self.write(text);
                self.write_space();
            }
        }
    }

    /// Write `items` separated by `", "`.
    pub(super) fn write_comma_list<T>(&mut self, items: &[T], mut emit: impl FnMut(&mut Self, &T)) {
        let mut first = true;
        for item in items {
            if !first {
                self.write_raw(", ");
            }
            first = false;
            emit(self, item);
        }
    }
}

pub(crate) fn is_identifier_text(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Double-quoted string literal text for `value`.
pub(crate) fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
