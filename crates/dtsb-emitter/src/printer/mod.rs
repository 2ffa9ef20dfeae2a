//! Declaration printer.
//!
//! `Printer` turns statement lists back into declaration-file text. Statements
//! from several parsed files can be printed into one output; call
//! [`Printer::set_source`] before each file's statements so identifiers map back
//! to the right original when a source map is enabled.

mod expressions;
mod helpers;
mod members;
mod statements;
mod types;

use crate::source_writer::{SourcePosition, SourceWriter};
use dtsb_common::{LineMap, NewLineKind};
use dtsb_parser::ast::{SourceFile, Stmt, TypeNode};
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default)]
pub struct PrintOptions {
    pub new_line: NewLineKind,
}

/// Printed text plus the serialized source map, if one was requested.
#[derive(Debug)]
pub struct PrintOutput {
    pub code: String,
    pub source_map: Option<String>,
}

struct MappedSource {
    index: u32,
    text: Arc<str>,
    line_map: Arc<LineMap>,
}

pub struct Printer {
    writer: SourceWriter,
    indent_level: u32,
    pending_source_pos: Option<SourcePosition>,
    current_source: Option<MappedSource>,
    line_maps: FxHashMap<u32, Arc<LineMap>>,
}

impl Printer {
    pub fn new(options: PrintOptions) -> Self {
        let mut writer = SourceWriter::with_capacity(4096);
        writer.set_new_line(options.new_line);
        Printer {
            writer,
            indent_level: 0,
            pending_source_pos: None,
            current_source: None,
            line_maps: FxHashMap::default(),
        }
    }

    /// Record mappings for the file named `output_name`.
    pub fn enable_source_map(&mut self, output_name: String) {
        self.writer.enable_source_map(output_name);
    }

    /// Attribute the following statements to `source_name`, whose original text is
    /// `text`. The text is embedded as the source's content.
    pub fn set_source(&mut self, source_name: &str, text: &Arc<str>) {
        let Some(index) = self
            .writer
            .add_source(source_name.to_string(), Some(text.to_string()))
        else {
            return;
        };
        let line_map = self
            .line_maps
            .entry(index)
            .or_insert_with(|| Arc::new(LineMap::build(text)))
            .clone();
        self.current_source = Some(MappedSource {
            index,
            text: Arc::clone(text),
            line_map,
        });
    }

    /// Stop mapping; following text is synthesized.
    pub fn clear_source(&mut self) {
        self.current_source = None;
    }

    /// Print triple-slash directives, one per line.
    pub fn print_directives<'d>(&mut self, directives: impl IntoIterator<Item = &'d str>) {
        for directive in directives {
            self.write_indent();
            self.write_raw(directive);
            self.write_line();
        }
    }

    pub fn print_statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.emit_statement(stmt);
        }
    }

    pub fn print_statement(&mut self, stmt: &Stmt) {
        self.emit_statement(stmt);
    }

    pub fn print_type(&mut self, ty: &TypeNode) {
        self.emit_type(ty);
    }

    /// Write a `//` comment on its own line.
    pub fn print_comment_line(&mut self, text: &str) {
        self.write_indent();
        self.write_raw("//");
        self.write_raw(text);
        self.write_line();
    }

    pub fn finish(self) -> PrintOutput {
        let (code, source_map) = self.writer.finish();
        PrintOutput { code, source_map }
    }
}

/// Print a whole parsed file, directives included.
pub fn print_source_file(file: &SourceFile, options: PrintOptions) -> String {
    let mut printer = Printer::new(options);
    printer.print_directives(file.references.iter().map(String::as_str));
    printer.print_statements(&file.statements);
    printer.finish().code
}

#[cfg(test)]
#[path = "tests/printer_tests.rs"]
mod printer_tests;
