//! Declaration-file parser for the dtsb declaration bundler.
//!
//! This crate provides:
//! - `scanner` - on-demand tokenizer (`ScannerState`, `SyntaxKind`)
//! - `ast` - owned, tagged syntax tree for `.d.ts` files
//! - `parser` - recursive-descent `ParserState`

pub mod ast;
pub mod parser;
pub mod scanner;

pub use ast::SourceFile;
pub use parser::ParserState;

use dtsb_common::Diagnostic;

/// A parsed file together with the syntax diagnostics produced while parsing it.
#[derive(Debug)]
pub struct ParseResult {
    pub source_file: SourceFile,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `text` as a declaration file named `file_name`.
pub fn parse(file_name: impl Into<String>, text: impl Into<String>) -> ParseResult {
    let mut parser = ParserState::new(file_name.into(), text.into());
    let source_file = parser.parse_source_file();
    ParseResult {
        source_file,
        diagnostics: parser.take_diagnostics(),
    }
}
