//! Recursive-descent parser for declaration files.
//!
//! `ParserState` owns the scanner and the diagnostics list; the parse methods
//! are split by syntactic area across `state_statements`, `state_members`,
//! `state_types` and `state_expressions`.

mod state_expressions;
mod state_members;
mod state_statements;
mod state_types;

use crate::ast::{Ident, SourceFile};
use crate::scanner::{ScannerSnapshot, ScannerState, SyntaxKind};
use dtsb_common::Diagnostic;
use dtsb_common::Span;
use dtsb_common::diagnostics::diagnostic_codes;
use std::sync::Arc;

/// Saved parser position for backtracking.
pub(crate) struct ParserMark {
    scanner: ScannerSnapshot,
    current_token: SyntaxKind,
    prev_end: u32,
    diagnostics_len: usize,
}

pub struct ParserState {
    pub(crate) scanner: ScannerState,
    pub(crate) file_name: String,
    pub(crate) current_token: SyntaxKind,
    /// End offset of the most recently consumed token.
    pub(crate) prev_end: u32,
    /// Set while parsing the `extends` operand of a conditional type.
    pub(crate) disallow_conditional_types: bool,
    diagnostics: Vec<Diagnostic>,
}

impl ParserState {
    pub fn new(file_name: String, source_text: String) -> Self {
        ParserState {
            scanner: ScannerState::new(Arc::from(source_text)),
            file_name,
            current_token: SyntaxKind::Unknown,
            prev_end: 0,
            disallow_conditional_types: false,
            diagnostics: Vec::new(),
        }
    }

    /// Parse the whole file. Never fails; problems are reported through
    /// [`ParserState::get_diagnostics`].
    #[tracing::instrument(level = "debug", skip(self), fields(file = %self.file_name))]
    pub fn parse_source_file(&mut self) -> SourceFile {
        self.next_token();
        let statements = self.parse_statement_list(true);
        let references = self.scanner.take_references();

        for diag in self.scanner.take_diagnostics() {
            self.diagnostics.push(Diagnostic::from_code(
                self.file_name.clone(),
                u32_from(diag.pos),
                u32_from(diag.length),
                diag.code,
                &[],
            ));
        }
        self.diagnostics.sort_by_key(|d| d.start);

        let is_module = statements.iter().any(state_statements::marks_module);
        tracing::trace!(
            statements = statements.len(),
            is_module,
            diagnostics = self.diagnostics.len(),
            "parsed source file"
        );

        SourceFile {
            file_name: self.file_name.clone(),
            text: self.scanner.source_text_arc(),
            statements,
            references,
            is_module,
        }
    }

    pub fn get_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        self.prev_end = u32_from(self.scanner.token_end());
        self.current_token = self.scanner.scan();
        self.current_token
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.current_token == kind
    }

    /// Current token is the identifier `word` (contextual keyword check).
    #[inline]
    pub(crate) fn is_word(&self, word: &str) -> bool {
        self.current_token == SyntaxKind::Identifier && self.scanner.token_value() == word
    }

    #[inline]
    pub(crate) fn token_value(&self) -> &str {
        self.scanner.token_value()
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        u32_from(self.scanner.token_start())
    }

    #[inline]
    pub(crate) fn token_end(&self) -> u32 {
        u32_from(self.scanner.token_end())
    }

    pub(crate) fn token_span(&self) -> Span {
        Span::new(self.token_pos(), self.token_end())
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    pub(crate) fn has_preceding_line_break(&self) -> bool {
        self.scanner.has_preceding_line_break()
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub(crate) fn parse_optional_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind`, reporting "'x' expected." when it is missing.
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &[kind.text()]);
        false
    }

    pub(crate) fn parse_expected_word(&mut self, word: &str) -> bool {
        if self.parse_optional_word(word) {
            return true;
        }
        self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &[word]);
        false
    }

    /// Consume an identifier (any word, keywords included).
    pub(crate) fn parse_identifier(&mut self) -> Ident {
        if self.is_token(SyntaxKind::Identifier) {
            let ident = Ident::new(self.token_value(), self.token_span());
            self.next_token();
            return ident;
        }
        self.error_at_token(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
        Ident::new("", Span::new(self.token_pos(), self.token_pos()))
    }

    /// Optional `;` with automatic semicolon insertion at line breaks, `}` and end of file.
    pub(crate) fn parse_semicolon(&mut self) {
        if self.parse_optional(SyntaxKind::Semicolon) {
            return;
        }
        if self.is_token(SyntaxKind::CloseBrace)
            || self.is_token(SyntaxKind::EndOfFile)
            || self.has_preceding_line_break()
        {
            return;
        }
        self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &[";"]);
    }

    pub(crate) fn mark(&self) -> ParserMark {
        ParserMark {
            scanner: self.scanner.save_state(),
            current_token: self.current_token,
            prev_end: self.prev_end,
            diagnostics_len: self.diagnostics.len(),
        }
    }

    pub(crate) fn rewind(&mut self, mark: ParserMark) {
        self.scanner.restore_state(mark.scanner);
        self.current_token = mark.current_token;
        self.prev_end = mark.prev_end;
        self.diagnostics.truncate(mark.diagnostics_len);
    }

    /// Run `f` speculatively and rewind afterwards.
    pub(crate) fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.mark();
        let result = f(self);
        self.rewind(mark);
        result
    }

    /// Kind of the token after the current one.
    pub(crate) fn peek_token(&mut self) -> SyntaxKind {
        self.look_ahead(|p| p.next_token())
    }

    /// The token after the current one is the identifier `word`.
    pub(crate) fn peek_word(&mut self, word: &str) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            p.is_word(word)
        })
    }

    /// Skip a balanced `{}`/`()`/`[]` group starting at the current opening token.
    pub(crate) fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current_token {
                SyntaxKind::OpenBrace | SyntaxKind::OpenParen | SyntaxKind::OpenBracket => depth += 1,
                SyntaxKind::CloseBrace | SyntaxKind::CloseParen | SyntaxKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                }
                SyntaxKind::EndOfFile => return,
                _ => {}
            }
            self.next_token();
            if depth == 0 {
                return;
            }
        }
    }

    pub(crate) fn error_at_token(&mut self, code: u32, args: &[&str]) {
        let start = self.token_pos();
        let length = self.token_end().saturating_sub(start);
        // One diagnostic per position keeps recovery from cascading.
        if self.diagnostics.last().is_some_and(|d| d.start == start) {
            return;
        }
        self.diagnostics.push(Diagnostic::from_code(
            self.file_name.clone(),
            start,
            length,
            code,
            args,
        ));
    }

    pub(crate) fn source_slice(&self, span: Span) -> String {
        span.slice(self.scanner.source_text()).to_string()
    }
}

#[inline]
pub(crate) fn u32_from(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX - 1)
}

#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod parser_tests;

#[cfg(test)]
#[path = "tests/type_tests.rs"]
mod type_tests;
