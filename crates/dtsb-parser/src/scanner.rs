//! On-demand tokenizer for declaration files.
//!
//! Words are always scanned as `Identifier`; the parser decides contextually
//! whether a word acts as a keyword. `>` is always a single token so nested type
//! argument lists close cleanly; expression parsing joins adjacent `>` tokens
//! into shift operators.

use dtsb_common::diagnostics::diagnostic_codes;
use memchr::{memchr, memmem};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntaxKind {
    EndOfFile,
    Unknown,
    Identifier,
    PrivateIdentifier,
    StringLiteral,
    NumericLiteral,
    BigIntLiteral,
    NoSubstitutionTemplate,
    TemplateHead,
    TemplateMiddle,
    TemplateTail,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Dot,
    DotDotDot,
    Semicolon,
    Comma,
    LessThan,
    GreaterThan,
    Equals,
    EqualsGreaterThan,
    Question,
    Colon,
    Bar,
    BarBar,
    Ampersand,
    AmpersandAmpersand,
    Plus,
    Minus,
    Asterisk,
    AsteriskAsterisk,
    Slash,
    Percent,
    Caret,
    Tilde,
    Exclamation,
    At,
}

impl SyntaxKind {
    /// Text used in "'x' expected." diagnostics.
    pub fn text(self) -> &'static str {
        match self {
            SyntaxKind::OpenBrace => "{",
            SyntaxKind::CloseBrace => "}",
            SyntaxKind::OpenParen => "(",
            SyntaxKind::CloseParen => ")",
            SyntaxKind::OpenBracket => "[",
            SyntaxKind::CloseBracket => "]",
            SyntaxKind::Dot => ".",
            SyntaxKind::DotDotDot => "...",
            SyntaxKind::Semicolon => ";",
            SyntaxKind::Comma => ",",
            SyntaxKind::LessThan => "<",
            SyntaxKind::GreaterThan => ">",
            SyntaxKind::Equals => "=",
            SyntaxKind::EqualsGreaterThan => "=>",
            SyntaxKind::Question => "?",
            SyntaxKind::Colon => ":",
            SyntaxKind::Bar => "|",
            SyntaxKind::Ampersand => "&",
            SyntaxKind::Identifier => "identifier",
            SyntaxKind::StringLiteral => "string literal",
            _ => "token",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScannerDiagnostic {
    pub pos: usize,
    pub length: usize,
    pub code: u32,
}

/// Snapshot of scanner state for lookahead.
#[derive(Clone, Debug)]
pub struct ScannerSnapshot {
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    preceding_line_break: bool,
    token_doc: Option<String>,
    diagnostics_len: usize,
}

pub struct ScannerState {
    text: Arc<str>,
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    preceding_line_break: bool,
    token_doc: Option<String>,
    seen_token: bool,
    references: Vec<String>,
    diagnostics: Vec<ScannerDiagnostic>,
}

impl ScannerState {
    pub fn new(text: Arc<str>) -> Self {
        ScannerState {
            text,
            pos: 0,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_value: String::new(),
            preceding_line_break: false,
            token_doc: None,
            seen_token: false,
            references: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[inline]
    pub fn source_text(&self) -> &str {
        &self.text
    }

    pub fn source_text_arc(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.preceding_line_break
    }

    /// The `/** */` comment immediately preceding the current token, if any.
    pub fn token_doc(&self) -> Option<&str> {
        self.token_doc.as_deref()
    }

    pub fn take_references(&mut self) -> Vec<String> {
        std::mem::take(&mut self.references)
    }

    pub fn take_diagnostics(&mut self) -> Vec<ScannerDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn save_state(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            pos: self.pos,
            token: self.token,
            token_start: self.token_start,
            token_value: self.token_value.clone(),
            preceding_line_break: self.preceding_line_break,
            token_doc: self.token_doc.clone(),
            diagnostics_len: self.diagnostics.len(),
        }
    }

    pub fn restore_state(&mut self, snapshot: ScannerSnapshot) {
        self.pos = snapshot.pos;
        self.token = snapshot.token;
        self.token_start = snapshot.token_start;
        self.token_value = snapshot.token_value;
        self.preceding_line_break = snapshot.preceding_line_break;
        self.token_doc = snapshot.token_doc;
        self.diagnostics.truncate(snapshot.diagnostics_len);
    }

    fn byte(&self, at: usize) -> Option<u8> {
        self.text.as_bytes().get(at).copied()
    }

    fn error(&mut self, pos: usize, length: usize, code: u32) {
        self.diagnostics.push(ScannerDiagnostic { pos, length, code });
    }

    /// Skip whitespace and comments, recording doc comments and leading directives.
    fn skip_trivia(&mut self) {
        self.preceding_line_break = false;
        self.token_doc = None;
        while let Some(b) = self.byte(self.pos) {
            match b {
                b'\n' => {
                    self.preceding_line_break = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.byte(self.pos + 1) == Some(b'/') => {
                    let start = self.pos;
                    let end = memchr(b'\n', &self.text.as_bytes()[start..])
                        .map_or(self.text.len(), |offset| start + offset);
                    let line = self.text[start..end].trim_end();
                    if !self.seen_token && line.starts_with("///") && line[3..].trim_start().starts_with('<') {
                        self.references.push(line.to_string());
                    }
                    self.pos = end;
                }
                b'/' if self.byte(self.pos + 1) == Some(b'*') => {
                    let start = self.pos;
                    let finder = memmem::find(&self.text.as_bytes()[start + 2..], b"*/");
                    let end = match finder {
                        Some(offset) => start + 2 + offset + 2,
                        None => {
                            self.error(start, 2, diagnostic_codes::UNTERMINATED_COMMENT);
                            self.text.len()
                        }
                    };
                    let comment = &self.text[start..end];
                    if comment.contains('\n') {
                        self.preceding_line_break = true;
                    }
                    if comment.starts_with("/**") && comment != "/**/" && comment.len() > 4 {
                        self.token_doc = Some(comment.to_string());
                    }
                    self.pos = end;
                }
                b'#' if self.pos == 0 && self.byte(1) == Some(b'!') => {
                    self.pos = memchr(b'\n', self.text.as_bytes()).unwrap_or(self.text.len());
                }
                0x80.. => {
                    let ch = self.text[self.pos..].chars().next().unwrap_or(' ');
                    if ch.is_whitespace() || ch == '\u{feff}' {
                        if ch == '\u{2028}' || ch == '\u{2029}' {
                            self.preceding_line_break = true;
                        }
                        self.pos += ch.len_utf8();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Advance to the next token.
    pub fn scan(&mut self) -> SyntaxKind {
        self.skip_trivia();
        self.token_start = self.pos;
        self.token_value.clear();
        self.token = self.scan_token();
        self.seen_token = true;
        self.token
    }

    fn punct(&mut self, len: usize, kind: SyntaxKind) -> SyntaxKind {
        self.pos += len;
        kind
    }

    fn scan_token(&mut self) -> SyntaxKind {
        let Some(b) = self.byte(self.pos) else {
            return SyntaxKind::EndOfFile;
        };
        let next = self.byte(self.pos + 1);
        match b {
            b'{' => self.punct(1, SyntaxKind::OpenBrace),
            b'}' => self.punct(1, SyntaxKind::CloseBrace),
            b'(' => self.punct(1, SyntaxKind::OpenParen),
            b')' => self.punct(1, SyntaxKind::CloseParen),
            b'[' => self.punct(1, SyntaxKind::OpenBracket),
            b']' => self.punct(1, SyntaxKind::CloseBracket),
            b';' => self.punct(1, SyntaxKind::Semicolon),
            b',' => self.punct(1, SyntaxKind::Comma),
            b'<' => self.punct(1, SyntaxKind::LessThan),
            b'>' => self.punct(1, SyntaxKind::GreaterThan),
            b'?' => self.punct(1, SyntaxKind::Question),
            b':' => self.punct(1, SyntaxKind::Colon),
            b'~' => self.punct(1, SyntaxKind::Tilde),
            b'!' => self.punct(1, SyntaxKind::Exclamation),
            b'@' => self.punct(1, SyntaxKind::At),
            b'^' => self.punct(1, SyntaxKind::Caret),
            b'%' => self.punct(1, SyntaxKind::Percent),
            b'/' => self.punct(1, SyntaxKind::Slash),
            b'+' => self.punct(1, SyntaxKind::Plus),
            b'-' => self.punct(1, SyntaxKind::Minus),
            b'=' if next == Some(b'>') => self.punct(2, SyntaxKind::EqualsGreaterThan),
            b'=' => self.punct(1, SyntaxKind::Equals),
            b'|' if next == Some(b'|') => self.punct(2, SyntaxKind::BarBar),
            b'|' => self.punct(1, SyntaxKind::Bar),
            b'&' if next == Some(b'&') => self.punct(2, SyntaxKind::AmpersandAmpersand),
            b'&' => self.punct(1, SyntaxKind::Ampersand),
            b'*' if next == Some(b'*') => self.punct(2, SyntaxKind::AsteriskAsterisk),
            b'*' => self.punct(1, SyntaxKind::Asterisk),
            b'.' if next == Some(b'.') && self.byte(self.pos + 2) == Some(b'.') => {
                self.punct(3, SyntaxKind::DotDotDot)
            }
            b'.' if next.is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            b'.' => self.punct(1, SyntaxKind::Dot),
            b'"' | b'\'' => self.scan_string(b),
            b'`' => {
                self.pos += 1;
                self.scan_template_part(SyntaxKind::NoSubstitutionTemplate, SyntaxKind::TemplateHead)
            }
            b'0'..=b'9' => self.scan_number(),
            b'#' => {
                self.pos += 1;
                if self.scan_identifier_part() {
                    let start = self.token_start;
                    self.token_value = self.text[start..self.pos].to_string();
                    SyntaxKind::PrivateIdentifier
                } else {
                    self.error(self.token_start, 1, diagnostic_codes::INVALID_CHARACTER);
                    SyntaxKind::Unknown
                }
            }
            _ => {
                if self.scan_identifier_part() {
                    self.token_value = self.text[self.token_start..self.pos].to_string();
                    SyntaxKind::Identifier
                } else {
                    let len = self.text[self.pos..].chars().next().map_or(1, char::len_utf8);
                    self.error(self.pos, len, diagnostic_codes::INVALID_CHARACTER);
                    self.pos += len;
                    SyntaxKind::Unknown
                }
            }
        }
    }

    /// Consume identifier characters at `pos`; returns false if none were found.
    fn scan_identifier_part(&mut self) -> bool {
        let start = self.pos;
        for ch in self.text[start..].chars() {
            let is_start = self.pos == start;
            let ok = ch == '_'
                || ch == '$'
                || ch.is_ascii_alphabetic()
                || (!is_start && ch.is_ascii_digit())
                || (!ch.is_ascii() && ch.is_alphanumeric());
            if !ok {
                break;
            }
            self.pos += ch.len_utf8();
        }
        self.pos > start
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let radix_prefix = bytes.get(start) == Some(&b'0')
            && matches!(bytes.get(start + 1), Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O'));
        if radix_prefix {
            self.pos += 2;
            while self
                .byte(self.pos)
                .is_some_and(|c| c.is_ascii_hexdigit() || c == b'_')
            {
                self.pos += 1;
            }
        } else {
            while self.byte(self.pos).is_some_and(|c| c.is_ascii_digit() || c == b'_') {
                self.pos += 1;
            }
            if self.byte(self.pos) == Some(b'.') {
                self.pos += 1;
                while self.byte(self.pos).is_some_and(|c| c.is_ascii_digit() || c == b'_') {
                    self.pos += 1;
                }
            }
            if matches!(self.byte(self.pos), Some(b'e' | b'E')) {
                let mut look = self.pos + 1;
                if matches!(self.byte(look), Some(b'+' | b'-')) {
                    look += 1;
                }
                if self.byte(look).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos = look;
                    while self.byte(self.pos).is_some_and(|c| c.is_ascii_digit()) {
                        self.pos += 1;
                    }
                }
            }
        }
        let kind = if self.byte(self.pos) == Some(b'n') {
            self.pos += 1;
            SyntaxKind::BigIntLiteral
        } else {
            SyntaxKind::NumericLiteral
        };
        self.token_value = self.text[start..self.pos].to_string();
        kind
    }

    fn scan_string(&mut self, quote: u8) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(b) = self.byte(self.pos) else {
                self.error(start, self.pos - start, diagnostic_codes::UNTERMINATED_STRING_LITERAL);
                break;
            };
            if b == quote {
                self.pos += 1;
                break;
            }
            match b {
                b'\n' | b'\r' => {
                    self.error(start, self.pos - start, diagnostic_codes::UNTERMINATED_STRING_LITERAL);
                    break;
                }
                b'\\' => self.scan_escape(&mut value),
                _ => {
                    let ch = self.text[self.pos..].chars().next().unwrap_or('\u{fffd}');
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        self.token_value = value;
        SyntaxKind::StringLiteral
    }

    /// Decode one escape sequence starting at the backslash.
    fn scan_escape(&mut self, out: &mut String) {
        self.pos += 1;
        let Some(ch) = self.text[self.pos..].chars().next() else {
            return;
        };
        self.pos += ch.len_utf8();
        match ch {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.byte(self.pos).is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.read_hex(2);
                out.push(code.and_then(char::from_u32).unwrap_or('\u{fffd}'));
            }
            'u' => {
                let code = if self.byte(self.pos) == Some(b'{') {
                    let close = memchr(b'}', &self.text.as_bytes()[self.pos..]);
                    match close {
                        Some(offset) => {
                            let digits = &self.text[self.pos + 1..self.pos + offset];
                            self.pos += offset + 1;
                            u32::from_str_radix(digits, 16).ok()
                        }
                        None => None,
                    }
                } else {
                    self.read_hex(4)
                };
                out.push(code.and_then(char::from_u32).unwrap_or('\u{fffd}'));
            }
            '\r' => {
                if self.byte(self.pos) == Some(b'\n') {
                    self.pos += 1;
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }

    fn read_hex(&mut self, digits: usize) -> Option<u32> {
        let end = self.pos + digits;
        let text = self.text.get(self.pos..end)?;
        let value = u32::from_str_radix(text, 16).ok()?;
        self.pos = end;
        Some(value)
    }

    /// Scan template text up to the closing backtick or the next `${`.
    /// The token value holds the raw text between delimiters.
    fn scan_template_part(&mut self, closed: SyntaxKind, open: SyntaxKind) -> SyntaxKind {
        let start = self.pos;
        loop {
            match self.byte(self.pos) {
                None => {
                    self.error(
                        self.token_start,
                        self.pos - self.token_start,
                        diagnostic_codes::UNTERMINATED_TEMPLATE_LITERAL,
                    );
                    self.token_value = self.text[start..].to_string();
                    return closed;
                }
                Some(b'`') => {
                    self.token_value = self.text[start..self.pos].to_string();
                    self.pos += 1;
                    return closed;
                }
                Some(b'$') if self.byte(self.pos + 1) == Some(b'{') => {
                    self.token_value = self.text[start..self.pos].to_string();
                    self.pos += 2;
                    return open;
                }
                Some(b'\\') => self.pos += 2,
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Re-scan a `}` token as the continuation of a template literal.
    pub fn rescan_template_continuation(&mut self) -> SyntaxKind {
        self.pos = self.token_start + 1;
        self.token = self.scan_template_part(SyntaxKind::TemplateTail, SyntaxKind::TemplateMiddle);
        self.token
    }
}
