//! Parser state - the small expression subset that appears in declaration files
//! (initializers, enum values, `export default` / `export =` targets, heritage clauses).

use super::ParserState;
use crate::ast::{Expr, ExprKind, ExprWithTypeArgs, Ident, Str};
use crate::scanner::SyntaxKind;
use dtsb_common::diagnostics::diagnostic_codes;

impl ParserState {
    fn finish_expr(&self, start: u32, kind: ExprKind) -> Expr {
        Expr {
            span: self.span_from(start),
            kind,
        }
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> Expr {
        self.parse_binary_expression(0)
    }

    /// Binary operator at the current position with its precedence and token count.
    fn peek_binary_operator(&mut self) -> Option<(&'static str, u8, usize)> {
        let op = match self.current_token {
            SyntaxKind::BarBar => ("||", 1, 1),
            SyntaxKind::AmpersandAmpersand => ("&&", 2, 1),
            SyntaxKind::Bar => ("|", 3, 1),
            SyntaxKind::Caret => ("^", 4, 1),
            SyntaxKind::Ampersand => ("&", 5, 1),
            SyntaxKind::LessThan => {
                let end = self.token_end();
                let adjacent = self.look_ahead(|p| {
                    p.next_token();
                    p.is_token(SyntaxKind::LessThan) && p.token_pos() == end
                });
                if !adjacent {
                    return None;
                }
                ("<<", 7, 2)
            }
            SyntaxKind::GreaterThan => {
                let end = self.token_end();
                let count = self.look_ahead(|p| {
                    let mut count = 1;
                    let mut last_end = end;
                    while count < 3 {
                        p.next_token();
                        if !p.is_token(SyntaxKind::GreaterThan) || p.token_pos() != last_end {
                            break;
                        }
                        last_end = p.token_end();
                        count += 1;
                    }
                    count
                });
                match count {
                    2 => (">>", 7, 2),
                    3 => (">>>", 7, 3),
                    _ => return None,
                }
            }
            SyntaxKind::Plus => ("+", 8, 1),
            SyntaxKind::Minus => ("-", 8, 1),
            SyntaxKind::Asterisk => ("*", 9, 1),
            SyntaxKind::Slash => ("/", 9, 1),
            SyntaxKind::Percent => ("%", 9, 1),
            SyntaxKind::AsteriskAsterisk => ("**", 10, 1),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> Expr {
        let start = self.token_pos();
        let mut left = self.parse_unary_expression();
        while let Some((op, precedence, tokens)) = self.peek_binary_operator() {
            if precedence <= min_precedence {
                break;
            }
            for _ in 0..tokens {
                self.next_token();
            }
            // `**` is right-associative.
            let next_min = if op == "**" { precedence - 1 } else { precedence };
            let right = self.parse_binary_expression(next_min);
            left = self.finish_expr(start, ExprKind::Binary(op, Box::new(left), Box::new(right)));
        }
        left
    }

    fn parse_unary_expression(&mut self) -> Expr {
        let start = self.token_pos();
        let op = match self.current_token {
            SyntaxKind::Minus => Some("-"),
            SyntaxKind::Plus => Some("+"),
            SyntaxKind::Tilde => Some("~"),
            SyntaxKind::Exclamation => Some("!"),
            _ => None,
        };
        match op {
            Some(op) => {
                self.next_token();
                let operand = self.parse_unary_expression();
                self.finish_expr(start, ExprKind::Unary(op, Box::new(operand)))
            }
            None => self.parse_left_hand_side_expression(),
        }
    }

    /// Primary expression followed by member accesses and calls.
    pub(crate) fn parse_left_hand_side_expression(&mut self) -> Expr {
        let start = self.token_pos();
        let mut expr = self.parse_primary_expression();
        loop {
            match self.current_token {
                SyntaxKind::Dot => {
                    self.next_token();
                    let name = if self.is_token(SyntaxKind::PrivateIdentifier) {
                        let ident = Ident::new(self.token_value(), self.token_span());
                        self.next_token();
                        ident
                    } else {
                        self.parse_identifier()
                    };
                    expr = self.finish_expr(start, ExprKind::Member(Box::new(expr), name));
                }
                SyntaxKind::OpenBracket if !self.has_preceding_line_break() => {
                    self.next_token();
                    let index = self.parse_assignment_expression();
                    self.parse_expected(SyntaxKind::CloseBracket);
                    expr = self.finish_expr(start, ExprKind::Element(Box::new(expr), Box::new(index)));
                }
                SyntaxKind::OpenParen if !self.has_preceding_line_break() => {
                    self.next_token();
                    let mut args = Vec::new();
                    while !self.is_token(SyntaxKind::CloseParen) && !self.is_token(SyntaxKind::EndOfFile) {
                        args.push(self.parse_assignment_expression());
                        if !self.parse_optional(SyntaxKind::Comma) {
                            break;
                        }
                    }
                    self.parse_expected(SyntaxKind::CloseParen);
                    expr = self.finish_expr(start, ExprKind::Call(Box::new(expr), args));
                }
                SyntaxKind::Exclamation if !self.has_preceding_line_break() => {
                    self.next_token();
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary_expression(&mut self) -> Expr {
        let start = self.token_pos();
        let span = self.token_span();
        let kind = match self.current_token {
            SyntaxKind::Identifier => match self.token_value() {
                "true" => ExprKind::Bool(true),
                "false" => ExprKind::Bool(false),
                "null" => ExprKind::Null,
                "this" => ExprKind::This,
                name => ExprKind::Ident(Ident::new(name, span)),
            },
            SyntaxKind::StringLiteral => ExprKind::Str(Str {
                value: self.token_value().to_string(),
                span,
            }),
            SyntaxKind::NumericLiteral => ExprKind::Num(self.token_value().to_string()),
            SyntaxKind::BigIntLiteral => ExprKind::BigInt(self.token_value().to_string()),
            SyntaxKind::NoSubstitutionTemplate => ExprKind::Raw(self.source_slice(span)),
            SyntaxKind::OpenParen => {
                self.next_token();
                let inner = self.parse_assignment_expression();
                self.parse_expected(SyntaxKind::CloseParen);
                return self.finish_expr(start, ExprKind::Paren(Box::new(inner)));
            }
            SyntaxKind::OpenBrace | SyntaxKind::OpenBracket => {
                self.skip_balanced();
                let span = self.span_from(start);
                return Expr {
                    span,
                    kind: ExprKind::Raw(self.source_slice(span)),
                };
            }
            _ => {
                self.error_at_token(diagnostic_codes::EXPRESSION_EXPECTED, &[]);
                return Expr {
                    span: dtsb_common::Span::new(start, start),
                    kind: ExprKind::Raw(String::new()),
                };
            }
        };
        self.next_token();
        Expr { span, kind }
    }

    /// `Base<T>` in `extends` / `implements` clauses.
    pub(crate) fn parse_expression_with_type_arguments(&mut self) -> ExprWithTypeArgs {
        let start = self.token_pos();
        let expr = self.parse_left_hand_side_expression();
        let type_args = if self.is_token(SyntaxKind::LessThan) {
            self.parse_type_arguments()
        } else {
            Vec::new()
        };
        ExprWithTypeArgs {
            span: self.span_from(start),
            expr,
            type_args,
        }
    }
}
