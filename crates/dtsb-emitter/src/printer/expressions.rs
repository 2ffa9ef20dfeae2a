//! Printer - the expression subset found in declaration files.

use super::Printer;
use dtsb_parser::ast::{Expr, ExprKind};

impl Printer {
    pub(super) fn emit_expression(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(ident) => self.write_identifier(ident),
            ExprKind::Member(object, name) => {
                self.emit_expression(object);
                self.write(".");
                self.write_identifier(name);
            }
            ExprKind::Element(object, index) => {
                self.emit_expression(object);
                self.write("[");
                self.emit_expression(index);
                self.write("]");
            }
            ExprKind::Call(callee, args) => {
                self.emit_expression(callee);
                self.write("(");
                self.write_comma_list(args, Self::emit_expression);
                self.write(")");
            }
            ExprKind::Str(literal) => self.write_string_literal(literal),
            ExprKind::Num(text) | ExprKind::BigInt(text) => {
                self.queue_source_mapping(expr.span);
                self.write(text);
            }
            ExprKind::Bool(value) => self.write(if *value { "true" } else { "false" }),
            ExprKind::Null => self.write("null"),
            ExprKind::This => self.write("this"),
            ExprKind::Unary(op, operand) => {
                self.write(op);
                // `- -1` must not become `--1`.
                if matches!(&operand.kind, ExprKind::Unary(inner, _) if inner == op) {
                    self.write_space();
                }
                self.emit_expression(operand);
            }
            ExprKind::Binary(op, left, right) => {
                self.emit_expression(left);
                self.write_space();
                self.write(op);
                self.write_space();
                self.emit_expression(right);
            }
            ExprKind::Paren(inner) => {
                self.write("(");
                self.emit_expression(inner);
                self.write(")");
            }
            ExprKind::Raw(text) => self.write_raw(text),
        }
    }
}
