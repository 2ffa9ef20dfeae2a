//! Parser state - type parsing

use super::ParserState;
use crate::ast::{
    Expr, ExprKind, Ident, MappedModifier, TupleElement, TypeKind, TypeNode, TypeOperator,
    TypeParam,
};
use crate::scanner::SyntaxKind;
use dtsb_common::Span;
use dtsb_common::diagnostics::diagnostic_codes;

const KEYWORD_TYPES: &[&str] = &[
    "any", "unknown", "never", "void", "undefined", "null", "string", "number", "boolean",
    "bigint", "symbol", "object",
];

impl ParserState {
    // =========================================================================
    // Parse Methods - Types
    // =========================================================================

    pub(crate) fn keyword_type(&self, keyword: &str) -> TypeNode {
        TypeNode::new(TypeKind::Keyword(keyword.to_string()))
    }

    fn finish_type(&self, start: u32, kind: TypeKind) -> TypeNode {
        TypeNode {
            span: self.span_from(start),
            kind,
        }
    }

    /// Parse a type in a nested context (parentheses, brackets, braces, type
    /// arguments) where conditional types are allowed again.
    pub(crate) fn parse_nested_type(&mut self) -> TypeNode {
        let saved = std::mem::replace(&mut self.disallow_conditional_types, false);
        let ty = self.parse_type();
        self.disallow_conditional_types = saved;
        ty
    }

    /// Parse a type (function types, unions, intersections, conditionals)
    pub(crate) fn parse_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        if self.is_start_of_function_type() {
            let sig = self.parse_signature(SyntaxKind::EqualsGreaterThan);
            return self.finish_type(
                start,
                TypeKind::Function {
                    constructor: false,
                    is_abstract: false,
                    sig,
                },
            );
        }
        let is_abstract = self.is_word("abstract") && self.peek_word("new");
        if is_abstract || self.is_word("new") {
            if is_abstract {
                self.next_token();
            }
            self.next_token();
            let sig = self.parse_signature(SyntaxKind::EqualsGreaterThan);
            return self.finish_type(
                start,
                TypeKind::Function {
                    constructor: true,
                    is_abstract,
                    sig,
                },
            );
        }

        let check = self.parse_union_type();
        if self.disallow_conditional_types || self.has_preceding_line_break() || !self.is_word("extends") {
            return check;
        }
        self.next_token();
        self.disallow_conditional_types = true;
        let extends = self.parse_type();
        self.disallow_conditional_types = false;
        self.parse_expected(SyntaxKind::Question);
        let true_ty = self.parse_type();
        self.parse_expected(SyntaxKind::Colon);
        let false_ty = self.parse_type();
        self.finish_type(
            start,
            TypeKind::Conditional {
                check: Box::new(check),
                extends: Box::new(extends),
                true_ty: Box::new(true_ty),
                false_ty: Box::new(false_ty),
            },
        )
    }

    /// Return type, which may be a type predicate (`x is T`, `asserts x`).
    pub(crate) fn parse_return_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        let asserts = self.is_word("asserts")
            && self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::Identifier) && !p.has_preceding_line_break()
            });
        if asserts {
            self.next_token();
            let param = self.parse_identifier();
            let ty = if self.parse_optional_word("is") {
                Some(Box::new(self.parse_type()))
            } else {
                None
            };
            return self.finish_type(
                start,
                TypeKind::Predicate {
                    asserts: true,
                    param,
                    ty,
                },
            );
        }
        let is_predicate = self.is_token(SyntaxKind::Identifier)
            && self.look_ahead(|p| {
                p.next_token();
                p.is_word("is") && !p.has_preceding_line_break()
            });
        if is_predicate {
            let param = self.parse_identifier();
            self.next_token();
            let ty = self.parse_type();
            return self.finish_type(
                start,
                TypeKind::Predicate {
                    asserts: false,
                    param,
                    ty: Some(Box::new(ty)),
                },
            );
        }
        self.parse_type()
    }

    fn is_start_of_function_type(&mut self) -> bool {
        if self.is_token(SyntaxKind::LessThan) {
            return true;
        }
        self.is_token(SyntaxKind::OpenParen) && self.look_ahead(|p| p.is_unambiguously_start_of_function_type())
    }

    fn is_unambiguously_start_of_function_type(&mut self) -> bool {
        self.next_token();
        if self.is_token(SyntaxKind::CloseParen) || self.is_token(SyntaxKind::DotDotDot) {
            return true;
        }
        if self.skip_parameter_start() {
            if matches!(
                self.current_token,
                SyntaxKind::Colon | SyntaxKind::Comma | SyntaxKind::Question | SyntaxKind::Equals
            ) {
                return true;
            }
            if self.is_token(SyntaxKind::CloseParen) {
                self.next_token();
                return self.is_token(SyntaxKind::EqualsGreaterThan);
            }
        }
        false
    }

    fn skip_parameter_start(&mut self) -> bool {
        while self.is_token(SyntaxKind::Identifier)
            && matches!(self.token_value(), "public" | "private" | "protected" | "readonly")
            && self.peek_token() == SyntaxKind::Identifier
        {
            self.next_token();
        }
        if self.is_token(SyntaxKind::Identifier) {
            self.next_token();
            return true;
        }
        if self.is_token(SyntaxKind::OpenBrace) || self.is_token(SyntaxKind::OpenBracket) {
            let diagnostics_before = self.get_diagnostics().len();
            self.parse_binding_name();
            return self.get_diagnostics().len() == diagnostics_before;
        }
        false
    }

    fn parse_union_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        let leading = self.parse_optional(SyntaxKind::Bar);
        let first = self.parse_intersection_type();
        if !self.is_token(SyntaxKind::Bar) {
            if leading {
                return self.finish_type(start, TypeKind::Union(vec![first]));
            }
            return first;
        }
        let mut types = vec![first];
        while self.parse_optional(SyntaxKind::Bar) {
            types.push(self.parse_intersection_type());
        }
        self.finish_type(start, TypeKind::Union(types))
    }

    fn parse_intersection_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        let leading = self.parse_optional(SyntaxKind::Ampersand);
        let first = self.parse_type_operator();
        if !self.is_token(SyntaxKind::Ampersand) {
            if leading {
                return self.finish_type(start, TypeKind::Intersection(vec![first]));
            }
            return first;
        }
        let mut types = vec![first];
        while self.parse_optional(SyntaxKind::Ampersand) {
            types.push(self.parse_type_operator());
        }
        self.finish_type(start, TypeKind::Intersection(types))
    }

    fn next_can_start_type(&mut self) -> bool {
        let next = self.peek_token();
        !matches!(
            next,
            SyntaxKind::CloseParen
                | SyntaxKind::CloseBracket
                | SyntaxKind::CloseBrace
                | SyntaxKind::Comma
                | SyntaxKind::Semicolon
                | SyntaxKind::GreaterThan
                | SyntaxKind::Equals
                | SyntaxKind::Bar
                | SyntaxKind::Ampersand
                | SyntaxKind::Colon
                | SyntaxKind::Question
                | SyntaxKind::Dot
                | SyntaxKind::EndOfFile
        )
    }

    fn parse_type_operator(&mut self) -> TypeNode {
        let start = self.token_pos();
        let operator = match self.token_value() {
            "keyof" if self.is_token(SyntaxKind::Identifier) => Some(TypeOperator::KeyOf),
            "unique" if self.is_token(SyntaxKind::Identifier) => Some(TypeOperator::Unique),
            "readonly" if self.is_token(SyntaxKind::Identifier) => Some(TypeOperator::Readonly),
            _ => None,
        };
        if let Some(operator) = operator
            && self.next_can_start_type()
        {
            self.next_token();
            let operand = self.parse_type_operator();
            return self.finish_type(start, TypeKind::Operator(operator, Box::new(operand)));
        }
        if self.is_word("infer") && self.next_can_start_type() {
            self.next_token();
            return self.parse_infer_type(start);
        }
        self.parse_postfix_type()
    }

    fn parse_infer_type(&mut self, start: u32) -> TypeNode {
        let name = self.parse_identifier();
        let mut constraint = None;
        if self.is_word("extends") && !self.has_preceding_line_break() {
            let mark = self.mark();
            let outer_disallows = self.disallow_conditional_types;
            self.next_token();
            self.disallow_conditional_types = true;
            let ty = self.parse_type();
            self.disallow_conditional_types = outer_disallows;
            // `infer U extends X ? A : B` is a conditional on the infer type, not a constraint.
            if !outer_disallows && self.is_token(SyntaxKind::Question) {
                self.rewind(mark);
            } else {
                constraint = Some(Box::new(ty));
            }
        }
        let param = TypeParam {
            span: self.span_from(start),
            modifiers: Default::default(),
            name,
            constraint,
            default: None,
        };
        self.finish_type(start, TypeKind::Infer(Box::new(param)))
    }

    fn parse_postfix_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        let mut ty = self.parse_primary_type();
        while self.is_token(SyntaxKind::OpenBracket) && !self.has_preceding_line_break() {
            self.next_token();
            if self.parse_optional(SyntaxKind::CloseBracket) {
                ty = self.finish_type(start, TypeKind::Array(Box::new(ty)));
            } else {
                let index = self.parse_nested_type();
                self.parse_expected(SyntaxKind::CloseBracket);
                ty = self.finish_type(start, TypeKind::IndexedAccess(Box::new(ty), Box::new(index)));
            }
        }
        ty
    }

    fn literal(&mut self, kind: ExprKind) -> TypeNode {
        let start = self.token_pos();
        let span = self.token_span();
        self.next_token();
        self.finish_type(start, TypeKind::Literal(Expr { span, kind }))
    }

    fn parse_primary_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        let negative_literal = self.is_token(SyntaxKind::Minus)
            && matches!(
                self.peek_token(),
                SyntaxKind::NumericLiteral | SyntaxKind::BigIntLiteral
            );
        match self.current_token {
            SyntaxKind::OpenParen => {
                self.next_token();
                let inner = self.parse_nested_type();
                self.parse_expected(SyntaxKind::CloseParen);
                self.finish_type(start, TypeKind::Paren(Box::new(inner)))
            }
            SyntaxKind::OpenBracket => self.parse_tuple_type(),
            SyntaxKind::OpenBrace => {
                if self.is_start_of_mapped_type() {
                    self.parse_mapped_type()
                } else {
                    let saved = std::mem::replace(&mut self.disallow_conditional_types, false);
                    let members = self.parse_object_type_members();
                    self.disallow_conditional_types = saved;
                    self.finish_type(start, TypeKind::TypeLiteral(members))
                }
            }
            SyntaxKind::StringLiteral => {
                let value = self.token_value().to_string();
                self.literal(ExprKind::Str(crate::ast::Str {
                    value,
                    span: self.token_span(),
                }))
            }
            SyntaxKind::NumericLiteral => {
                let value = self.token_value().to_string();
                self.literal(ExprKind::Num(value))
            }
            SyntaxKind::BigIntLiteral => {
                let value = self.token_value().to_string();
                self.literal(ExprKind::BigInt(value))
            }
            SyntaxKind::Minus if negative_literal => {
                self.next_token();
                let operand_span = self.token_span();
                let operand = if self.is_token(SyntaxKind::BigIntLiteral) {
                    ExprKind::BigInt(self.token_value().to_string())
                } else {
                    ExprKind::Num(self.token_value().to_string())
                };
                self.next_token();
                let expr = Expr {
                    span: self.span_from(start),
                    kind: ExprKind::Unary(
                        "-",
                        Box::new(Expr {
                            span: operand_span,
                            kind: operand,
                        }),
                    ),
                };
                self.finish_type(start, TypeKind::Literal(expr))
            }
            SyntaxKind::NoSubstitutionTemplate | SyntaxKind::TemplateHead => {
                self.parse_template_literal_type()
            }
            SyntaxKind::Identifier => self.parse_type_from_word(start),
            _ => {
                self.error_at_token(diagnostic_codes::TYPE_EXPECTED, &[]);
                if !matches!(
                    self.current_token,
                    SyntaxKind::CloseParen
                        | SyntaxKind::CloseBracket
                        | SyntaxKind::CloseBrace
                        | SyntaxKind::Comma
                        | SyntaxKind::Semicolon
                        | SyntaxKind::GreaterThan
                        | SyntaxKind::Equals
                        | SyntaxKind::EndOfFile
                ) {
                    self.next_token();
                }
                TypeNode {
                    span: Span::new(start, start),
                    kind: TypeKind::Keyword("any".to_string()),
                }
            }
        }
    }

    fn parse_type_from_word(&mut self, start: u32) -> TypeNode {
        let word = self.token_value().to_string();
        let next = self.peek_token();
        match word.as_str() {
            "typeof" if next != SyntaxKind::Dot => {
                self.next_token();
                if self.is_word("import") {
                    return self.parse_import_type(start, true);
                }
                let name = self.parse_entity_name();
                let type_args = self.parse_type_arguments_on_same_line();
                self.finish_type(start, TypeKind::Query { name, type_args })
            }
            "import" if next == SyntaxKind::OpenParen => self.parse_import_type(start, false),
            "this" if next != SyntaxKind::Dot => {
                self.next_token();
                self.finish_type(start, TypeKind::This)
            }
            "true" | "false" if next != SyntaxKind::Dot => self.literal(ExprKind::Bool(word == "true")),
            _ if next != SyntaxKind::Dot && KEYWORD_TYPES.contains(&word.as_str()) => {
                self.next_token();
                self.finish_type(start, TypeKind::Keyword(word))
            }
            _ => {
                let name = self.parse_entity_name();
                let type_args = self.parse_type_arguments_on_same_line();
                self.finish_type(start, TypeKind::Reference { name, type_args })
            }
        }
    }

    fn parse_type_arguments_on_same_line(&mut self) -> Vec<TypeNode> {
        if self.is_token(SyntaxKind::LessThan) && !self.has_preceding_line_break() {
            self.parse_type_arguments()
        } else {
            Vec::new()
        }
    }

    /// `<A, B>`; the current token must be `<`.
    pub(crate) fn parse_type_arguments(&mut self) -> Vec<TypeNode> {
        let mut args = Vec::new();
        self.parse_expected(SyntaxKind::LessThan);
        while !self.is_token(SyntaxKind::GreaterThan) && !self.is_token(SyntaxKind::EndOfFile) {
            args.push(self.parse_nested_type());
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::GreaterThan);
        args
    }

    fn parse_import_type(&mut self, start: u32, is_typeof: bool) -> TypeNode {
        self.parse_expected_word("import");
        self.parse_expected(SyntaxKind::OpenParen);
        let argument = self.parse_module_specifier();
        if self.parse_optional(SyntaxKind::Comma) && self.is_token(SyntaxKind::OpenBrace) {
            self.skip_balanced();
            self.parse_optional(SyntaxKind::Comma);
        }
        self.parse_expected(SyntaxKind::CloseParen);
        let qualifier = if self.parse_optional(SyntaxKind::Dot) {
            Some(self.parse_entity_name())
        } else {
            None
        };
        let type_args = self.parse_type_arguments_on_same_line();
        self.finish_type(
            start,
            TypeKind::Import {
                is_typeof,
                argument,
                qualifier,
                type_args,
            },
        )
    }

    fn parse_tuple_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBracket);
        let mut elements = Vec::new();
        while !self.is_token(SyntaxKind::CloseBracket) && !self.is_token(SyntaxKind::EndOfFile) {
            let element_start = self.token_pos();
            let rest = self.parse_optional(SyntaxKind::DotDotDot);
            let named = self.is_token(SyntaxKind::Identifier)
                && self.look_ahead(|p| {
                    p.next_token();
                    if p.parse_optional(SyntaxKind::Question) {
                        return p.is_token(SyntaxKind::Colon);
                    }
                    p.is_token(SyntaxKind::Colon)
                });
            let (name, optional, ty) = if named {
                let name: Ident = self.parse_identifier();
                let optional = self.parse_optional(SyntaxKind::Question);
                self.parse_expected(SyntaxKind::Colon);
                (Some(name), optional, self.parse_nested_type())
            } else {
                let ty = self.parse_nested_type();
                let optional = self.parse_optional(SyntaxKind::Question);
                (None, optional, ty)
            };
            elements.push(TupleElement {
                span: self.span_from(element_start),
                name,
                optional,
                rest,
                ty,
            });
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBracket);
        self.finish_type(start, TypeKind::Tuple(elements))
    }

    fn is_start_of_mapped_type(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            if p.is_token(SyntaxKind::Plus) || p.is_token(SyntaxKind::Minus) {
                p.next_token();
                return p.is_word("readonly");
            }
            if p.is_word("readonly") {
                p.next_token();
            }
            if !p.parse_optional(SyntaxKind::OpenBracket) || !p.is_token(SyntaxKind::Identifier) {
                return false;
            }
            p.next_token();
            p.is_word("in")
        })
    }

    fn parse_mapped_modifier(&mut self, word: Option<&str>) -> Option<MappedModifier> {
        let prefix = if self.parse_optional(SyntaxKind::Plus) {
            Some(MappedModifier::Plus)
        } else if self.parse_optional(SyntaxKind::Minus) {
            Some(MappedModifier::Minus)
        } else {
            None
        };
        let present = match word {
            Some(word) => self.parse_optional_word(word),
            None => self.parse_optional(SyntaxKind::Question),
        };
        match (prefix, present) {
            (Some(prefix), true) => Some(prefix),
            (Some(prefix), false) => {
                self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &[word.unwrap_or("?")]);
                Some(prefix)
            }
            (None, true) => Some(MappedModifier::Present),
            (None, false) => None,
        }
    }

    fn parse_mapped_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        let saved = std::mem::replace(&mut self.disallow_conditional_types, false);
        self.parse_expected(SyntaxKind::OpenBrace);
        let readonly = self.parse_mapped_modifier(Some("readonly"));
        self.parse_expected(SyntaxKind::OpenBracket);
        let param_start = self.token_pos();
        let name = self.parse_identifier();
        self.parse_expected_word("in");
        let constraint = self.parse_type();
        let type_param = TypeParam {
            span: self.span_from(param_start),
            modifiers: Default::default(),
            name,
            constraint: Some(Box::new(constraint)),
            default: None,
        };
        let name_type = if self.parse_optional_word("as") {
            Some(Box::new(self.parse_type()))
        } else {
            None
        };
        self.parse_expected(SyntaxKind::CloseBracket);
        let optional = self.parse_mapped_modifier(None);
        let ty = if self.parse_optional(SyntaxKind::Colon) {
            Some(Box::new(self.parse_type()))
        } else {
            None
        };
        if !self.parse_optional(SyntaxKind::Semicolon) {
            self.parse_optional(SyntaxKind::Comma);
        }
        self.parse_expected(SyntaxKind::CloseBrace);
        self.disallow_conditional_types = saved;
        self.finish_type(
            start,
            TypeKind::Mapped {
                readonly,
                type_param: Box::new(type_param),
                name_type,
                optional,
                ty,
            },
        )
    }

    fn parse_template_literal_type(&mut self) -> TypeNode {
        let start = self.token_pos();
        let head = self.token_value().to_string();
        if self.is_token(SyntaxKind::NoSubstitutionTemplate) {
            self.next_token();
            return self.finish_type(
                start,
                TypeKind::TemplateLiteral {
                    head,
                    spans: Vec::new(),
                },
            );
        }
        self.next_token();
        let mut spans = Vec::new();
        loop {
            let ty = self.parse_nested_type();
            if !self.is_token(SyntaxKind::CloseBrace) {
                self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &["}"]);
                spans.push((ty, String::new()));
                break;
            }
            let kind = self.scanner.rescan_template_continuation();
            self.current_token = kind;
            let text = self.token_value().to_string();
            self.next_token();
            spans.push((ty, text));
            if kind != SyntaxKind::TemplateMiddle {
                break;
            }
        }
        self.finish_type(start, TypeKind::TemplateLiteral { head, spans })
    }
}
