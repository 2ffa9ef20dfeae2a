//! Parser state - class / interface members, signatures and parameters

use super::ParserState;
use crate::ast::{
    AccessorKind, Ident, Member, MemberKind, ModifierFlags, Param, PropName, Signature, Str,
    TypeParam,
};
use crate::scanner::SyntaxKind;
use dtsb_common::diagnostics::diagnostic_codes;

const MEMBER_MODIFIERS: ModifierFlags = ModifierFlags::PUBLIC
    .union(ModifierFlags::PRIVATE)
    .union(ModifierFlags::PROTECTED)
    .union(ModifierFlags::STATIC)
    .union(ModifierFlags::READONLY)
    .union(ModifierFlags::ABSTRACT)
    .union(ModifierFlags::OVERRIDE)
    .union(ModifierFlags::DECLARE)
    .union(ModifierFlags::ACCESSOR)
    .union(ModifierFlags::ASYNC);

const PARAMETER_MODIFIERS: ModifierFlags = ModifierFlags::PUBLIC
    .union(ModifierFlags::PRIVATE)
    .union(ModifierFlags::PROTECTED)
    .union(ModifierFlags::READONLY)
    .union(ModifierFlags::OVERRIDE);

const TYPE_PARAMETER_MODIFIERS: ModifierFlags = ModifierFlags::IN
    .union(ModifierFlags::OUT)
    .union(ModifierFlags::CONST);

impl ParserState {
    pub(crate) fn parse_class_members(&mut self) -> Vec<Member> {
        self.parse_member_block(true)
    }

    /// Members of an interface body or a type literal.
    pub(crate) fn parse_object_type_members(&mut self) -> Vec<Member> {
        self.parse_member_block(false)
    }

    fn parse_member_block(&mut self, in_class: bool) -> Vec<Member> {
        let mut members = Vec::new();
        self.parse_expected(SyntaxKind::OpenBrace);
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
            if self.parse_optional(SyntaxKind::Semicolon) || self.parse_optional(SyntaxKind::Comma) {
                continue;
            }
            let before = self.token_pos();
            if let Some(member) = self.parse_member(in_class) {
                members.push(member);
            }
            if !self.parse_optional(SyntaxKind::Semicolon) {
                self.parse_optional(SyntaxKind::Comma);
            }
            if self.token_pos() == before {
                self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &["}"]);
                self.next_token();
            }
        }
        self.parse_expected(SyntaxKind::CloseBrace);
        members
    }

    /// Next token can start a property name (so the current word is a modifier).
    fn next_starts_property_name(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            matches!(
                p.current_token,
                SyntaxKind::Identifier
                    | SyntaxKind::PrivateIdentifier
                    | SyntaxKind::StringLiteral
                    | SyntaxKind::NumericLiteral
                    | SyntaxKind::OpenBracket
                    | SyntaxKind::Asterisk
                    | SyntaxKind::OpenBrace
            )
        })
    }

    fn parse_member(&mut self, in_class: bool) -> Option<Member> {
        let start = self.token_pos();
        let doc = self.scanner.token_doc().map(str::to_string);
        while in_class && self.is_token(SyntaxKind::At) {
            self.next_token();
            self.parse_left_hand_side_expression();
        }

        let mut modifiers = ModifierFlags::empty();
        while self.is_token(SyntaxKind::Identifier) {
            let Some(flag) = ModifierFlags::from_keyword(self.token_value()) else {
                break;
            };
            if !MEMBER_MODIFIERS.contains(flag) || !self.next_starts_property_name() {
                break;
            }
            modifiers |= flag;
            self.next_token();
        }

        if in_class && modifiers.contains(ModifierFlags::STATIC) && self.is_token(SyntaxKind::OpenBrace) {
            // Static initialization blocks carry no declarations.
            self.skip_balanced();
            return None;
        }

        let kind = self.parse_member_kind(in_class);
        Some(Member {
            span: self.span_from(start),
            doc,
            modifiers,
            kind,
        })
    }

    fn parse_member_kind(&mut self, in_class: bool) -> MemberKind {
        if (self.is_word("get") || self.is_word("set")) && self.next_starts_property_name() {
            let kind = if self.is_word("get") {
                AccessorKind::Get
            } else {
                AccessorKind::Set
            };
            self.next_token();
            let name = self.parse_property_name();
            let sig = self.parse_signature(SyntaxKind::Colon);
            if in_class {
                self.skip_member_body();
            }
            return MemberKind::Accessor { kind, name, sig };
        }

        let next = self.peek_token();
        let opens_signature = matches!(next, SyntaxKind::OpenParen | SyntaxKind::LessThan);
        if in_class && self.is_word("constructor") && opens_signature {
            self.next_token();
            let sig = self.parse_signature(SyntaxKind::Colon);
            self.skip_member_body();
            return MemberKind::Constructor(sig);
        }
        if !in_class && self.is_word("new") && opens_signature {
            self.next_token();
            return MemberKind::ConstructSignature(self.parse_signature(SyntaxKind::Colon));
        }
        if self.is_token(SyntaxKind::OpenParen) || self.is_token(SyntaxKind::LessThan) {
            return MemberKind::CallSignature(self.parse_signature(SyntaxKind::Colon));
        }
        if self.is_token(SyntaxKind::OpenBracket) && self.is_index_signature() {
            self.next_token();
            let params = self.parse_parameter_list(SyntaxKind::CloseBracket);
            self.parse_expected(SyntaxKind::CloseBracket);
            let ty = if self.parse_optional(SyntaxKind::Colon) {
                self.parse_type()
            } else {
                self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &[":"]);
                self.keyword_type("any")
            };
            return MemberKind::Index { params, ty };
        }

        self.parse_optional(SyntaxKind::Asterisk);
        let name = self.parse_property_name();
        let optional = self.parse_optional(SyntaxKind::Question);
        self.parse_optional(SyntaxKind::Exclamation);

        if self.is_token(SyntaxKind::OpenParen) || self.is_token(SyntaxKind::LessThan) {
            let sig = self.parse_signature(SyntaxKind::Colon);
            if in_class {
                self.skip_member_body();
            }
            return MemberKind::Method {
                name,
                optional,
                sig,
            };
        }

        let ty = if self.parse_optional(SyntaxKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };
        let init = if self.parse_optional(SyntaxKind::Equals) {
            Some(self.parse_assignment_expression())
        } else {
            None
        };
        MemberKind::Property {
            name,
            optional,
            ty,
            init,
        }
    }

    fn skip_member_body(&mut self) {
        if self.is_token(SyntaxKind::OpenBrace) {
            self.skip_balanced();
        }
    }

    /// `[` starts an index signature (`[key: string]`) rather than a computed name.
    fn is_index_signature(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            if p.is_token(SyntaxKind::DotDotDot) {
                return true;
            }
            while p.is_token(SyntaxKind::Identifier)
                && ModifierFlags::from_keyword(p.token_value()).is_some_and(|f| PARAMETER_MODIFIERS.contains(f))
                && p.peek_token() == SyntaxKind::Identifier
            {
                p.next_token();
            }
            if !p.is_token(SyntaxKind::Identifier) {
                return false;
            }
            p.next_token();
            matches!(
                p.current_token,
                SyntaxKind::Colon | SyntaxKind::Comma | SyntaxKind::Question
            )
        })
    }

    pub(crate) fn parse_property_name(&mut self) -> PropName {
        match self.current_token {
            SyntaxKind::Identifier => PropName::Ident(self.parse_identifier()),
            SyntaxKind::PrivateIdentifier => {
                let ident = Ident::new(self.token_value(), self.token_span());
                self.next_token();
                PropName::Private(ident)
            }
            SyntaxKind::StringLiteral => {
                let value = Str {
                    value: self.token_value().to_string(),
                    span: self.token_span(),
                };
                self.next_token();
                PropName::Str(value)
            }
            SyntaxKind::NumericLiteral | SyntaxKind::BigIntLiteral => {
                let name = PropName::Num(self.token_value().to_string(), self.token_span());
                self.next_token();
                name
            }
            SyntaxKind::OpenBracket => {
                self.next_token();
                let expr = self.parse_assignment_expression();
                self.parse_expected(SyntaxKind::CloseBracket);
                PropName::Computed(Box::new(expr))
            }
            _ => PropName::Ident(self.parse_identifier()),
        }
    }

    /// `<T>(a: A): R` where the return separator is `:` (declarations) or `=>` (types).
    pub(crate) fn parse_signature(&mut self, return_separator: SyntaxKind) -> Signature {
        let type_params = self.parse_type_parameters();
        self.parse_expected(SyntaxKind::OpenParen);
        let params = self.parse_parameter_list(SyntaxKind::CloseParen);
        self.parse_expected(SyntaxKind::CloseParen);
        let ret = if return_separator == SyntaxKind::EqualsGreaterThan {
            self.parse_expected(SyntaxKind::EqualsGreaterThan);
            Some(Box::new(self.parse_return_type()))
        } else if self.parse_optional(return_separator) {
            Some(Box::new(self.parse_return_type()))
        } else {
            None
        };
        Signature {
            type_params,
            params,
            ret,
        }
    }

    /// Parameters up to (not including) `close`.
    pub(crate) fn parse_parameter_list(&mut self, close: SyntaxKind) -> Vec<Param> {
        let mut params = Vec::new();
        while !self.is_token(close) && !self.is_token(SyntaxKind::EndOfFile) {
            let start = self.token_pos();
            while self.is_token(SyntaxKind::At) {
                self.next_token();
                self.parse_left_hand_side_expression();
            }
            let mut modifiers = ModifierFlags::empty();
            while self.is_token(SyntaxKind::Identifier) {
                let Some(flag) = ModifierFlags::from_keyword(self.token_value()) else {
                    break;
                };
                let followed_by_name = self.look_ahead(|p| {
                    p.next_token();
                    matches!(
                        p.current_token,
                        SyntaxKind::Identifier | SyntaxKind::OpenBrace | SyntaxKind::OpenBracket | SyntaxKind::DotDotDot
                    )
                });
                if !PARAMETER_MODIFIERS.contains(flag) || !followed_by_name {
                    break;
                }
                modifiers |= flag;
                self.next_token();
            }
            let rest = self.parse_optional(SyntaxKind::DotDotDot);
            let name = self.parse_binding_name();
            let optional = self.parse_optional(SyntaxKind::Question);
            let ty = if self.parse_optional(SyntaxKind::Colon) {
                Some(self.parse_type())
            } else {
                None
            };
            let init = if self.parse_optional(SyntaxKind::Equals) {
                Some(self.parse_assignment_expression())
            } else {
                None
            };
            params.push(Param {
                span: self.span_from(start),
                modifiers,
                rest,
                name,
                optional,
                ty,
                init,
            });
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        params
    }

    /// Optional `<T extends U = V, ...>`.
    pub(crate) fn parse_type_parameters(&mut self) -> Vec<TypeParam> {
        let mut params = Vec::new();
        if !self.parse_optional(SyntaxKind::LessThan) {
            return params;
        }
        while !self.is_token(SyntaxKind::GreaterThan) && !self.is_token(SyntaxKind::EndOfFile) {
            let start = self.token_pos();
            let mut modifiers = ModifierFlags::empty();
            while let Some(flag) = ModifierFlags::from_keyword(self.token_value())
                .filter(|f| self.is_token(SyntaxKind::Identifier) && TYPE_PARAMETER_MODIFIERS.contains(*f))
            {
                if self.peek_token() != SyntaxKind::Identifier {
                    break;
                }
                modifiers |= flag;
                self.next_token();
            }
            let name = self.parse_identifier();
            let constraint = if self.parse_optional_word("extends") {
                Some(Box::new(self.parse_type()))
            } else {
                None
            };
            let default = if self.parse_optional(SyntaxKind::Equals) {
                Some(Box::new(self.parse_type()))
            } else {
                None
            };
            params.push(TypeParam {
                span: self.span_from(start),
                modifiers,
                name,
                constraint,
                default,
            });
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::GreaterThan);
        params
    }
}
