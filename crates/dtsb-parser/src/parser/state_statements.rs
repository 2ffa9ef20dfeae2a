//! Parser state - statement and declaration parsing methods

use super::ParserState;
use crate::ast::{
    BindingElement, BindingName, ClassDecl, EntityName, EnumDecl, EnumMember, ExportAssignment,
    ExportClause, ExportDecl, ExportSpecifier, FunctionDecl, Ident, ImportBindings, ImportDecl,
    ImportEqualsDecl, ImportSpecifier, InterfaceDecl, ModifierFlags, ModuleBody, ModuleDecl,
    ModuleName, ModuleReference, PropName, Stmt, StmtKind, Str, TypeAliasDecl, VarDeclarator, VarKind,
    VariableDecl,
};
use crate::scanner::SyntaxKind;
use dtsb_common::Span;
use dtsb_common::diagnostics::diagnostic_codes;

/// A top-level statement that makes its file an ES module.
pub(super) fn marks_module(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Import(_) | StmtKind::Export(_) | StmtKind::ExportAssignment(_) => true,
        StmtKind::ImportEquals(decl) => {
            matches!(decl.target, ModuleReference::Require(_)) || stmt.has(ModifierFlags::EXPORT)
        }
        StmtKind::NamespaceExport(_) => false,
        _ => stmt.has(ModifierFlags::EXPORT),
    }
}

impl ParserState {
    // =========================================================================
    // Statement lists
    // =========================================================================

    /// Parse statements until end of file (top level) or a closing `}` (blocks).
    pub(crate) fn parse_statement_list(&mut self, top_level: bool) -> Vec<Stmt> {
        let mut statements = Vec::new();
        loop {
            match self.current_token {
                SyntaxKind::EndOfFile => break,
                SyntaxKind::CloseBrace if !top_level => break,
                SyntaxKind::Semicolon => {
                    self.next_token();
                }
                _ => {
                    let before = self.token_pos();
                    statements.push(self.parse_statement());
                    if self.token_pos() == before && !self.is_token(SyntaxKind::EndOfFile) {
                        self.next_token();
                    }
                }
            }
        }
        statements
    }

    fn parse_block_statements(&mut self) -> Vec<Stmt> {
        self.parse_expected(SyntaxKind::OpenBrace);
        let statements = self.parse_statement_list(false);
        self.parse_expected(SyntaxKind::CloseBrace);
        statements
    }

    /// Parse one statement, including its leading modifiers and doc comment.
    pub(crate) fn parse_statement(&mut self) -> Stmt {
        let start = self.token_pos();
        let doc = self.scanner.token_doc().map(str::to_string);
        let mut modifiers = ModifierFlags::empty();

        while self.is_token(SyntaxKind::At) {
            // Decorators have no meaning in declaration output.
            self.next_token();
            self.parse_left_hand_side_expression();
        }

        if self.is_word("export") {
            self.next_token();
            if let Some(kind) = self.parse_export_form() {
                return self.finish_statement(start, doc, ModifierFlags::empty(), kind);
            }
            modifiers |= ModifierFlags::EXPORT;
            if self.is_word("default") {
                self.next_token();
                modifiers |= ModifierFlags::DEFAULT;
                if !self.is_default_declaration_start() {
                    let expr = self.parse_assignment_expression();
                    self.parse_semicolon();
                    let kind = StmtKind::ExportAssignment(ExportAssignment {
                        is_export_equals: false,
                        expr,
                    });
                    return self.finish_statement(start, doc, ModifierFlags::empty(), kind);
                }
            }
        }

        if self.is_word("declare") && self.next_is_identifier_on_same_line() {
            self.next_token();
            modifiers |= ModifierFlags::DECLARE;
        }

        let kind = self.parse_declaration(&mut modifiers);
        self.finish_statement(start, doc, modifiers, kind)
    }

    fn finish_statement(
        &mut self,
        start: u32,
        doc: Option<String>,
        modifiers: ModifierFlags,
        kind: StmtKind,
    ) -> Stmt {
        Stmt {
            span: self.span_from(start),
            doc,
            modifiers,
            kind,
        }
    }

    fn next_is_identifier_on_same_line(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            (p.is_token(SyntaxKind::Identifier) || p.is_token(SyntaxKind::StringLiteral))
                && !p.has_preceding_line_break()
        })
    }

    fn is_default_declaration_start(&mut self) -> bool {
        if self.is_word("class") || self.is_word("function") {
            return true;
        }
        if self.is_word("interface") {
            return self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::Identifier)
            });
        }
        (self.is_word("abstract") && self.peek_word("class"))
            || (self.is_word("async") && self.peek_word("function"))
    }

    /// Forms that can only follow `export`: `export =`, `export {..}`, `export *`,
    /// `export as namespace`. Returns `None` for `export <declaration>`.
    fn parse_export_form(&mut self) -> Option<StmtKind> {
        if self.parse_optional(SyntaxKind::Equals) {
            let expr = self.parse_assignment_expression();
            self.parse_semicolon();
            return Some(StmtKind::ExportAssignment(ExportAssignment {
                is_export_equals: true,
                expr,
            }));
        }
        if self.is_word("as") && self.peek_word("namespace") {
            self.next_token();
            self.next_token();
            let name = self.parse_identifier();
            self.parse_semicolon();
            return Some(StmtKind::NamespaceExport(name));
        }
        let type_only = self.is_word("type")
            && matches!(self.peek_token(), SyntaxKind::OpenBrace | SyntaxKind::Asterisk);
        if type_only {
            self.next_token();
        }
        if self.is_token(SyntaxKind::OpenBrace) || self.is_token(SyntaxKind::Asterisk) {
            return Some(StmtKind::Export(self.parse_export_declaration(type_only)));
        }
        None
    }

    fn parse_export_declaration(&mut self, type_only: bool) -> ExportDecl {
        let clause = if self.parse_optional(SyntaxKind::Asterisk) {
            if self.parse_optional_word("as") {
                ExportClause::StarAs(self.parse_module_export_name())
            } else {
                ExportClause::Star
            }
        } else {
            ExportClause::Named(self.parse_specifier_list(|type_only, property_name, name| {
                ExportSpecifier {
                    type_only,
                    property_name,
                    name,
                }
            }))
        };
        let specifier = if self.parse_optional_word("from") {
            Some(self.parse_module_specifier())
        } else {
            if matches!(clause, ExportClause::Star | ExportClause::StarAs(_)) {
                self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &["from"]);
            }
            None
        };
        self.skip_import_attributes();
        self.parse_semicolon();
        ExportDecl {
            type_only,
            clause,
            specifier,
        }
    }

    /// `{ a, b as c, type d }` shared by import and export clauses.
    fn parse_specifier_list<T>(
        &mut self,
        make: impl Fn(bool, Option<Ident>, Ident) -> T,
    ) -> Vec<T> {
        let mut specifiers = Vec::new();
        self.parse_expected(SyntaxKind::OpenBrace);
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
            let type_only = self.is_word("type")
                && self.look_ahead(|p| {
                    p.next_token();
                    if p.is_word("as") {
                        // `type as x` renames a binding called `type`; `type as` alone does not.
                        p.next_token();
                        return p.is_token(SyntaxKind::Identifier) && p.peek_token() != SyntaxKind::Identifier;
                    }
                    p.is_token(SyntaxKind::Identifier) || p.is_token(SyntaxKind::StringLiteral)
                });
            if type_only {
                self.next_token();
            }
            let first = self.parse_module_export_name();
            let specifier = if self.parse_optional_word("as") {
                let local = self.parse_module_export_name();
                make(type_only, Some(first), local)
            } else {
                make(type_only, None, first)
            };
            specifiers.push(specifier);
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBrace);
        specifiers
    }

    /// An identifier or a string literal used as an export name.
    fn parse_module_export_name(&mut self) -> Ident {
        if self.is_token(SyntaxKind::StringLiteral) {
            let ident = Ident::new(self.token_value(), self.token_span());
            self.next_token();
            return ident;
        }
        self.parse_identifier()
    }

    pub(crate) fn parse_module_specifier(&mut self) -> Str {
        if self.is_token(SyntaxKind::StringLiteral) {
            let value = Str {
                value: self.token_value().to_string(),
                span: self.token_span(),
            };
            self.next_token();
            return value;
        }
        self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &["string literal"]);
        Str {
            value: String::new(),
            span: Span::new(self.token_pos(), self.token_pos()),
        }
    }

    /// `with { .. }` / `assert { .. }` on an import or re-export.
    fn skip_import_attributes(&mut self) {
        if (self.is_word("with") || self.is_word("assert")) && !self.has_preceding_line_break() {
            self.next_token();
            if self.is_token(SyntaxKind::OpenBrace) {
                self.skip_balanced();
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_declaration(&mut self, modifiers: &mut ModifierFlags) -> StmtKind {
        if self.is_word("abstract") && self.peek_word("class") {
            self.next_token();
            *modifiers |= ModifierFlags::ABSTRACT;
        } else if self.is_word("async") && self.peek_word("function") {
            self.next_token();
            *modifiers |= ModifierFlags::ASYNC;
        } else if self.is_word("const") && self.peek_word("enum") {
            self.next_token();
            *modifiers |= ModifierFlags::CONST;
        }

        if !self.is_token(SyntaxKind::Identifier) {
            return self.parse_unknown_statement();
        }
        let next = self.peek_token();
        let word = self.token_value().to_string();
        match word.as_str() {
            "class" => StmtKind::Class(self.parse_class_declaration()),
            "function" => StmtKind::Function(self.parse_function_declaration()),
            "interface" if next == SyntaxKind::Identifier => {
                StmtKind::Interface(self.parse_interface_declaration())
            }
            "type" if next == SyntaxKind::Identifier => {
                StmtKind::TypeAlias(self.parse_type_alias_declaration())
            }
            "enum" if next == SyntaxKind::Identifier => StmtKind::Enum(self.parse_enum_declaration()),
            "namespace" if next == SyntaxKind::Identifier => {
                self.next_token();
                StmtKind::Module(self.parse_namespace_body(true))
            }
            "module" if next == SyntaxKind::Identifier => {
                self.next_token();
                StmtKind::Module(self.parse_namespace_body(false))
            }
            "module" if next == SyntaxKind::StringLiteral => {
                StmtKind::Module(self.parse_ambient_module_declaration())
            }
            "global" if next == SyntaxKind::OpenBrace => {
                let span = self.token_span();
                self.next_token();
                let statements = self.parse_block_statements();
                StmtKind::Module(ModuleDecl {
                    name: ModuleName::Global(span),
                    namespace_keyword: false,
                    body: Some(ModuleBody::Block(statements)),
                })
            }
            "var" | "let" | "const" => StmtKind::Variable(self.parse_variable_statement()),
            "import" if !matches!(next, SyntaxKind::OpenParen | SyntaxKind::Dot) => {
                self.parse_import_declaration(modifiers.contains(ModifierFlags::EXPORT))
            }
            _ => self.parse_unknown_statement(),
        }
    }

    fn parse_import_declaration(&mut self, exported: bool) -> StmtKind {
        self.parse_expected_word("import");
        let type_only = self.is_word("type")
            && self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::OpenBrace)
                    || p.is_token(SyntaxKind::Asterisk)
                    || (p.is_token(SyntaxKind::Identifier) && !p.is_word("from"))
            });
        if type_only {
            self.next_token();
        }

        if self.is_token(SyntaxKind::Identifier) && self.peek_token() == SyntaxKind::Equals {
            let name = self.parse_identifier();
            self.next_token();
            let target = if self.is_word("require") && self.peek_token() == SyntaxKind::OpenParen {
                self.next_token();
                self.next_token();
                let specifier = self.parse_module_specifier();
                self.parse_expected(SyntaxKind::CloseParen);
                ModuleReference::Require(specifier)
            } else {
                ModuleReference::Entity(self.parse_entity_name())
            };
            self.parse_semicolon();
            return StmtKind::ImportEquals(ImportEqualsDecl {
                type_only,
                name,
                target,
            });
        }

        if exported {
            self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &["="]);
        }

        if self.is_token(SyntaxKind::StringLiteral) {
            let specifier = self.parse_module_specifier();
            self.skip_import_attributes();
            self.parse_semicolon();
            return StmtKind::Import(ImportDecl {
                type_only,
                default: None,
                bindings: None,
                specifier,
            });
        }

        let mut default = None;
        if self.is_token(SyntaxKind::Identifier) {
            default = Some(self.parse_identifier());
            self.parse_optional(SyntaxKind::Comma);
        }
        let bindings = if self.parse_optional(SyntaxKind::Asterisk) {
            self.parse_expected_word("as");
            Some(ImportBindings::Namespace(self.parse_identifier()))
        } else if self.is_token(SyntaxKind::OpenBrace) {
            Some(ImportBindings::Named(self.parse_specifier_list(
                |type_only, property_name, name| ImportSpecifier {
                    type_only,
                    property_name,
                    name,
                },
            )))
        } else {
            None
        };
        self.parse_expected_word("from");
        let specifier = self.parse_module_specifier();
        self.skip_import_attributes();
        self.parse_semicolon();
        StmtKind::Import(ImportDecl {
            type_only,
            default,
            bindings,
            specifier,
        })
    }

    /// Parse `A.B.C`.
    pub(crate) fn parse_entity_name(&mut self) -> EntityName {
        let mut parts = vec![self.parse_identifier()];
        while self.is_token(SyntaxKind::Dot) {
            self.next_token();
            if self.is_token(SyntaxKind::PrivateIdentifier) {
                parts.push(Ident::new(self.token_value(), self.token_span()));
                self.next_token();
            } else {
                parts.push(self.parse_identifier());
            }
        }
        EntityName { parts }
    }

    fn parse_class_declaration(&mut self) -> ClassDecl {
        self.parse_expected_word("class");
        let name = if self.is_token(SyntaxKind::Identifier)
            && !self.is_word("extends")
            && !self.is_word("implements")
        {
            Some(self.parse_identifier())
        } else {
            None
        };
        let type_params = self.parse_type_parameters();
        let mut extends = None;
        let mut implements = Vec::new();
        loop {
            if self.parse_optional_word("extends") {
                extends = Some(self.parse_expression_with_type_arguments());
            } else if self.parse_optional_word("implements") {
                implements.push(self.parse_expression_with_type_arguments());
                while self.parse_optional(SyntaxKind::Comma) {
                    implements.push(self.parse_expression_with_type_arguments());
                }
            } else {
                break;
            }
        }
        let members = self.parse_class_members();
        ClassDecl {
            name,
            type_params,
            extends,
            implements,
            members,
        }
    }

    fn parse_function_declaration(&mut self) -> FunctionDecl {
        self.parse_expected_word("function");
        let generator = self.parse_optional(SyntaxKind::Asterisk);
        let name = if self.is_token(SyntaxKind::Identifier) {
            Some(self.parse_identifier())
        } else {
            None
        };
        let sig = self.parse_signature(SyntaxKind::Colon);
        self.parse_function_body_or_semicolon();
        FunctionDecl {
            name,
            generator,
            sig,
        }
    }

    /// Bodies are not part of declaration output; skip one if present.
    pub(crate) fn parse_function_body_or_semicolon(&mut self) {
        if self.is_token(SyntaxKind::OpenBrace) {
            self.skip_balanced();
        } else {
            self.parse_semicolon();
        }
    }

    fn parse_interface_declaration(&mut self) -> InterfaceDecl {
        self.parse_expected_word("interface");
        let name = self.parse_identifier();
        let type_params = self.parse_type_parameters();
        let mut extends = Vec::new();
        if self.parse_optional_word("extends") {
            extends.push(self.parse_expression_with_type_arguments());
            while self.parse_optional(SyntaxKind::Comma) {
                extends.push(self.parse_expression_with_type_arguments());
            }
        }
        let members = self.parse_object_type_members();
        InterfaceDecl {
            name,
            type_params,
            extends,
            members,
        }
    }

    fn parse_type_alias_declaration(&mut self) -> TypeAliasDecl {
        self.parse_expected_word("type");
        let name = self.parse_identifier();
        let type_params = self.parse_type_parameters();
        self.parse_expected(SyntaxKind::Equals);
        let ty = self.parse_type();
        self.parse_semicolon();
        TypeAliasDecl {
            name,
            type_params,
            ty,
        }
    }

    fn parse_enum_declaration(&mut self) -> EnumDecl {
        self.parse_expected_word("enum");
        let name = self.parse_identifier();
        let mut members = Vec::new();
        self.parse_expected(SyntaxKind::OpenBrace);
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
            let start = self.token_pos();
            let doc = self.scanner.token_doc().map(str::to_string);
            let member_name = self.parse_property_name();
            let init = if self.parse_optional(SyntaxKind::Equals) {
                Some(self.parse_assignment_expression())
            } else {
                None
            };
            members.push(EnumMember {
                span: self.span_from(start),
                doc,
                name: member_name,
                init,
            });
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBrace);
        EnumDecl { name, members }
    }

    /// After `namespace`/`module`: a possibly dotted name and a block.
    fn parse_namespace_body(&mut self, namespace_keyword: bool) -> ModuleDecl {
        let name = self.parse_identifier();
        let body = if self.parse_optional(SyntaxKind::Dot) {
            ModuleBody::Nested(Box::new(self.parse_namespace_body(namespace_keyword)))
        } else {
            ModuleBody::Block(self.parse_block_statements())
        };
        ModuleDecl {
            name: ModuleName::Ident(name),
            namespace_keyword,
            body: Some(body),
        }
    }

    fn parse_ambient_module_declaration(&mut self) -> ModuleDecl {
        self.parse_expected_word("module");
        let name = self.parse_module_specifier();
        let body = if self.is_token(SyntaxKind::OpenBrace) {
            Some(ModuleBody::Block(self.parse_block_statements()))
        } else {
            self.parse_semicolon();
            None
        };
        ModuleDecl {
            name: ModuleName::Str(name),
            namespace_keyword: false,
            body,
        }
    }

    fn parse_variable_statement(&mut self) -> VariableDecl {
        let kind = match self.token_value() {
            "var" => VarKind::Var,
            "let" => VarKind::Let,
            _ => VarKind::Const,
        };
        self.next_token();
        let mut declarations = Vec::new();
        loop {
            let start = self.token_pos();
            let name = self.parse_binding_name();
            self.parse_optional(SyntaxKind::Exclamation);
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
            declarations.push(VarDeclarator {
                span: self.span_from(start),
                name,
                ty,
                init,
            });
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_semicolon();
        VariableDecl { kind, declarations }
    }

    /// Identifier, `{ .. }` or `[ .. ]` binding.
    pub(crate) fn parse_binding_name(&mut self) -> BindingName {
        match self.current_token {
            SyntaxKind::OpenBrace => {
                self.next_token();
                let mut elements = Vec::new();
                while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
                    let start = self.token_pos();
                    let rest = self.parse_optional(SyntaxKind::DotDotDot);
                    let (property_name, name) = if rest {
                        (None, BindingName::Ident(self.parse_identifier()))
                    } else {
                        let property = self.parse_property_name();
                        if self.parse_optional(SyntaxKind::Colon) {
                            (Some(property), self.parse_binding_name())
                        } else {
                            match property {
                                PropName::Ident(ident) => (None, BindingName::Ident(ident)),
                                other => {
                                    self.error_at_token(diagnostic_codes::TOKEN_EXPECTED, &[":"]);
                                    (Some(other), BindingName::Ident(Ident::new("", self.token_span())))
                                }
                            }
                        }
                    };
                    let init = if self.parse_optional(SyntaxKind::Equals) {
                        Some(self.parse_assignment_expression())
                    } else {
                        None
                    };
                    elements.push(BindingElement {
                        span: self.span_from(start),
                        rest,
                        property_name,
                        name,
                        init,
                    });
                    if !self.parse_optional(SyntaxKind::Comma) {
                        break;
                    }
                }
                self.parse_expected(SyntaxKind::CloseBrace);
                BindingName::Object(elements)
            }
            SyntaxKind::OpenBracket => {
                self.next_token();
                let mut elements = Vec::new();
                while !self.is_token(SyntaxKind::CloseBracket) && !self.is_token(SyntaxKind::EndOfFile) {
                    if self.parse_optional(SyntaxKind::Comma) {
                        elements.push(None);
                        continue;
                    }
                    let start = self.token_pos();
                    let rest = self.parse_optional(SyntaxKind::DotDotDot);
                    let name = self.parse_binding_name();
                    let init = if self.parse_optional(SyntaxKind::Equals) {
                        Some(self.parse_assignment_expression())
                    } else {
                        None
                    };
                    elements.push(Some(BindingElement {
                        span: self.span_from(start),
                        rest,
                        property_name: None,
                        name,
                        init,
                    }));
                    if !self.parse_optional(SyntaxKind::Comma) {
                        break;
                    }
                }
                self.parse_expected(SyntaxKind::CloseBracket);
                BindingName::Array(elements)
            }
            _ => BindingName::Ident(self.parse_identifier()),
        }
    }

    /// Skip a statement the parser does not understand, keeping its text.
    fn parse_unknown_statement(&mut self) -> StmtKind {
        let start = self.token_pos();
        self.error_at_token(diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED, &[]);
        let mut consumed = false;
        loop {
            match self.current_token {
                SyntaxKind::EndOfFile | SyntaxKind::CloseBrace => break,
                SyntaxKind::Semicolon => {
                    self.next_token();
                    break;
                }
                SyntaxKind::OpenBrace | SyntaxKind::OpenParen | SyntaxKind::OpenBracket => {
                    self.skip_balanced();
                    consumed = true;
                }
                _ => {
                    if consumed && self.has_preceding_line_break() {
                        break;
                    }
                    self.next_token();
                    consumed = true;
                }
            }
        }
        StmtKind::Unknown(self.source_slice(self.span_from(start)))
    }
}
