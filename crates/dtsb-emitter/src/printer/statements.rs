//! Printer - statement forms.

use super::Printer;
use dtsb_parser::ast::{
    ClassDecl, EnumDecl, ExportAssignment, ExportClause, ExportDecl, ExprWithTypeArgs,
    FunctionDecl, ImportBindings, ImportDecl, ImportEqualsDecl, InterfaceDecl, ModuleBody,
    ModuleDecl, ModuleName, ModuleReference, Stmt, StmtKind, TypeAliasDecl, VariableDecl,
};

impl Printer {
    pub(super) fn emit_statement(&mut self, stmt: &Stmt) {
        self.write_doc(stmt.doc.as_deref());
        self.write_indent();
        self.queue_source_mapping(stmt.span);
        self.write_modifiers(stmt.modifiers);

        match &stmt.kind {
            StmtKind::Import(decl) => self.emit_import_declaration(decl),
            StmtKind::ImportEquals(decl) => self.emit_import_equals_declaration(decl),
            StmtKind::Export(decl) => self.emit_export_declaration(decl),
            StmtKind::ExportAssignment(assignment) => self.emit_export_assignment(assignment),
            StmtKind::NamespaceExport(name) => {
                self.write("export as namespace ");
                self.write_identifier(name);
                self.write(";");
            }
            StmtKind::Class(class) => self.emit_class_declaration(class),
            StmtKind::Function(function) => self.emit_function_declaration(function),
            StmtKind::Interface(interface) => self.emit_interface_declaration(interface),
            StmtKind::TypeAlias(alias) => self.emit_type_alias_declaration(alias),
            StmtKind::Enum(decl) => self.emit_enum_declaration(decl),
            StmtKind::Module(module) => self.emit_module_declaration(module),
            StmtKind::Variable(decl) => self.emit_variable_statement(decl),
            StmtKind::Unknown(text) => {
                tracing::trace!(len = text.len(), "printing unparsed statement verbatim");
                self.write(text.trim());
            }
        }

        self.pending_source_pos = None;
        self.write_line();
    }

    fn emit_import_declaration(&mut self, decl: &ImportDecl) {
        self.write("import ");
        if decl.type_only {
            self.write("type ");
        }
        if decl.default.is_none() && decl.bindings.is_none() {
            self.write_string_literal(&decl.specifier);
            self.write(";");
            return;
        }
        if let Some(default) = &decl.default {
            self.write_identifier(default);
            if decl.bindings.is_some() {
                self.write(", ");
            }
        }
        match &decl.bindings {
            Some(ImportBindings::Namespace(name)) => {
                self.write("* as ");
                self.write_identifier(name);
            }
            Some(ImportBindings::Named(specifiers)) => {
                if specifiers.is_empty() {
                    self.write("{}");
                } else {
                    self.write("{ ");
                    self.write_comma_list(specifiers, |p, specifier| {
                        if specifier.type_only {
                            p.write("type ");
                        }
                        if let Some(property) = &specifier.property_name {
                            p.write_module_export_name(property);
                            p.write(" as ");
                        }
                        p.write_module_export_name(&specifier.name);
                    });
                    self.write(" }");
                }
            }
            None => {}
        }
        self.write(" from ");
        self.write_string_literal(&decl.specifier);
        self.write(";");
    }

    fn emit_import_equals_declaration(&mut self, decl: &ImportEqualsDecl) {
        self.write("import ");
        if decl.type_only {
            self.write("type ");
        }
        self.write_identifier(&decl.name);
        self.write(" = ");
        match &decl.target {
            ModuleReference::Require(specifier) => {
                self.write("require(");
                self.write_string_literal(specifier);
                self.write(")");
            }
            ModuleReference::Entity(entity) => self.emit_entity_name(entity),
        }
        self.write(";");
    }

    fn emit_export_declaration(&mut self, decl: &ExportDecl) {
        // The `export` keyword is part of the statement, not a modifier.
        self.write("export ");
        if decl.type_only {
            self.write("type ");
        }
        match &decl.clause {
            ExportClause::Named(specifiers) => {
                if specifiers.is_empty() {
                    self.write("{}");
                } else {
                    self.write("{ ");
                    self.write_comma_list(specifiers, |p, specifier| {
                        if specifier.type_only {
                            p.write("type ");
                        }
                        if let Some(property) = &specifier.property_name {
                            p.write_module_export_name(property);
                            p.write(" as ");
                        }
                        p.write_module_export_name(&specifier.name);
                    });
                    self.write(" }");
                }
            }
            ExportClause::Star => self.write("*"),
            ExportClause::StarAs(name) => {
                self.write("* as ");
                self.write_identifier(name);
            }
        }
        if let Some(specifier) = &decl.specifier {
            self.write(" from ");
            self.write_string_literal(specifier);
        }
        self.write(";");
    }

    fn emit_export_assignment(&mut self, assignment: &ExportAssignment) {
        if assignment.is_export_equals {
            self.write("export = ");
        } else {
            self.write("export default ");
        }
        self.emit_expression(&assignment.expr);
        self.write(";");
    }

    fn emit_class_declaration(&mut self, class: &ClassDecl) {
        self.write("class");
        if let Some(name) = &class.name {
            self.write_space();
            self.write_identifier(name);
        }
        self.emit_type_parameters(&class.type_params);
        if let Some(extends) = &class.extends {
            self.write(" extends ");
            self.emit_heritage(extends);
        }
        if !class.implements.is_empty() {
            self.write(" implements ");
            self.write_comma_list(&class.implements, Self::emit_heritage);
        }
        self.emit_member_block(&class.members);
    }

    fn emit_function_declaration(&mut self, function: &FunctionDecl) {
        self.write("function");
        if function.generator {
            self.write("*");
        }
        if let Some(name) = &function.name {
            self.write_space();
            self.write_identifier(name);
        }
        self.emit_signature(&function.sig, ": ");
        self.write(";");
    }

    fn emit_interface_declaration(&mut self, interface: &InterfaceDecl) {
        self.write("interface ");
        self.write_identifier(&interface.name);
        self.emit_type_parameters(&interface.type_params);
        if !interface.extends.is_empty() {
            self.write(" extends ");
            self.write_comma_list(&interface.extends, Self::emit_heritage);
        }
        self.emit_member_block(&interface.members);
    }

    fn emit_type_alias_declaration(&mut self, alias: &TypeAliasDecl) {
        self.write("type ");
        self.write_identifier(&alias.name);
        self.emit_type_parameters(&alias.type_params);
        self.write(" = ");
        self.emit_type(&alias.ty);
        self.write(";");
    }

    fn emit_enum_declaration(&mut self, decl: &EnumDecl) {
        self.write("enum ");
        self.write_identifier(&decl.name);
        self.write(" {");
        self.write_line();
        self.increase_indent();
        let count = decl.members.len();
        for (idx, member) in decl.members.iter().enumerate() {
            self.write_doc(member.doc.as_deref());
            self.write_indent();
            self.emit_property_name(&member.name);
            if let Some(init) = &member.init {
                self.write(" = ");
                self.emit_expression(init);
            }
            if idx + 1 < count {
                self.write(",");
            }
            self.write_line();
        }
        self.decrease_indent();
        self.write_indent();
        self.write("}");
    }

    fn emit_module_declaration(&mut self, module: &ModuleDecl) {
        match &module.name {
            ModuleName::Global(_) => self.write("global"),
            ModuleName::Str(name) => {
                self.write("module ");
                self.write_string_literal(name);
            }
            ModuleName::Ident(name) => {
                self.write(if module.namespace_keyword {
                    "namespace "
                } else {
                    "module "
                });
                self.write_identifier(name);
            }
        }

        // `namespace A.B.C` flattens nested bodies into one dotted name.
        let mut body = module.body.as_ref();
        while let Some(ModuleBody::Nested(inner)) = body {
            if let ModuleName::Ident(name) = &inner.name {
                self.write(".");
                self.write_identifier(name);
            }
            body = inner.body.as_ref();
        }

        match body {
            Some(ModuleBody::Block(statements)) => {
                self.write(" {");
                self.write_line();
                self.increase_indent();
                for stmt in statements {
                    self.emit_statement(stmt);
                }
                self.decrease_indent();
                self.write_indent();
                self.write("}");
            }
            Some(ModuleBody::Nested(_)) => {}
            None => self.write(";"),
        }
    }

    fn emit_variable_statement(&mut self, decl: &VariableDecl) {
        self.write(decl.kind.as_str());
        self.write_space();
        self.write_comma_list(&decl.declarations, |p, declarator| {
            p.emit_binding_name(&declarator.name);
            if let Some(ty) = &declarator.ty {
                p.write(": ");
                p.emit_type(ty);
            }
            if let Some(init) = &declarator.init {
                p.write(" = ");
                p.emit_expression(init);
            }
        });
        self.write(";");
    }

    pub(super) fn emit_heritage(&mut self, heritage: &ExprWithTypeArgs) {
        self.emit_expression(&heritage.expr);
        self.emit_type_arguments(&heritage.type_args);
    }
}
