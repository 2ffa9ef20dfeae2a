//! Printer - type nodes.

use super::Printer;
use dtsb_parser::ast::{EntityName, MappedModifier, Member, TupleElement, TypeKind, TypeNode};

impl Printer {
    pub(super) fn emit_type(&mut self, ty: &TypeNode) {
        match &ty.kind {
            TypeKind::Keyword(keyword) => {
                self.queue_source_mapping(ty.span);
                self.write(keyword);
            }
            TypeKind::This => {
                self.queue_source_mapping(ty.span);
                self.write("this");
            }
            TypeKind::Reference { name, type_args } => {
                self.emit_entity_name(name);
                self.emit_type_arguments(type_args);
            }
            TypeKind::Literal(expr) => self.emit_expression(expr),
            TypeKind::TemplateLiteral { head, spans } => {
                self.write("`");
                self.write_raw(head);
                for (span_ty, text) in spans {
                    self.write_raw("${");
                    self.emit_type(span_ty);
                    self.write_raw("}");
                    self.write_raw(text);
                }
                self.write_raw("`");
            }
            TypeKind::Array(element) => {
                self.emit_postfix_operand(element);
                self.write("[]");
            }
            TypeKind::Tuple(elements) => {
                self.write("[");
                self.write_comma_list(elements, Self::emit_tuple_element);
                self.write("]");
            }
            TypeKind::Union(types) => self.emit_type_list(types, " | "),
            TypeKind::Intersection(types) => self.emit_type_list(types, " & "),
            TypeKind::Function {
                constructor,
                is_abstract,
                sig,
            } => {
                if *is_abstract {
                    self.write("abstract ");
                }
                if *constructor {
                    self.write("new ");
                }
                self.emit_signature(sig, " => ");
            }
            TypeKind::TypeLiteral(members) => self.emit_type_literal(members),
            TypeKind::Paren(inner) => {
                self.write("(");
                self.emit_type(inner);
                self.write(")");
            }
            TypeKind::Query { name, type_args } => {
                self.write("typeof ");
                self.emit_entity_name(name);
                self.emit_type_arguments(type_args);
            }
            TypeKind::Operator(op, operand) => {
                self.write(op.as_str());
                self.write_space();
                self.emit_type(operand);
            }
            TypeKind::IndexedAccess(object, index) => {
                self.emit_postfix_operand(object);
                self.write("[");
                self.emit_type(index);
                self.write("]");
            }
            TypeKind::Conditional {
                check,
                extends,
                true_ty,
                false_ty,
            } => {
                self.emit_type(check);
                self.write(" extends ");
                self.emit_type(extends);
                self.write(" ? ");
                self.emit_type(true_ty);
                self.write(" : ");
                self.emit_type(false_ty);
            }
            TypeKind::Infer(param) => {
                self.write("infer ");
                self.emit_type_parameter(param);
            }
            TypeKind::Mapped {
                readonly,
                type_param,
                name_type,
                optional,
                ty: value,
            } => {
                self.write("{");
                self.write_line();
                self.increase_indent();
                self.write_indent();
                match readonly {
                    Some(MappedModifier::Present) => self.write("readonly "),
                    Some(MappedModifier::Plus) => self.write("+readonly "),
                    Some(MappedModifier::Minus) => self.write("-readonly "),
                    None => {}
                }
                self.write("[");
                self.write_identifier(&type_param.name);
                self.write(" in ");
                if let Some(constraint) = &type_param.constraint {
                    self.emit_type(constraint);
                }
                if let Some(name_type) = name_type {
                    self.write(" as ");
                    self.emit_type(name_type);
                }
                self.write("]");
                match optional {
                    Some(MappedModifier::Present) => self.write("?"),
                    Some(MappedModifier::Plus) => self.write("+?"),
                    Some(MappedModifier::Minus) => self.write("-?"),
                    None => {}
                }
                if let Some(value) = value {
                    self.write(": ");
                    self.emit_type(value);
                }
                self.write(";");
                self.write_line();
                self.decrease_indent();
                self.write_indent();
                self.write("}");
            }
            TypeKind::Import {
                is_typeof,
                argument,
                qualifier,
                type_args,
            } => {
                if *is_typeof {
                    self.write("typeof ");
                }
                self.write("import(");
                self.write_string_literal(argument);
                self.write(")");
                if let Some(qualifier) = qualifier {
                    self.write(".");
                    self.emit_entity_name(qualifier);
                }
                self.emit_type_arguments(type_args);
            }
            TypeKind::Predicate {
                asserts,
                param,
                ty: target,
            } => {
                if *asserts {
                    self.write("asserts ");
                }
                self.write_identifier(param);
                if let Some(target) = target {
                    self.write(" is ");
                    self.emit_type(target);
                }
            }
        }
    }

    /// `<A, B>`; nothing for an empty list.
    pub(super) fn emit_type_arguments(&mut self, args: &[TypeNode]) {
        if args.is_empty() {
            return;
        }
        self.write("<");
        self.write_comma_list(args, Self::emit_type);
        self.write(">");
    }

    pub(super) fn emit_entity_name(&mut self, entity: &EntityName) {
        let mut first = true;
        for part in &entity.parts {
            if !first {
                self.write(".");
            }
            first = false;
            self.write_identifier(part);
        }
    }

    fn emit_type_list(&mut self, types: &[TypeNode], separator: &str) {
        let mut first = true;
        for ty in types {
            if !first {
                self.write(separator);
            }
            first = false;
            // Function and conditional types would swallow the following members.
            if matches!(
                ty.kind,
                TypeKind::Function { .. } | TypeKind::Conditional { .. }
            ) {
                self.write("(");
                self.emit_type(ty);
                self.write(")");
            } else {
                self.emit_type(ty);
            }
        }
    }

    /// Operand of `[]` or `[K]`, parenthesized when it binds looser than the postfix.
    fn emit_postfix_operand(&mut self, ty: &TypeNode) {
        let needs_parens = matches!(
            ty.kind,
            TypeKind::Union(_)
                | TypeKind::Intersection(_)
                | TypeKind::Function { .. }
                | TypeKind::Conditional { .. }
                | TypeKind::Operator(..)
                | TypeKind::Infer(_)
        );
        if needs_parens {
            self.write("(");
            self.emit_type(ty);
            self.write(")");
        } else {
            self.emit_type(ty);
        }
    }

    fn emit_tuple_element(&mut self, element: &TupleElement) {
        if element.rest {
            self.write("...");
        }
        match &element.name {
            Some(name) => {
                self.write_identifier(name);
                if element.optional {
                    self.write("?");
                }
                self.write(": ");
                self.emit_type(&element.ty);
            }
            None => {
                self.emit_type(&element.ty);
                if element.optional {
                    self.write("?");
                }
            }
        }
    }

    fn emit_type_literal(&mut self, members: &[Member]) {
        if members.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        self.write_line();
        self.increase_indent();
        for member in members {
            self.emit_member(member);
        }
        self.decrease_indent();
        self.write_indent();
        self.write("}");
    }
}
