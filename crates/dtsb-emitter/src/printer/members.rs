//! Printer - members, signatures, parameters and binding names.

use super::Printer;
use dtsb_parser::ast::{
    AccessorKind, BindingElement, BindingName, Member, MemberKind, Param, PropName, Signature,
    TypeParam,
};

impl Printer {
    /// ` {` + one member per line + `}` at the current indentation.
    pub(super) fn emit_member_block(&mut self, members: &[Member]) {
        self.write(" {");
        self.write_line();
        self.increase_indent();
        for member in members {
            self.emit_member(member);
        }
        self.decrease_indent();
        self.write_indent();
        self.write("}");
    }

    pub(super) fn emit_member(&mut self, member: &Member) {
        self.write_doc(member.doc.as_deref());
        self.write_indent();
        self.queue_source_mapping(member.span);
        self.write_modifiers(member.modifiers);

        match &member.kind {
            MemberKind::Property {
                name,
                optional,
                ty,
                init,
            } => {
                self.emit_property_name(name);
                if *optional {
                    self.write("?");
                }
                if let Some(ty) = ty {
                    self.write(": ");
                    self.emit_type(ty);
                }
                if let Some(init) = init {
                    self.write(" = ");
                    self.emit_expression(init);
                }
            }
            MemberKind::Method {
                name,
                optional,
                sig,
            } => {
                self.emit_property_name(name);
                if *optional {
                    self.write("?");
                }
                self.emit_signature(sig, ": ");
            }
            MemberKind::Constructor(sig) => {
                self.write("constructor");
                self.emit_signature(sig, ": ");
            }
            MemberKind::Accessor { kind, name, sig } => {
                self.write(match kind {
                    AccessorKind::Get => "get ",
                    AccessorKind::Set => "set ",
                });
                self.emit_property_name(name);
                self.emit_signature(sig, ": ");
            }
            MemberKind::CallSignature(sig) => self.emit_signature(sig, ": "),
            MemberKind::ConstructSignature(sig) => {
                self.write("new ");
                self.emit_signature(sig, ": ");
            }
            MemberKind::Index { params, ty } => {
                self.write("[");
                self.write_comma_list(params, Self::emit_parameter);
                self.write("]: ");
                self.emit_type(ty);
            }
        }

        self.pending_source_pos = None;
        self.write(";");
        self.write_line();
    }

    pub(super) fn emit_property_name(&mut self, name: &PropName) {
        match name {
            PropName::Ident(ident) | PropName::Private(ident) => self.write_identifier(ident),
            PropName::Str(literal) => self.write_string_literal(literal),
            PropName::Num(text, span) => {
                self.queue_source_mapping(*span);
                self.write(text);
            }
            PropName::Computed(expr) => {
                self.write("[");
                self.emit_expression(expr);
                self.write("]");
            }
        }
    }

    /// Type parameters, parameter list and return type. `return_separator` is
    /// `": "` for declarations and `" => "` for function types.
    pub(super) fn emit_signature(&mut self, sig: &Signature, return_separator: &str) {
        self.emit_type_parameters(&sig.type_params);
        self.write("(");
        self.write_comma_list(&sig.params, Self::emit_parameter);
        self.write(")");
        if let Some(ret) = &sig.ret {
            self.write(return_separator);
            self.emit_type(ret);
        }
    }

    pub(super) fn emit_type_parameters(&mut self, params: &[TypeParam]) {
        if params.is_empty() {
            return;
        }
        self.write("<");
        self.write_comma_list(params, Self::emit_type_parameter);
        self.write(">");
    }

    pub(super) fn emit_type_parameter(&mut self, param: &TypeParam) {
        self.write_modifiers(param.modifiers);
        self.write_identifier(&param.name);
        if let Some(constraint) = &param.constraint {
            self.write(" extends ");
            self.emit_type(constraint);
        }
        if let Some(default) = &param.default {
            self.write(" = ");
            self.emit_type(default);
        }
    }

    fn emit_parameter(&mut self, param: &Param) {
        self.write_modifiers(param.modifiers);
        if param.rest {
            self.write("...");
        }
        self.emit_binding_name(&param.name);
        if param.optional {
            self.write("?");
        }
        if let Some(ty) = &param.ty {
            self.write(": ");
            self.emit_type(ty);
        }
        if let Some(init) = &param.init {
            self.write(" = ");
            self.emit_expression(init);
        }
    }

    pub(super) fn emit_binding_name(&mut self, name: &BindingName) {
        match name {
            BindingName::Ident(ident) => self.write_identifier(ident),
            BindingName::Object(elements) => {
                if elements.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                self.write_comma_list(elements, Self::emit_binding_element);
                self.write(" }");
            }
            BindingName::Array(elements) => {
                self.write("[");
                let mut first = true;
                for element in elements {
                    if !first {
                        self.write(", ");
                    }
                    first = false;
                    if let Some(element) = element {
                        self.emit_binding_element(element);
                    }
                }
                // A trailing hole needs its own comma to survive re-parsing.
                if matches!(elements.last(), Some(None)) {
                    self.write(",");
                }
                self.write("]");
            }
        }
    }

    fn emit_binding_element(&mut self, element: &BindingElement) {
        if element.rest {
            self.write("...");
        }
        if let Some(property) = &element.property_name {
            self.emit_property_name(property);
            self.write(": ");
        }
        self.emit_binding_name(&element.name);
        if let Some(init) = &element.init {
            self.write(" = ");
            self.emit_expression(init);
        }
    }
}
