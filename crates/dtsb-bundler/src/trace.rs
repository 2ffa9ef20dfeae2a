//! Reference Tracer.
//!
//! Computes the free identifiers of a statement: names referenced but not bound
//! by a type parameter, parameter, `infer` clause, mapped-type key, enum member
//! or namespace-local declaration inside it. One handler per syntax kind; the
//! statement table is total and rejects `Unknown` statements.
//!
//! Binders live in the declaration space they introduce. Parameters and enum
//! members shadow value positions only (`typeof x`, expressions, computed keys);
//! type parameters, `infer` names and mapped keys shadow type references only.
//! Namespace locals shadow both.
//!
//! The walk is over `&mut` trees so the same rules drive tracing and renaming:
//! a [`ReferenceVisitor`] receives each free reference, each top-level binding
//! name, and each `import("m")` type node.

use crate::error::BundleError;
use crate::symbols::declared_names;
use dtsb_parser::ast::{
    BindingName, EntityName, ExportClause, Expr, ExprKind, ExprWithTypeArgs, Ident,
    ImportBindings, Member, MemberKind, ModuleBody, ModuleDecl, ModuleName, ModuleReference,
    Param, PropName, Signature, Stmt, StmtKind, TypeKind, TypeNode, TypeParam,
};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;

pub trait ReferenceVisitor {
    /// A free identifier in reference position.
    fn reference(&mut self, ident: &mut Ident);

    /// The binding name of a top-level declaration or import.
    fn declaration(&mut self, _ident: &mut Ident) {}

    /// An `import("m")` type node, after its type arguments were traced.
    fn import_type(&mut self, _node: &mut TypeNode) {}
}

/// An `import("specifier").Name` dependency.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImportTypeRef {
    pub specifier: String,
    /// First qualifier segment, if any.
    pub name: Option<String>,
}

/// Free references of one statement, deduplicated in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct StatementRefs {
    pub names: IndexSet<String>,
    pub import_types: Vec<ImportTypeRef>,
}

impl ReferenceVisitor for StatementRefs {
    fn reference(&mut self, ident: &mut Ident) {
        if !self.names.contains(&ident.name) {
            self.names.insert(ident.name.clone());
        }
    }

    fn import_type(&mut self, node: &mut TypeNode) {
        if let TypeKind::Import {
            argument, qualifier, ..
        } = &node.kind
        {
            let import = ImportTypeRef {
                specifier: argument.value.clone(),
                name: qualifier.as_ref().map(|q| q.first().name.clone()),
            };
            if !self.import_types.contains(&import) {
                self.import_types.push(import);
            }
        }
    }
}

/// Walk `stmt` as a top-level statement of `module`.
pub fn trace_statement(
    module: &str,
    stmt: &mut Stmt,
    visitor: &mut dyn ReferenceVisitor,
) -> Result<(), BundleError> {
    let mut tracer = Tracer {
        module,
        visitor,
        scopes: Vec::new(),
    };
    tracer.statement(stmt, true)
}

/// Free identifier names of `stmt`, in first-seen order.
pub fn free_identifiers(module: &str, stmt: &Stmt) -> Result<Vec<String>, BundleError> {
    let mut stmt = stmt.clone();
    let mut refs = StatementRefs::default();
    trace_statement(module, &mut stmt, &mut refs)?;
    Ok(refs.names.into_iter().collect())
}

/// Declaration space a binder lives in, or a reference resolves in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Space {
    Value,
    Type,
    Both,
}

struct Scope {
    space: Space,
    names: FxHashSet<String>,
}

struct Tracer<'a> {
    module: &'a str,
    visitor: &'a mut dyn ReferenceVisitor,
    scopes: Vec<Scope>,
}

impl Tracer<'_> {
    fn is_bound(&self, name: &str, space: Space) -> bool {
        self.scopes
            .iter()
            .rev()
            .filter(|scope| scope.space == Space::Both || scope.space == space)
            .any(|scope| scope.names.contains(name))
    }

    fn push_scope(&mut self, space: Space, names: impl IntoIterator<Item = String>) {
        self.scopes.push(Scope {
            space,
            names: names.into_iter().collect(),
        });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn reference(&mut self, ident: &mut Ident, space: Space) {
        if !ident.name.is_empty() && !self.is_bound(&ident.name, space) {
            self.visitor.reference(ident);
        }
    }

    fn declaration(&mut self, ident: &mut Ident, top_level: bool) {
        if top_level {
            self.visitor.declaration(ident);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn statement(&mut self, stmt: &mut Stmt, top_level: bool) -> Result<(), BundleError> {
        let kind_name = stmt.kind_name();
        match &mut stmt.kind {
            StmtKind::Import(decl) => {
                if let Some(default) = &mut decl.default {
                    self.declaration(default, top_level);
                }
                match &mut decl.bindings {
                    Some(ImportBindings::Namespace(name)) => self.declaration(name, top_level),
                    Some(ImportBindings::Named(specifiers)) => {
                        for specifier in specifiers {
                            self.declaration(&mut specifier.name, top_level);
                        }
                    }
                    None => {}
                }
            }
            StmtKind::ImportEquals(decl) => {
                self.declaration(&mut decl.name, top_level);
                if let ModuleReference::Entity(entity) = &mut decl.target {
                    self.entity_name(entity, Space::Value);
                }
            }
            StmtKind::Export(decl) => {
                if decl.specifier.is_none()
                    && let ExportClause::Named(specifiers) = &mut decl.clause
                {
                    for specifier in specifiers {
                        // `export { a }` names its local and its export with one
                        // identifier; split them when the local gets renamed.
                        let mut local = specifier
                            .property_name
                            .clone()
                            .unwrap_or_else(|| specifier.name.clone());
                        self.reference(&mut local, Space::Value);
                        if local.name != specifier.local_name() {
                            specifier.property_name = Some(local);
                        }
                    }
                }
            }
            StmtKind::ExportAssignment(assignment) => self.expression(&mut assignment.expr),
            StmtKind::NamespaceExport(_) => {}
            StmtKind::Class(class) => {
                if let Some(name) = &mut class.name {
                    self.declaration(name, top_level);
                }
                self.push_scope(Space::Type, type_param_names(&class.type_params));
                self.type_params(&mut class.type_params);
                if let Some(extends) = &mut class.extends {
                    self.heritage(extends, Space::Value);
                }
                for implements in &mut class.implements {
                    self.heritage(implements, Space::Type);
                }
                for member in &mut class.members {
                    self.member(member);
                }
                self.pop_scope();
            }
            StmtKind::Function(function) => {
                if let Some(name) = &mut function.name {
                    self.declaration(name, top_level);
                }
                self.signature(&mut function.sig);
            }
            StmtKind::Interface(interface) => {
                self.declaration(&mut interface.name, top_level);
                self.push_scope(Space::Type, type_param_names(&interface.type_params));
                self.type_params(&mut interface.type_params);
                for extends in &mut interface.extends {
                    self.heritage(extends, Space::Type);
                }
                for member in &mut interface.members {
                    self.member(member);
                }
                self.pop_scope();
            }
            StmtKind::TypeAlias(alias) => {
                self.declaration(&mut alias.name, top_level);
                self.push_scope(Space::Type, type_param_names(&alias.type_params));
                self.type_params(&mut alias.type_params);
                self.type_node(&mut alias.ty);
                self.pop_scope();
            }
            StmtKind::Enum(decl) => {
                self.declaration(&mut decl.name, top_level);
                let members = decl
                    .members
                    .iter()
                    .filter_map(|member| match &member.name {
                        PropName::Ident(ident) => Some(ident.name.clone()),
                        PropName::Str(literal) => Some(literal.value.clone()),
                        _ => None,
                    })
                    .collect::<Vec<_>>();
                self.push_scope(Space::Value, members);
                for member in &mut decl.members {
                    self.prop_name(&mut member.name);
                    if let Some(init) = &mut member.init {
                        self.expression(init);
                    }
                }
                self.pop_scope();
            }
            StmtKind::Module(module) => {
                if let ModuleName::Ident(name) = &mut module.name {
                    self.declaration(name, top_level);
                }
                self.module_body(module)?;
            }
            StmtKind::Variable(decl) => {
                for declarator in &mut decl.declarations {
                    self.binding_name(&mut declarator.name, top_level);
                    if let Some(ty) = &mut declarator.ty {
                        self.type_node(ty);
                    }
                    if let Some(init) = &mut declarator.init {
                        self.expression(init);
                    }
                }
            }
            StmtKind::Unknown(_) => {
                return Err(BundleError::UnsupportedSyntax {
                    module: self.module.to_string(),
                    kind: kind_name,
                });
            }
        }
        Ok(())
    }

    fn module_body(&mut self, module: &mut ModuleDecl) -> Result<(), BundleError> {
        match &mut module.body {
            Some(ModuleBody::Block(statements)) => {
                let locals = statements
                    .iter()
                    .flat_map(declared_names)
                    .collect::<Vec<_>>();
                self.push_scope(Space::Both, locals);
                let result = statements
                    .iter_mut()
                    .try_for_each(|stmt| self.statement(stmt, false));
                self.pop_scope();
                result
            }
            Some(ModuleBody::Nested(inner)) => {
                let name = match &inner.name {
                    ModuleName::Ident(ident) => Some(ident.name.clone()),
                    _ => None,
                };
                self.push_scope(Space::Both, name);
                let result = self.module_body(inner);
                self.pop_scope();
                result
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Members, signatures, bindings
    // =========================================================================

    fn member(&mut self, member: &mut Member) {
        match &mut member.kind {
            MemberKind::Property { name, ty, init, .. } => {
                self.prop_name(name);
                if let Some(ty) = ty {
                    self.type_node(ty);
                }
                if let Some(init) = init {
                    self.expression(init);
                }
            }
            MemberKind::Method { name, sig, .. } => {
                self.prop_name(name);
                self.signature(sig);
            }
            // Accessor names only matter when computed; `prop_name` skips the rest.
            MemberKind::Accessor { name, sig, .. } => {
                self.prop_name(name);
                self.signature(sig);
            }
            MemberKind::Constructor(sig)
            | MemberKind::CallSignature(sig)
            | MemberKind::ConstructSignature(sig) => self.signature(sig),
            MemberKind::Index { params, ty } => {
                for param in params {
                    if let Some(ty) = &mut param.ty {
                        self.type_node(ty);
                    }
                }
                self.type_node(ty);
            }
        }
    }

    fn prop_name(&mut self, name: &mut PropName) {
        if let PropName::Computed(expr) = name {
            self.expression(expr);
        }
    }

    fn signature(&mut self, sig: &mut Signature) {
        let params = sig
            .params
            .iter()
            .flat_map(|param| param.name.bound_idents())
            .map(|ident| ident.name.clone())
            .collect::<Vec<_>>();
        self.push_scope(Space::Type, type_param_names(&sig.type_params));
        self.push_scope(Space::Value, params);
        self.type_params(&mut sig.type_params);
        for param in &mut sig.params {
            self.param(param);
        }
        if let Some(ret) = &mut sig.ret {
            self.type_node(ret);
        }
        self.pop_scope();
        self.pop_scope();
    }

    fn param(&mut self, param: &mut Param) {
        self.binding_name(&mut param.name, false);
        if let Some(ty) = &mut param.ty {
            self.type_node(ty);
        }
        if let Some(init) = &mut param.init {
            self.expression(init);
        }
    }

    fn type_params(&mut self, params: &mut [TypeParam]) {
        for param in params {
            if let Some(constraint) = &mut param.constraint {
                self.type_node(constraint);
            }
            if let Some(default) = &mut param.default {
                self.type_node(default);
            }
        }
    }

    /// Binding names bind; their defaults and computed keys reference.
    fn binding_name(&mut self, name: &mut BindingName, top_level: bool) {
        match name {
            BindingName::Ident(ident) => self.declaration(ident, top_level),
            BindingName::Object(elements) => {
                for element in elements {
                    if let Some(property) = &mut element.property_name {
                        self.prop_name(property);
                    }
                    self.binding_name(&mut element.name, top_level);
                    if let Some(init) = &mut element.init {
                        self.expression(init);
                    }
                }
            }
            BindingName::Array(elements) => {
                for element in elements.iter_mut().flatten() {
                    self.binding_name(&mut element.name, top_level);
                    if let Some(init) = &mut element.init {
                        self.expression(init);
                    }
                }
            }
        }
    }

    /// `extends`/`implements` clauses: a class extends a value, everything
    /// else names a type.
    fn heritage(&mut self, heritage: &mut ExprWithTypeArgs, space: Space) {
        self.heritage_expr(&mut heritage.expr, space);
        for arg in &mut heritage.type_args {
            self.type_node(arg);
        }
    }

    fn heritage_expr(&mut self, expr: &mut Expr, space: Space) {
        match &mut expr.kind {
            ExprKind::Ident(ident) => self.reference(ident, space),
            ExprKind::Member(object, _) => self.heritage_expr(object, space),
            _ => self.expression(expr),
        }
    }

    fn entity_name(&mut self, entity: &mut EntityName, space: Space) {
        if let Some(first) = entity.parts.first_mut() {
            self.reference(first, space);
        }
    }

    // =========================================================================
    // Types and expressions
    // =========================================================================

    fn type_node(&mut self, ty: &mut TypeNode) {
        if let TypeKind::Import { type_args, .. } = &mut ty.kind {
            for arg in type_args.iter_mut() {
                self.type_node(arg);
            }
            self.visitor.import_type(ty);
            return;
        }

        match &mut ty.kind {
            TypeKind::Keyword(_) | TypeKind::This | TypeKind::Import { .. } => {}
            TypeKind::Reference { name, type_args } => {
                self.entity_name(name, Space::Type);
                for arg in type_args {
                    self.type_node(arg);
                }
            }
            TypeKind::Query { name, type_args } => {
                self.entity_name(name, Space::Value);
                for arg in type_args {
                    self.type_node(arg);
                }
            }
            TypeKind::Literal(expr) => self.expression(expr),
            TypeKind::TemplateLiteral { spans, .. } => {
                for (span_ty, _) in spans {
                    self.type_node(span_ty);
                }
            }
            TypeKind::Array(inner) | TypeKind::Paren(inner) | TypeKind::Operator(_, inner) => {
                self.type_node(inner);
            }
            TypeKind::Tuple(elements) => {
                for element in elements {
                    self.type_node(&mut element.ty);
                }
            }
            TypeKind::Union(types) | TypeKind::Intersection(types) => {
                for ty in types {
                    self.type_node(ty);
                }
            }
            TypeKind::Function { sig, .. } => self.signature(sig),
            TypeKind::TypeLiteral(members) => {
                for member in members {
                    self.member(member);
                }
            }
            TypeKind::IndexedAccess(object, index) => {
                self.type_node(object);
                self.type_node(index);
            }
            TypeKind::Conditional {
                check,
                extends,
                true_ty,
                false_ty,
            } => {
                self.type_node(check);
                let mut inferred = Vec::new();
                collect_infer_names(extends, &mut inferred);
                self.push_scope(Space::Type, inferred);
                self.type_node(extends);
                self.type_node(true_ty);
                self.pop_scope();
                self.type_node(false_ty);
            }
            TypeKind::Infer(param) => {
                if let Some(constraint) = &mut param.constraint {
                    self.type_node(constraint);
                }
            }
            TypeKind::Mapped {
                type_param,
                name_type,
                ty: value,
                ..
            } => {
                if let Some(constraint) = &mut type_param.constraint {
                    self.type_node(constraint);
                }
                self.push_scope(Space::Type, [type_param.name.name.clone()]);
                if let Some(name_type) = name_type {
                    self.type_node(name_type);
                }
                if let Some(value) = value {
                    self.type_node(value);
                }
                self.pop_scope();
            }
            // The parameter name of `x is T` is not a reference.
            TypeKind::Predicate { ty: target, .. } => {
                if let Some(target) = target {
                    self.type_node(target);
                }
            }
        }
    }

    fn expression(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Ident(ident) => self.reference(ident, Space::Value),
            ExprKind::Member(object, _) => self.expression(object),
            ExprKind::Element(object, index) => {
                self.expression(object);
                self.expression(index);
            }
            ExprKind::Call(callee, args) => {
                self.expression(callee);
                for arg in args {
                    self.expression(arg);
                }
            }
            ExprKind::Unary(_, operand) | ExprKind::Paren(operand) => self.expression(operand),
            ExprKind::Binary(_, left, right) => {
                self.expression(left);
                self.expression(right);
            }
            ExprKind::Str(_)
            | ExprKind::Num(_)
            | ExprKind::BigInt(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::This
            | ExprKind::Raw(_) => {}
        }
    }
}

fn type_param_names(params: &[TypeParam]) -> Vec<String> {
    params.iter().map(|p| p.name.name.clone()).collect()
}

/// Names introduced by `infer X` anywhere inside a conditional's `extends` clause.
fn collect_infer_names(ty: &TypeNode, out: &mut Vec<String>) {
    match &ty.kind {
        TypeKind::Infer(param) => {
            out.push(param.name.name.clone());
            if let Some(constraint) = &param.constraint {
                collect_infer_names(constraint, out);
            }
        }
        TypeKind::Reference { type_args, .. }
        | TypeKind::Query { type_args, .. }
        | TypeKind::Import { type_args, .. } => {
            for arg in type_args {
                collect_infer_names(arg, out);
            }
        }
        TypeKind::Array(inner) | TypeKind::Paren(inner) | TypeKind::Operator(_, inner) => {
            collect_infer_names(inner, out);
        }
        TypeKind::Tuple(elements) => {
            for element in elements {
                collect_infer_names(&element.ty, out);
            }
        }
        TypeKind::Union(types) | TypeKind::Intersection(types) => {
            for ty in types {
                collect_infer_names(ty, out);
            }
        }
        TypeKind::TemplateLiteral { spans, .. } => {
            for (span_ty, _) in spans {
                collect_infer_names(span_ty, out);
            }
        }
        TypeKind::IndexedAccess(object, index) => {
            collect_infer_names(object, out);
            collect_infer_names(index, out);
        }
        TypeKind::Function { sig, .. } => {
            for ty in sig.params.iter().filter_map(|p| p.ty.as_ref()) {
                collect_infer_names(ty, out);
            }
            if let Some(ret) = &sig.ret {
                collect_infer_names(ret, out);
            }
        }
        TypeKind::TypeLiteral(members) => {
            for member in members {
                if let MemberKind::Property { ty: Some(ty), .. } = &member.kind {
                    collect_infer_names(ty, out);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "tests/trace_tests.rs"]
mod trace_tests;
