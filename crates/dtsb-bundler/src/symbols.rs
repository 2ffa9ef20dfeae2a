//! Symbol Extractor.
//!
//! One pass over a module's top-level statements records every name the module
//! declares, every import binding, and every export (local, re-export, star).
//! Extraction never mutates the tree; [`name_anonymous_defaults`] is the separate
//! normalization step that gives anonymous default exports their synthesized name.

use dtsb_common::path::file_stem;
use dtsb_parser::ast::{
    BindingName, EntityName, Expr, ExprKind, ExportClause, Ident, ImportBindings,
    ImportEqualsDecl, ModifierFlags, ModuleName, ModuleReference, Stmt, StmtKind, TypeKind,
    TypeNode, VarDeclarator, VarKind, VariableDecl,
};
use indexmap::IndexMap;
use smallvec::{SmallVec, smallvec};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Function,
    Interface,
    TypeAlias,
    Enum,
    Namespace,
    Variable,
    ImportBinding,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub exported: bool,
    pub is_default_export: bool,
    /// Declared by a script file: global, never renamed or pruned.
    pub is_ambient: bool,
    pub module: String,
    /// Indices of the statements that declare this name (overloads and merged
    /// declarations contribute more than one).
    pub statements: SmallVec<[usize; 1]>,
}

/// What an import binding pulls out of its module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
    /// `import x = require("m")`.
    ExportEquals,
}

impl ImportedName {
    pub(crate) fn from_export_name(name: &str) -> Self {
        match name {
            "default" => ImportedName::Default,
            "export=" => ImportedName::ExportEquals,
            other => ImportedName::Named(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub specifier: String,
    pub imported: ImportedName,
    pub type_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportEntry {
    /// Exports a name declared or imported in this module.
    Local(String),
    /// `export { imported as name } from "specifier"`.
    ReExport { specifier: String, imported: String },
    /// `export * as name from "specifier"`.
    Namespace { specifier: String },
}

/// The top-level symbol table of one module.
#[derive(Clone, Debug, Default)]
pub struct ModuleSymbols {
    /// Declared names and import bindings, in declaration order.
    pub symbols: IndexMap<String, Symbol>,
    pub imports: IndexMap<String, ImportBinding>,
    /// Keyed by exported name; `default` and `export=` included.
    pub exports: IndexMap<String, ExportEntry>,
    /// Specifiers of `export * from` statements.
    pub star_exports: Vec<String>,
    /// Specifiers of side-effect imports (`import "m"`).
    pub side_effect_imports: Vec<String>,
    /// `export as namespace X`.
    pub namespace_export: Option<String>,
    pub is_script: bool,
}

impl ModuleSymbols {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn is_import(&self, name: &str) -> bool {
        self.imports.contains_key(name)
    }
}

/// `default<PascalCaseStem>Export` for the module at `module_id`.
pub fn default_export_name(module_id: &str) -> String {
    let stem = file_stem(Path::new(module_id));
    let mut pascal = String::with_capacity(stem.len());
    for part in stem.split(|c: char| !c.is_alphanumeric() && c != '$') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            pascal.extend(first.to_uppercase());
            pascal.push_str(chars.as_str());
        }
    }
    format!("default{pascal}Export")
}

/// Names a statement introduces into the scope it appears in.
pub fn declared_names(stmt: &Stmt) -> SmallVec<[String; 2]> {
    match &stmt.kind {
        StmtKind::Class(class) => class.name.iter().map(|n| n.name.clone()).collect(),
        StmtKind::Function(function) => function.name.iter().map(|n| n.name.clone()).collect(),
        StmtKind::Interface(interface) => smallvec![interface.name.name.clone()],
        StmtKind::TypeAlias(alias) => smallvec![alias.name.name.clone()],
        StmtKind::Enum(decl) => smallvec![decl.name.name.clone()],
        StmtKind::Module(module) => match &module.name {
            ModuleName::Ident(name) => smallvec![name.name.clone()],
            ModuleName::Str(_) | ModuleName::Global(_) => SmallVec::new(),
        },
        StmtKind::Variable(decl) => decl
            .declarations
            .iter()
            .flat_map(|d| d.name.bound_idents())
            .map(|ident| ident.name.clone())
            .collect(),
        StmtKind::ImportEquals(decl) => smallvec![decl.name.name.clone()],
        StmtKind::Import(decl) => {
            let mut names = SmallVec::new();
            if let Some(default) = &decl.default {
                names.push(default.name.clone());
            }
            match &decl.bindings {
                Some(ImportBindings::Namespace(name)) => names.push(name.name.clone()),
                Some(ImportBindings::Named(specifiers)) => {
                    names.extend(specifiers.iter().map(|s| s.name.name.clone()));
                }
                None => {}
            }
            names
        }
        StmtKind::Export(_)
        | StmtKind::ExportAssignment(_)
        | StmtKind::NamespaceExport(_)
        | StmtKind::Unknown(_) => SmallVec::new(),
    }
}

/// True for `declare global { }` and `declare module "x" { }`.
pub fn is_ambient_module_declaration(stmt: &Stmt) -> bool {
    matches!(
        &stmt.kind,
        StmtKind::Module(module) if !matches!(module.name, ModuleName::Ident(_))
    )
}

fn symbol_kind(stmt: &Stmt) -> SymbolKind {
    match &stmt.kind {
        StmtKind::Class(_) => SymbolKind::Class,
        StmtKind::Function(_) => SymbolKind::Function,
        StmtKind::Interface(_) => SymbolKind::Interface,
        StmtKind::TypeAlias(_) => SymbolKind::TypeAlias,
        StmtKind::Enum(_) => SymbolKind::Enum,
        StmtKind::Module(_) => SymbolKind::Namespace,
        StmtKind::Variable(_) | StmtKind::ExportAssignment(_) => SymbolKind::Variable,
        _ => SymbolKind::ImportBinding,
    }
}

struct Extractor<'a> {
    module_id: &'a str,
    is_script: bool,
    out: ModuleSymbols,
}

impl Extractor<'_> {
    fn declare(&mut self, name: &str, kind: SymbolKind, stmt_index: usize) {
        let module = self.module_id;
        let is_ambient = self.is_script;
        let symbol = self
            .out
            .symbols
            .entry(name.to_string())
            .or_insert_with(|| Symbol {
                name: name.to_string(),
                kind,
                exported: false,
                is_default_export: false,
                is_ambient,
                module: module.to_string(),
                statements: SmallVec::new(),
            });
        if !symbol.statements.contains(&stmt_index) {
            symbol.statements.push(stmt_index);
        }
    }

    fn export_local(&mut self, exported: &str, local: &str) {
        self.out
            .exports
            .entry(exported.to_string())
            .or_insert_with(|| ExportEntry::Local(local.to_string()));
    }

    /// `export { a }` may precede the declaration of `a`, so flags are set last.
    fn mark_exported_symbols(&mut self) {
        for (exported, entry) in &self.out.exports {
            let ExportEntry::Local(local) = entry else {
                continue;
            };
            if let Some(symbol) = self.out.symbols.get_mut(local) {
                symbol.exported = true;
                if exported == "default" {
                    symbol.is_default_export = true;
                }
            }
        }
    }

    fn import(
        &mut self,
        ident: &Ident,
        specifier: &str,
        imported: ImportedName,
        type_only: bool,
        stmt_index: usize,
    ) {
        self.declare(&ident.name, SymbolKind::ImportBinding, stmt_index);
        self.out.imports.insert(
            ident.name.clone(),
            ImportBinding {
                local: ident.name.clone(),
                specifier: specifier.to_string(),
                imported,
                type_only,
            },
        );
    }

    fn statement(&mut self, index: usize, stmt: &Stmt) {
        let exported = stmt.has(ModifierFlags::EXPORT);
        let is_default = stmt.has(ModifierFlags::DEFAULT);

        match &stmt.kind {
            StmtKind::Import(decl) => {
                let specifier = decl.specifier.value.as_str();
                if decl.default.is_none() && decl.bindings.is_none() {
                    self.out.side_effect_imports.push(specifier.to_string());
                }
                if let Some(default) = &decl.default {
                    let imported = ImportedName::Default;
                    self.import(default, specifier, imported, decl.type_only, index);
                }
                match &decl.bindings {
                    Some(ImportBindings::Namespace(name)) => {
                        let imported = ImportedName::Namespace;
                        self.import(name, specifier, imported, decl.type_only, index);
                    }
                    Some(ImportBindings::Named(specifiers)) => {
                        for spec in specifiers {
                            let imported = ImportedName::from_export_name(spec.imported_name());
                            let type_only = decl.type_only || spec.type_only;
                            self.import(&spec.name, specifier, imported, type_only, index);
                        }
                    }
                    None => {}
                }
            }
            StmtKind::ImportEquals(ImportEqualsDecl {
                name,
                target,
                type_only,
            }) => {
                match target {
                    ModuleReference::Require(specifier) => {
                        let imported = ImportedName::ExportEquals;
                        self.import(name, &specifier.value, imported, *type_only, index);
                    }
                    ModuleReference::Entity(_) => {
                        self.declare(&name.name, SymbolKind::ImportBinding, index);
                    }
                }
                if exported {
                    self.export_local(&name.name, &name.name);
                }
            }
            StmtKind::Export(decl) => match (&decl.clause, &decl.specifier) {
                (ExportClause::Named(specifiers), None) => {
                    for spec in specifiers {
                        self.export_local(&spec.name.name, spec.local_name());
                    }
                }
                (ExportClause::Named(specifiers), Some(from)) => {
                    for spec in specifiers {
                        self.out
                            .exports
                            .entry(spec.name.name.clone())
                            .or_insert_with(|| ExportEntry::ReExport {
                                specifier: from.value.clone(),
                                imported: spec.local_name().to_string(),
                            });
                    }
                }
                (ExportClause::Star, Some(from)) => {
                    self.out.star_exports.push(from.value.clone());
                }
                (ExportClause::StarAs(name), Some(from)) => {
                    self.out
                        .exports
                        .entry(name.name.clone())
                        .or_insert_with(|| ExportEntry::Namespace {
                            specifier: from.value.clone(),
                        });
                }
                (ExportClause::Star | ExportClause::StarAs(_), None) => {}
            },
            StmtKind::ExportAssignment(assignment) => {
                let key = if assignment.is_export_equals {
                    "export="
                } else {
                    "default"
                };
                match &assignment.expr.kind {
                    ExprKind::Ident(ident) => self.export_local(key, &ident.name),
                    _ => {
                        // Not normalized yet: the synthesized binding stands in.
                        let synthesized = default_export_name(self.module_id);
                        self.declare(&synthesized, SymbolKind::Variable, index);
                        self.export_local(key, &synthesized);
                    }
                }
            }
            StmtKind::NamespaceExport(name) => {
                self.out.namespace_export = Some(name.name.clone());
            }
            StmtKind::Module(_) if is_ambient_module_declaration(stmt) => {}
            StmtKind::Unknown(_) => {}
            _ => {
                let mut names = declared_names(stmt);
                let anonymous = names.is_empty()
                    && matches!(stmt.kind, StmtKind::Class(_) | StmtKind::Function(_));
                if anonymous {
                    names.push(default_export_name(self.module_id));
                }
                let kind = symbol_kind(stmt);
                for name in &names {
                    self.declare(name, kind, index);
                }
                if exported {
                    for name in &names {
                        if is_default {
                            self.export_local("default", name);
                        } else {
                            self.export_local(name, name);
                        }
                    }
                }
            }
        }
    }
}

/// Build the symbol table for one module's top-level statements.
pub fn extract_symbols(module_id: &str, statements: &[Stmt], is_module: bool) -> ModuleSymbols {
    let mut extractor = Extractor {
        module_id,
        is_script: !is_module,
        out: ModuleSymbols {
            is_script: !is_module,
            ..ModuleSymbols::default()
        },
    };
    for (index, stmt) in statements.iter().enumerate() {
        extractor.statement(index, stmt);
    }
    extractor.mark_exported_symbols();
    extractor.out
}

// =============================================================================
// Normalization
// =============================================================================

fn entity_from_expr(expr: &Expr) -> Option<EntityName> {
    match &expr.kind {
        ExprKind::Ident(ident) => Some(EntityName::from_ident(ident.clone())),
        ExprKind::Member(object, property) => {
            let mut entity = entity_from_expr(object)?;
            entity.parts.push(property.clone());
            Some(entity)
        }
        ExprKind::Paren(inner) => entity_from_expr(inner),
        _ => None,
    }
}

/// Give anonymous `export default class/function` declarations the synthesized
/// name, and bind non-identifier `export default` / `export =` expressions to it:
/// entity chains become `import <name> = a.b;`, anything else `declare const <name>: any;`.
pub fn name_anonymous_defaults(module_id: &str, statements: &mut Vec<Stmt>) {
    let mut index = 0;
    while index < statements.len() {
        let stmt = &mut statements[index];
        match &mut stmt.kind {
            StmtKind::Class(class) if class.name.is_none() => {
                class.name = Some(Ident::synthetic(default_export_name(module_id)));
            }
            StmtKind::Function(function) if function.name.is_none() => {
                function.name = Some(Ident::synthetic(default_export_name(module_id)));
            }
            StmtKind::ExportAssignment(assignment)
                if !matches!(assignment.expr.kind, ExprKind::Ident(_)) =>
            {
                let name = default_export_name(module_id);
                let binding = match entity_from_expr(&assignment.expr) {
                    Some(entity) => Stmt::new(StmtKind::ImportEquals(ImportEqualsDecl {
                        type_only: false,
                        name: Ident::synthetic(name.clone()),
                        target: ModuleReference::Entity(entity),
                    })),
                    None => Stmt::new(StmtKind::Variable(VariableDecl {
                        kind: VarKind::Const,
                        declarations: vec![VarDeclarator {
                            span: assignment.expr.span,
                            name: BindingName::Ident(Ident::synthetic(name.clone())),
                            ty: Some(TypeNode::new(TypeKind::Keyword("any".to_string()))),
                            init: None,
                        }],
                    }))
                    .with_modifiers(ModifierFlags::DECLARE),
                };
                assignment.expr = Expr::ident(Ident::synthetic(name));
                statements.insert(index, binding);
                index += 1;
            }
            _ => {}
        }
        index += 1;
    }
}

#[cfg(test)]
#[path = "tests/symbols_tests.rs"]
mod symbols_tests;
