//! Export/Import Rewriter (Modularizer) and chunk printing.
//!
//! Everything here reads finished run state: final names, surfaces and
//! liveness are computed for all chunks before any chunk is printed, so
//! chunks print independently.
//!
//! Output layout of one chunk:
//! 1. hoisted triple-slash directives
//! 2. imports of external modules, then of other chunks
//! 3. synthesized namespace objects
//! 4. live member statements, renamed, in member order
//! 5. exports

use crate::assemble::AssembledChunk;
use crate::deconflict::ChunkNames;
use crate::error::BundleError;
use crate::link::{LinkedModule, SymbolRef, Target};
use crate::options::BundleOptions;
use crate::output::{ChunkDeclarations, EmittedFile, chunk_paths, chunk_specifier, source_name};
use crate::prepare::{PreparedModule, StatementRole};
use crate::shake::Liveness;
use crate::surface::ChunkSurface;
use crate::symbols::{ImportedName, is_ambient_module_declaration};
use crate::trace::{ImportTypeRef, ReferenceVisitor, trace_statement};
use dtsb_common::Span;
use dtsb_emitter::{PrintOptions, Printer};
use dtsb_parser::ast::{
    EntityName, ExportAssignment, ExportClause, ExportDecl, ExportSpecifier, Expr, Ident,
    ImportBindings, ImportDecl, ImportEqualsDecl, ImportSpecifier, ModifierFlags, ModuleBody,
    ModuleDecl, ModuleName, ModuleReference, Stmt, StmtKind, Str, TypeKind, TypeNode,
};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;

// =============================================================================
// Synthesized statements
// =============================================================================

fn import_specifier(imported: &str, local: &str) -> ImportSpecifier {
    ImportSpecifier {
        type_only: false,
        property_name: (imported != local).then(|| Ident::synthetic(imported)),
        name: Ident::synthetic(local),
    }
}

fn export_specifier(local: &str, exported: &str) -> ExportSpecifier {
    ExportSpecifier {
        type_only: false,
        property_name: (local != exported).then(|| Ident::synthetic(local)),
        name: Ident::synthetic(exported),
    }
}

fn import_statement(
    default: Option<&str>,
    bindings: Option<ImportBindings>,
    specifier: &str,
) -> Stmt {
    Stmt::new(StmtKind::Import(ImportDecl {
        type_only: false,
        default: default.map(Ident::synthetic),
        bindings,
        specifier: Str::synthetic(specifier),
    }))
}

fn export_statement(clause: ExportClause, specifier: Option<&str>) -> Stmt {
    Stmt::new(StmtKind::Export(ExportDecl {
        type_only: false,
        clause,
        specifier: specifier.map(Str::synthetic),
    }))
}

fn declare_global(statements: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::Module(ModuleDecl {
        name: ModuleName::Global(Span::DUMMY),
        namespace_keyword: false,
        body: Some(ModuleBody::Block(statements)),
    }))
    .with_modifiers(ModifierFlags::DECLARE)
}

/// Value-bearing declarations need `declare` once they lose `export`.
fn needs_declare(stmt: &Stmt) -> bool {
    if stmt.has(ModifierFlags::DECLARE) {
        return false;
    }
    match &stmt.kind {
        StmtKind::Class(_) | StmtKind::Function(_) | StmtKind::Enum(_) | StmtKind::Variable(_) => {
            true
        }
        StmtKind::Module(module) => matches!(module.name, ModuleName::Ident(_)),
        _ => false,
    }
}

// =============================================================================
// Import planning
// =============================================================================

#[derive(Debug, Default)]
struct ExternalImport {
    side_effect: bool,
    default: Option<String>,
    /// `(imported, local)`
    named: IndexSet<(String, String)>,
    namespaces: IndexSet<String>,
    requires: IndexSet<String>,
}

#[derive(Debug, Default)]
struct ImportPlan {
    external: IndexMap<String, ExternalImport>,
    /// Owner chunk to `(exposure, local)` pairs.
    chunks: IndexMap<usize, IndexSet<(String, String)>>,
    side_effect_chunks: IndexSet<usize>,
}

/// Renames identifiers and rewrites `import("m")` types of one module's statements.
struct Rewriter<'m, 'a> {
    modularizer: &'m Modularizer<'a>,
    chunk: usize,
    module: usize,
}

impl Rewriter<'_, '_> {
    fn rename(&self, ident: &mut Ident) {
        if let Some(name) = self.modularizer.names[self.chunk].renamed(self.module, &ident.name) {
            ident.name = name.to_string();
        }
    }
}

impl ReferenceVisitor for Rewriter<'_, '_> {
    fn reference(&mut self, ident: &mut Ident) {
        self.rename(ident);
    }

    fn declaration(&mut self, ident: &mut Ident) {
        self.rename(ident);
    }

    fn import_type(&mut self, node: &mut TypeNode) {
        self.modularizer
            .rewrite_import_type(self.chunk, self.module, node);
    }
}

/// Read-only view of a finished run, printing one chunk at a time.
pub(crate) struct Modularizer<'a> {
    pub chunks: &'a [AssembledChunk],
    pub modules: &'a [PreparedModule],
    pub linked: &'a [LinkedModule],
    pub names: &'a [ChunkNames],
    pub surfaces: &'a [ChunkSurface],
    pub liveness: &'a Liveness,
    pub options: &'a BundleOptions,
}

impl Modularizer<'_> {
    fn owner(&self, target: &Target) -> Option<usize> {
        match target {
            Target::Symbol(SymbolRef { module, .. }) | Target::Namespace(module) => {
                Some(self.modules[*module].chunk)
            }
            Target::External { .. } | Target::Unresolved => None,
        }
    }

    fn specifier_for(&self, from: usize, to: usize) -> String {
        chunk_specifier(&self.chunks[from].file_name, &self.chunks[to].file_name)
    }

    /// Record the import that makes `target` available as a local of `index`.
    fn plan_binding(&self, index: usize, target: &Target, plan: &mut ImportPlan) {
        let names = &self.names[index];
        if let Target::External {
            specifier,
            imported,
        } = target
        {
            let Some(local) = names.local_name(target, index, self.modules) else {
                return;
            };
            let import = plan.external.entry(specifier.clone()).or_default();
            match imported {
                ImportedName::Default => {
                    import.default.get_or_insert(local);
                }
                ImportedName::Named(name) => {
                    import.named.insert((name.clone(), local));
                }
                ImportedName::Namespace => {
                    import.namespaces.insert(local);
                }
                ImportedName::ExportEquals => {
                    import.requires.insert(local);
                }
            }
            return;
        }

        let Some(owner) = self.owner(target).filter(|owner| *owner != index) else {
            return;
        };
        let local = names.local_name(target, index, self.modules);
        let exposure = self.surfaces[owner].exposure(target);
        match (local, exposure) {
            (Some(local), Some(exposure)) => {
                plan.chunks
                    .entry(owner)
                    .or_default()
                    .insert((exposure.to_string(), local));
            }
            _ => tracing::warn!(
                chunk = %self.chunks[index].file_name,
                from = %self.chunks[owner].file_name,
                ?target,
                "cross-chunk binding has no exposure; reference left unresolved"
            ),
        }
    }

    fn plan_imports(&self, index: usize) -> ImportPlan {
        let chunk = &self.chunks[index];
        let mut plan = ImportPlan::default();

        for &module in &chunk.members {
            let prepared = &self.modules[module];
            let used = &self.liveness.used_bindings[module];
            for (local, target) in &self.linked[module].imports {
                if used.contains(local) {
                    self.plan_binding(index, target, &mut plan);
                }
            }
            for specifier in &prepared.symbols.side_effect_imports {
                match prepared.resolve(specifier) {
                    Some(target) => {
                        let owner = self.modules[target].chunk;
                        if owner != index {
                            plan.side_effect_chunks.insert(owner);
                        }
                    }
                    None => plan.external.entry(specifier.clone()).or_default().side_effect = true,
                }
            }
        }

        for &module in &chunk.members {
            if !self.liveness.namespaces.contains(&module) {
                continue;
            }
            for (_, symbol) in self.linked[module].namespace_members() {
                self.plan_binding(index, &Target::Symbol(symbol.clone()), &mut plan);
            }
        }

        if let Some(target) = self.surfaces[index].exports.get("export=") {
            self.plan_binding(index, target, &mut plan);
        }
        plan
    }

    fn render_imports(&self, index: usize, plan: ImportPlan) -> Vec<Stmt> {
        let mut statements = Vec::new();

        for (specifier, import) in plan.external {
            let has_bindings = import.default.is_some() || !import.named.is_empty();
            if has_bindings {
                let named = (!import.named.is_empty()).then(|| {
                    ImportBindings::Named(
                        import
                            .named
                            .iter()
                            .map(|(imported, local)| import_specifier(imported, local))
                            .collect(),
                    )
                });
                statements.push(import_statement(import.default.as_deref(), named, &specifier));
            }
            for local in &import.namespaces {
                let bindings = ImportBindings::Namespace(Ident::synthetic(local.as_str()));
                statements.push(import_statement(None, Some(bindings), &specifier));
            }
            for local in &import.requires {
                statements.push(Stmt::new(StmtKind::ImportEquals(ImportEqualsDecl {
                    type_only: false,
                    name: Ident::synthetic(local.as_str()),
                    target: ModuleReference::Require(Str::synthetic(specifier.as_str())),
                })));
            }
            let bound = has_bindings || !import.namespaces.is_empty() || !import.requires.is_empty();
            if import.side_effect && !bound {
                statements.push(import_statement(None, None, &specifier));
            }
        }

        for owner in &plan.side_effect_chunks {
            if !plan.chunks.contains_key(owner) {
                statements.push(import_statement(None, None, &self.specifier_for(index, *owner)));
            }
        }

        for (owner, bindings) in plan.chunks {
            let specifiers = bindings
                .iter()
                .map(|(exposure, local)| import_specifier(exposure, local))
                .collect();
            statements.push(import_statement(
                None,
                Some(ImportBindings::Named(specifiers)),
                &self.specifier_for(index, owner),
            ));
        }
        statements
    }

    // =========================================================================
    // Namespaces and member statements
    // =========================================================================

    /// `declare namespace ns { export { a as A, ... }; }` for each live namespace
    /// object of a member module.
    fn render_namespaces(&self, index: usize) -> Vec<Stmt> {
        let names = &self.names[index];
        let mut statements = Vec::new();
        for &module in &self.chunks[index].members {
            if !self.liveness.namespaces.contains(&module) {
                continue;
            }
            let Some(local) = names.namespace_locals.get(&module) else {
                continue;
            };
            let specifiers = self.linked[module]
                .namespace_members()
                .filter_map(|(exported, symbol)| {
                    let target = Target::Symbol(symbol.clone());
                    names
                        .local_name(&target, index, self.modules)
                        .map(|member| export_specifier(&member, exported))
                })
                .collect();
            let body = vec![export_statement(ExportClause::Named(specifiers), None)];
            statements.push(
                Stmt::new(StmtKind::Module(ModuleDecl {
                    name: ModuleName::Ident(Ident::synthetic(local.as_str())),
                    namespace_keyword: true,
                    body: Some(ModuleBody::Block(body)),
                }))
                .with_modifiers(ModifierFlags::DECLARE),
            );
        }
        statements
    }

    /// Public names an inline `export` on `stmt` already provides, when the
    /// modifier can stay: every declared name is unrenamed and exported as itself.
    fn inline_export_names(
        &self,
        index: usize,
        module: usize,
        stmt: &Stmt,
        declares: &[String],
    ) -> Option<Vec<String>> {
        if declares.is_empty() {
            return None;
        }
        let surface = &self.surfaces[index];
        let is_default = stmt.has(ModifierFlags::DEFAULT);
        let mut public = Vec::with_capacity(declares.len());
        for name in declares {
            if self.names[index].renamed(module, name).is_some() {
                return None;
            }
            let key = if is_default { "default" } else { name.as_str() };
            let symbol = Target::Symbol(SymbolRef::new(module, name.clone()));
            if surface.exports.get(key) != Some(&symbol) {
                return None;
            }
            public.push(key.to_string());
        }
        Some(public)
    }

    fn module_statements(
        &self,
        index: usize,
        module: usize,
        inline: &mut FxHashSet<String>,
    ) -> Result<Vec<Stmt>, BundleError> {
        let chunk = &self.chunks[index];
        let prepared = &self.modules[module];
        let keeps_inline_exports = chunk.is_entry && chunk.is_entry_module(module);

        let mut statements = Vec::new();
        for (position, original) in prepared.statements.iter().enumerate() {
            let info = &prepared.info[position];
            match info.role {
                StatementRole::Import | StatementRole::Export | StatementRole::NamespaceExport => {
                    continue;
                }
                StatementRole::Declaration if !self.liveness.is_live(module, position) => continue,
                StatementRole::Declaration | StatementRole::Ambient => {}
            }

            let mut stmt = original.clone();
            let mut rewriter = Rewriter {
                modularizer: self,
                chunk: index,
                module,
            };
            trace_statement(&prepared.id, &mut stmt, &mut rewriter)?;

            if info.role == StatementRole::Declaration {
                if stmt.has(ModifierFlags::EXPORT) {
                    match self.inline_export_names(index, module, &stmt, &info.declares) {
                        Some(public) if keeps_inline_exports => inline.extend(public),
                        _ => stmt
                            .modifiers
                            .remove(ModifierFlags::EXPORT | ModifierFlags::DEFAULT),
                    }
                }
                if !stmt.has(ModifierFlags::EXPORT) && needs_declare(&stmt) {
                    stmt.modifiers.insert(ModifierFlags::DECLARE);
                }
            }
            statements.push(stmt);
        }
        Ok(statements)
    }

    fn rewrite_import_type(&self, index: usize, module: usize, node: &mut TypeNode) {
        let TypeKind::Import {
            is_typeof,
            argument,
            qualifier,
            type_args,
        } = &mut node.kind
        else {
            return;
        };
        let key = ImportTypeRef {
            specifier: argument.value.clone(),
            name: qualifier.as_ref().map(|q| q.first().name.clone()),
        };
        let is_typeof = *is_typeof;
        let Some(target) = self.linked[module].import_types.get(&key) else {
            return;
        };
        let Some(owner) = self.owner(target) else {
            return;
        };

        if owner != index {
            if let Some(exposure) = self.surfaces[owner].exposure(target) {
                argument.value = self.specifier_for(index, owner);
                // `import("m")` becomes `import("./chunk").m` once `m` is
                // exported from that chunk as a namespace.
                match qualifier {
                    Some(qualifier) => qualifier.parts[0].name = exposure.to_string(),
                    None => {
                        *qualifier = Some(EntityName::from_ident(Ident::synthetic(exposure)));
                    }
                }
            }
            return;
        }

        let Some(local) = self.names[index].local_name(target, index, self.modules) else {
            return;
        };
        let name = match qualifier {
            Some(qualifier) => {
                let mut name = qualifier.clone();
                name.parts[0].name = local;
                name
            }
            None => EntityName::from_ident(Ident::synthetic(local)),
        };
        let type_args = std::mem::take(type_args);
        node.kind = if is_typeof {
            TypeKind::Query { name, type_args }
        } else {
            TypeKind::Reference { name, type_args }
        };
    }

    // =========================================================================
    // Exports
    // =========================================================================

    fn render_exports(&self, index: usize, inline: &FxHashSet<String>) -> Vec<Stmt> {
        let surface = &self.surfaces[index];
        let names = &self.names[index];
        let mut statements = Vec::new();

        if let Some(target) = surface.exports.get("export=")
            && let Some(local) = names.local_name(target, index, self.modules)
        {
            statements.push(Stmt::new(StmtKind::ExportAssignment(ExportAssignment {
                is_export_equals: true,
                expr: Expr::ident(Ident::synthetic(local)),
            })));
        }

        let mut locals = Vec::new();
        let mut from_chunks: IndexMap<usize, Vec<ExportSpecifier>> = IndexMap::new();
        let mut from_external: IndexMap<&str, Vec<ExportSpecifier>> = IndexMap::new();
        let mut external_namespaces = Vec::new();
        for (public, target) in &surface.exports {
            if public == "export=" || inline.contains(public) {
                continue;
            }
            match target {
                Target::Symbol(_) | Target::Namespace(_) => {
                    let Some(owner) = self.owner(target) else {
                        continue;
                    };
                    if owner == index {
                        if let Some(local) = names.local_name(target, index, self.modules) {
                            locals.push(export_specifier(&local, public));
                        }
                    } else if let Some(exposure) = self.surfaces[owner].exposure(target) {
                        from_chunks
                            .entry(owner)
                            .or_default()
                            .push(export_specifier(exposure, public));
                    }
                }
                Target::External {
                    specifier,
                    imported,
                } => match imported {
                    ImportedName::Named(name) => from_external
                        .entry(specifier.as_str())
                        .or_default()
                        .push(export_specifier(name, public)),
                    ImportedName::Default => from_external
                        .entry(specifier.as_str())
                        .or_default()
                        .push(export_specifier("default", public)),
                    ImportedName::Namespace | ImportedName::ExportEquals => {
                        external_namespaces.push(export_statement(
                            ExportClause::StarAs(Ident::synthetic(public.as_str())),
                            Some(specifier.as_str()),
                        ));
                    }
                },
                Target::Unresolved => {}
            }
        }

        if !locals.is_empty() {
            statements.push(export_statement(ExportClause::Named(locals), None));
        }
        for (owner, specifiers) in from_chunks {
            let specifier = self.specifier_for(index, owner);
            statements.push(export_statement(
                ExportClause::Named(specifiers),
                Some(specifier.as_str()),
            ));
        }
        for (specifier, specifiers) in from_external {
            statements.push(export_statement(
                ExportClause::Named(specifiers),
                Some(specifier),
            ));
        }
        statements.extend(external_namespaces);
        for specifier in &surface.external_stars {
            statements.push(export_statement(ExportClause::Star, Some(specifier.as_str())));
        }
        if let Some(name) = &surface.namespace_export {
            statements.push(Stmt::new(StmtKind::NamespaceExport(Ident::synthetic(
                name.as_str(),
            ))));
        }
        statements
    }

    // =========================================================================
    // Printing
    // =========================================================================

    /// Print chunk `index` and its source map.
    pub fn emit(&self, index: usize) -> Result<ChunkDeclarations, BundleError> {
        let chunk = &self.chunks[index];
        let _span = tracing::debug_span!("emit_chunk", chunk = %chunk.file_name).entered();

        let paths = chunk_paths(&chunk.file_name, self.options);
        let is_module = chunk.members.iter().any(|&m| !self.modules[m].is_script());
        let source_map = self.options.declaration_map;

        let mut printer = Printer::new(PrintOptions {
            new_line: self.options.new_line,
        });
        if source_map {
            printer.enable_source_map(paths.declaration_base_name());
        }

        let mut directives: IndexSet<&str> = IndexSet::new();
        for &module in &chunk.members {
            directives.extend(self.modules[module].source.references.iter().map(String::as_str));
        }
        printer.print_directives(directives);

        let imports = self.render_imports(index, self.plan_imports(index));
        printer.print_statements(&imports);
        printer.print_statements(&self.render_namespaces(index));

        let mut inline = FxHashSet::default();
        for &module in &chunk.members {
            let prepared = &self.modules[module];
            let statements = self.module_statements(index, module, &mut inline)?;
            if statements.is_empty() {
                continue;
            }
            if source_map {
                printer.set_source(&source_name(&paths.map, &prepared.id), &prepared.source.text);
            }
            if prepared.is_script() && is_module {
                // Globals of a script keep their meaning only inside `declare global`;
                // ambient module declarations cannot be nested there.
                let (ambient_modules, globals): (Vec<Stmt>, Vec<Stmt>) = statements
                    .into_iter()
                    .partition(is_ambient_module_declaration);
                printer.print_statements(&ambient_modules);
                if !globals.is_empty() {
                    let globals = globals
                        .into_iter()
                        .map(|mut stmt| {
                            stmt.modifiers.remove(ModifierFlags::DECLARE);
                            stmt
                        })
                        .collect();
                    printer.print_statement(&declare_global(globals));
                }
            } else {
                printer.print_statements(&statements);
            }
        }
        printer.clear_source();

        let mut exports = self.render_exports(index, &inline);
        let has_module_syntax = !imports.is_empty()
            || !inline.is_empty()
            || exports
                .iter()
                .any(|stmt| !matches!(stmt.kind, StmtKind::NamespaceExport(_)));
        if is_module && !has_module_syntax {
            exports.push(export_statement(ExportClause::Named(Vec::new()), None));
        }
        printer.print_statements(&exports);

        if source_map {
            printer.print_comment_line(&format!("# sourceMappingURL={}", paths.map_base_name()));
        }
        let output = printer.finish();
        tracing::debug!(bytes = output.code.len(), "chunk printed");

        let declaration_map = output
            .source_map
            .filter(|_| source_map)
            .map(|contents| EmittedFile {
                file_name: paths.map_file_name.clone(),
                absolute_path: paths.map.clone(),
                contents,
            });
        Ok(ChunkDeclarations {
            chunk: chunk.file_name.clone(),
            declaration: EmittedFile {
                file_name: paths.declaration_file_name,
                absolute_path: paths.declaration,
                contents: output.code,
            },
            declaration_map,
        })
    }
}
