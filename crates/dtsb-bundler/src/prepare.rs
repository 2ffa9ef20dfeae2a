//! Per-module analysis shared by every later pass.
//!
//! Each module is cloned out of the context once per run, normalized, and
//! annotated with its symbol table, per-statement references and resolved
//! specifiers. Modules are independent here, so the driver runs this in parallel.

use crate::error::BundleError;
use crate::options::ModuleResolver;
use crate::symbols::{
    ExportEntry, ModuleSymbols, declared_names, extract_symbols, is_ambient_module_declaration,
    name_anonymous_defaults,
};
use crate::trace::{ImportTypeRef, StatementRefs, trace_statement};
use dtsb_common::Diagnostic;
use dtsb_common::diagnostics::diagnostic_codes;
use dtsb_common::path::{ensure_posix, is_external_library, normalize};
use dtsb_parser::ast::{ModuleReference, SourceFile, Stmt, StmtKind};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::path::Path;
use std::sync::Arc;

/// How a statement takes part in the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatementRole {
    /// Declares top-level names; kept when any of them is live.
    Declaration,
    /// Module-sourced import; replaced by generated imports.
    Import,
    /// Export list or assignment; replaced by the chunk's generated exports.
    Export,
    /// `export as namespace X`.
    NamespaceExport,
    /// Global or augmentation code: always kept, never renamed.
    Ambient,
}

#[derive(Clone, Debug)]
pub(crate) struct StatementInfo {
    pub role: StatementRole,
    pub declares: SmallVec<[String; 2]>,
    pub references: Vec<String>,
    pub import_types: Vec<ImportTypeRef>,
}

/// Where a specifier written in a module points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A module bundled into one of the chunks (index into the run's module list).
    Bundled(usize),
    /// Not bundled: kept as written.
    External,
}

#[derive(Debug)]
pub(crate) struct PreparedModule {
    pub id: String,
    pub source: Arc<SourceFile>,
    pub chunk: usize,
    pub statements: Vec<Stmt>,
    pub symbols: ModuleSymbols,
    pub info: Vec<StatementInfo>,
    pub resolutions: FxHashMap<String, Resolution>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PreparedModule {
    pub fn is_script(&self) -> bool {
        self.symbols.is_script
    }

    pub fn resolve(&self, specifier: &str) -> Option<usize> {
        match self.resolutions.get(specifier) {
            Some(Resolution::Bundled(index)) => Some(*index),
            _ => None,
        }
    }

    /// Statement indices declaring `name` (empty for import bindings).
    pub fn declaring_statements(&self, name: &str) -> &[usize] {
        match self.symbols.get(name) {
            Some(symbol) if !self.symbols.is_import(name) => &symbol.statements,
            _ => &[],
        }
    }
}

fn statement_role(stmt: &Stmt, is_script: bool) -> StatementRole {
    if is_script || is_ambient_module_declaration(stmt) {
        return StatementRole::Ambient;
    }
    match &stmt.kind {
        StmtKind::Import(_) => StatementRole::Import,
        StmtKind::ImportEquals(decl) => match decl.target {
            ModuleReference::Require(_) => StatementRole::Import,
            ModuleReference::Entity(_) => StatementRole::Declaration,
        },
        StmtKind::Export(_) | StmtKind::ExportAssignment(_) => StatementRole::Export,
        StmtKind::NamespaceExport(_) => StatementRole::NamespaceExport,
        _ => StatementRole::Declaration,
    }
}

/// Analyze one module. `bundled` maps module ids in any chunk to their index.
#[tracing::instrument(level = "trace", skip_all, fields(module = %id))]
pub(crate) fn prepare_module(
    id: &str,
    source: &Arc<SourceFile>,
    chunk: usize,
    resolver: &dyn ModuleResolver,
    known: impl Fn(&str) -> bool,
    bundled: &FxHashMap<String, usize>,
) -> Result<PreparedModule, BundleError> {
    let mut statements = source.statements.clone();
    name_anonymous_defaults(id, &mut statements);
    let symbols = extract_symbols(id, &statements, source.is_module);

    let mut info = Vec::with_capacity(statements.len());
    for stmt in &mut statements {
        let role = statement_role(stmt, symbols.is_script);
        let mut refs = StatementRefs::default();
        if matches!(role, StatementRole::Declaration | StatementRole::Ambient) {
            trace_statement(id, stmt, &mut refs)?;
        }
        info.push(StatementInfo {
            role,
            declares: if role == StatementRole::Declaration {
                declared_names(stmt)
            } else {
                SmallVec::new()
            },
            references: refs.names.into_iter().collect(),
            import_types: refs.import_types,
        });
    }

    let mut specifiers: Vec<&str> = Vec::new();
    specifiers.extend(symbols.imports.values().map(|b| b.specifier.as_str()));
    specifiers.extend(symbols.star_exports.iter().map(String::as_str));
    specifiers.extend(symbols.side_effect_imports.iter().map(String::as_str));
    for entry in symbols.exports.values() {
        match entry {
            ExportEntry::ReExport { specifier, .. } | ExportEntry::Namespace { specifier } => {
                specifiers.push(specifier);
            }
            ExportEntry::Local(_) => {}
        }
    }
    specifiers.extend(
        info.iter()
            .flat_map(|i| i.import_types.iter())
            .map(|i| i.specifier.as_str()),
    );

    let mut resolutions = FxHashMap::default();
    let mut diagnostics = Vec::new();
    for specifier in specifiers {
        if resolutions.contains_key(specifier) {
            continue;
        }
        let resolved = resolver
            .resolve(specifier, Path::new(id))
            .map(|path| ensure_posix(&normalize(&path).to_string_lossy()));
        let resolution = match resolved {
            Some(target) => match bundled.get(&target) {
                Some(index) => Resolution::Bundled(*index),
                None => {
                    if known(&target) {
                        diagnostics.push(Diagnostic::from_code(
                            id.to_string(),
                            0,
                            0,
                            diagnostic_codes::MODULE_OUTSIDE_CHUNKS,
                            &[&target, id],
                        ));
                    }
                    Resolution::External
                }
            },
            None => {
                if !is_external_library(specifier) {
                    tracing::debug!(specifier, module = id, "unresolved relative specifier");
                }
                Resolution::External
            }
        };
        resolutions.insert(specifier.to_string(), resolution);
    }

    Ok(PreparedModule {
        id: id.to_string(),
        source: Arc::clone(source),
        chunk,
        statements,
        symbols,
        info,
        resolutions,
        diagnostics,
    })
}
