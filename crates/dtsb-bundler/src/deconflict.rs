//! Deconflicter.
//!
//! Builds one chunk's rename map before anything is rewritten. Every top-level
//! name of every member module is claimed in a fixed order (script globals,
//! entry modules, remaining members); a name already claimed by something else
//! gets the first free `name_$n`. Import bindings claim the name of what they
//! bind, so two bindings of the same external or cross-chunk symbol share one
//! local and a binding of a same-chunk declaration simply becomes that
//! declaration's final name.

use crate::assemble::AssembledChunk;
use crate::link::{LinkedModule, SymbolRef, Target};
use crate::prepare::{PreparedModule, StatementRole};
use crate::symbols::{ImportedName, declared_names};
use dtsb_common::path::file_stem;
use dtsb_parser::ast::{ModuleBody, ModuleName, StmtKind};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

/// Who a claimed top-level name belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Owner {
    /// Global scope; shared by every script module.
    Ambient,
    Symbol(SymbolRef),
    /// A declaration owned by another chunk, imported into this one.
    Foreign(SymbolRef),
    External(String, ImportedName),
    /// Synthesized namespace object of a same-chunk module.
    Namespace(usize),
    /// Namespace object of a module owned by another chunk.
    ForeignNamespace(usize),
}

/// Final names for one chunk.
#[derive(Debug, Default)]
pub(crate) struct ChunkNames {
    /// Per module: original top-level name to final name, only where they differ.
    pub renames: FxHashMap<usize, FxHashMap<String, String>>,
    pub foreign_locals: IndexMap<SymbolRef, String>,
    pub external_locals: IndexMap<(String, ImportedName), String>,
    pub namespace_locals: IndexMap<usize, String>,
    pub foreign_namespace_locals: IndexMap<usize, String>,
}

impl ChunkNames {
    pub fn renamed(&self, module: usize, name: &str) -> Option<&str> {
        self.renames
            .get(&module)
            .and_then(|renames| renames.get(name))
            .map(String::as_str)
    }

    pub fn final_name<'a>(&'a self, module: usize, name: &'a str) -> &'a str {
        self.renamed(module, name).unwrap_or(name)
    }

    /// The chunk-local name `target` is reachable under, if it has one.
    pub fn local_name(
        &self,
        target: &Target,
        chunk: usize,
        modules: &[PreparedModule],
    ) -> Option<String> {
        match target {
            Target::Symbol(symbol) if modules[symbol.module].chunk == chunk => {
                Some(self.final_name(symbol.module, &symbol.name).to_string())
            }
            Target::Symbol(symbol) => self.foreign_locals.get(symbol).cloned(),
            Target::Namespace(module) if modules[*module].chunk == chunk => {
                self.namespace_locals.get(module).cloned()
            }
            Target::Namespace(module) => self.foreign_namespace_locals.get(module).cloned(),
            Target::External {
                specifier,
                imported,
            } => self
                .external_locals
                .get(&(specifier.clone(), imported.clone()))
                .cloned(),
            Target::Unresolved => None,
        }
    }
}

struct Claims {
    taken: FxHashMap<String, Owner>,
    /// Every original top-level name in the chunk; generated names avoid them all.
    reserved: FxHashSet<String>,
}

impl Claims {
    fn claim(&mut self, name: &str, owner: Owner) -> String {
        match self.taken.get(name) {
            Some(existing) if *existing == owner => return name.to_string(),
            Some(_) => {}
            None => {
                self.taken.insert(name.to_string(), owner);
                return name.to_string();
            }
        }
        let mut counter = 0usize;
        loop {
            let candidate = format!("{name}_${counter}");
            if !self.taken.contains_key(&candidate) && !self.reserved.contains(&candidate) {
                self.taken.insert(candidate.clone(), owner);
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Identifier-safe base name for a synthesized namespace of `module_id`.
pub(crate) fn namespace_base_name(module_id: &str) -> String {
    let stem = file_stem(Path::new(module_id));
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '$' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Names declared inside `declare global { }` blocks of a module.
fn global_block_names(module: &PreparedModule) -> Vec<String> {
    let mut names = Vec::new();
    for (stmt, info) in module.statements.iter().zip(&module.info) {
        if info.role != StatementRole::Ambient {
            continue;
        }
        if let StmtKind::Module(decl) = &stmt.kind
            && matches!(decl.name, ModuleName::Global(_))
            && let Some(ModuleBody::Block(body)) = &decl.body
        {
            names.extend(body.iter().flat_map(declared_names));
        }
    }
    names
}

struct Deconflicter<'a> {
    chunk: usize,
    modules: &'a [PreparedModule],
    linked: &'a [LinkedModule],
    claims: Claims,
    names: ChunkNames,
}

impl Deconflicter<'_> {
    fn is_local(&self, module: usize) -> bool {
        self.modules[module].chunk == self.chunk
    }

    fn record(&mut self, module: usize, original: &str, final_name: String) {
        if final_name != original {
            self.names
                .renames
                .entry(module)
                .or_default()
                .insert(original.to_string(), final_name);
        }
    }

    fn claim_declaration(&mut self, module: usize, name: &str) {
        let owner = Owner::Symbol(SymbolRef::new(module, name));
        let final_name = self.claims.claim(name, owner);
        self.record(module, name, final_name);
    }

    /// Claim the local of an import binding. Same-chunk declarations are
    /// returned for aliasing once every declaration has its final name.
    fn claim_binding(&mut self, module: usize, local: &str, target: &Target) -> Option<SymbolRef> {
        let final_name = match target {
            Target::Symbol(symbol) if self.is_local(symbol.module) => {
                return Some(symbol.clone());
            }
            Target::Symbol(symbol) => match self.names.foreign_locals.get(symbol).cloned() {
                Some(existing) => existing,
                None => {
                    let name = self.claims.claim(local, Owner::Foreign(symbol.clone()));
                    self.names.foreign_locals.insert(symbol.clone(), name.clone());
                    name
                }
            },
            Target::Namespace(target) => {
                let target = *target;
                let local_namespace = self.is_local(target);
                let existing = if local_namespace {
                    self.names.namespace_locals.get(&target).cloned()
                } else {
                    self.names.foreign_namespace_locals.get(&target).cloned()
                };
                match existing {
                    Some(existing) => existing,
                    None if local_namespace => {
                        let name = self.claims.claim(local, Owner::Namespace(target));
                        self.names.namespace_locals.insert(target, name.clone());
                        name
                    }
                    None => {
                        let name = self.claims.claim(local, Owner::ForeignNamespace(target));
                        self.names.foreign_namespace_locals.insert(target, name.clone());
                        name
                    }
                }
            }
            Target::External {
                specifier,
                imported,
            } => {
                let key = (specifier.clone(), imported.clone());
                match self.names.external_locals.get(&key).cloned() {
                    Some(existing) => existing,
                    None => {
                        let owner = Owner::External(specifier.clone(), imported.clone());
                        let name = self.claims.claim(local, owner);
                        self.names.external_locals.insert(key, name.clone());
                        name
                    }
                }
            }
            Target::Unresolved => {
                tracing::debug!(
                    module = %self.modules[module].id,
                    binding = local,
                    "import binding does not resolve; kept as a local name"
                );
                self.claims.claim(local, Owner::Symbol(SymbolRef::new(module, local)))
            }
        };
        self.record(module, local, final_name);
        None
    }

    fn claim_module(&mut self, module: usize, deferred: &mut Vec<(usize, String, SymbolRef)>) {
        let modules = self.modules;
        let linked = self.linked;
        let prepared = &modules[module];
        for name in prepared.symbols.symbols.keys() {
            match linked[module].imports.get(name) {
                Some(target) => {
                    if let Some(symbol) = self.claim_binding(module, name, target) {
                        deferred.push((module, name.clone(), symbol));
                    }
                }
                None => self.claim_declaration(module, name),
            }
        }
    }

    /// Namespace objects other code needs for modules of this chunk, and the
    /// cross-chunk members they list.
    fn claim_namespaces(&mut self, ordered: &[usize], demand: &FxHashSet<usize>) {
        for &module in ordered {
            if demand.contains(&module) && !self.names.namespace_locals.contains_key(&module) {
                let base = namespace_base_name(&self.modules[module].id);
                let name = self.claims.claim(&base, Owner::Namespace(module));
                self.names.namespace_locals.insert(module, name);
            }
        }
        let linked = self.linked;
        let namespaces: Vec<usize> = self.names.namespace_locals.keys().copied().collect();
        for module in namespaces {
            for (_, symbol) in linked[module].namespace_members() {
                if self.is_local(symbol.module) || self.names.foreign_locals.contains_key(symbol) {
                    continue;
                }
                let name = self.claims.claim(&symbol.name, Owner::Foreign(symbol.clone()));
                self.names.foreign_locals.insert(symbol.clone(), name);
            }
        }
    }
}

/// Assign final names for every top-level binding of `chunk`.
///
/// `namespace_demand` holds every module whose namespace object is referenced
/// anywhere in the run.
#[tracing::instrument(level = "debug", skip_all, fields(chunk = %chunk.file_name))]
pub(crate) fn deconflict_chunk(
    index: usize,
    chunk: &AssembledChunk,
    modules: &[PreparedModule],
    linked: &[LinkedModule],
    namespace_demand: &FxHashSet<usize>,
) -> ChunkNames {
    let mut reserved = FxHashSet::default();
    for &module in &chunk.members {
        reserved.extend(modules[module].symbols.symbols.keys().cloned());
        reserved.extend(global_block_names(&modules[module]));
    }

    let mut deconflicter = Deconflicter {
        chunk: index,
        modules,
        linked,
        claims: Claims {
            taken: FxHashMap::default(),
            reserved,
        },
        names: ChunkNames::default(),
    };

    // Globals first: they can never be renamed.
    for &module in &chunk.members {
        let prepared = &modules[module];
        let globals: Vec<String> = if prepared.is_script() {
            prepared.symbols.symbols.keys().cloned().collect()
        } else {
            global_block_names(prepared)
        };
        for name in globals {
            deconflicter.claims.claim(&name, Owner::Ambient);
        }
    }

    let ordered: Vec<usize> = chunk
        .entries
        .iter()
        .chain(chunk.members.iter().filter(|m| !chunk.is_entry_module(**m)))
        .copied()
        .filter(|&m| !modules[m].is_script())
        .collect();

    let mut deferred = Vec::new();
    for &module in &ordered {
        deconflicter.claim_module(module, &mut deferred);
    }
    deconflicter.claim_namespaces(&ordered, namespace_demand);

    for (module, local, symbol) in deferred {
        let final_name = deconflicter
            .names
            .final_name(symbol.module, &symbol.name)
            .to_string();
        deconflicter.record(module, &local, final_name);
    }

    let names = deconflicter.names;
    tracing::debug!(
        renamed = names.renames.values().map(FxHashMap::len).sum::<usize>(),
        "deconflicted"
    );
    names
}
