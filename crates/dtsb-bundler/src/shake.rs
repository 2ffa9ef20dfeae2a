//! Reachability Shaker.
//!
//! One worklist over `(module, statement)` pairs for the whole run. Roots are
//! every chunk's export surface and every ambient statement. A live statement
//! makes each name it declares live (so merged declarations and overloads
//! stay together) and each free reference it contains. References resolve
//! through the module's import bindings or its own top-level names; anything
//! else is a global and is left alone.
//!
//! Whenever a live reference crosses into another chunk the target is recorded
//! as required from its owner, which later turns into an export there.

use crate::link::{LinkedModule, Target};
use crate::prepare::{PreparedModule, StatementRole};
use crate::surface::ChunkSurface;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

#[derive(Debug)]
pub(crate) struct Liveness {
    /// Per module, per statement.
    pub statements: Vec<Vec<bool>>,
    /// Per module: import bindings referenced by live statements.
    pub used_bindings: Vec<FxHashSet<String>>,
    /// Modules whose namespace object is referenced.
    pub namespaces: FxHashSet<usize>,
    /// Per chunk: items other chunks import from it.
    pub required: Vec<IndexSet<Target>>,
}

impl Liveness {
    pub fn is_live(&self, module: usize, statement: usize) -> bool {
        self.statements[module][statement]
    }
}

struct Shaker<'a> {
    modules: &'a [PreparedModule],
    linked: &'a [LinkedModule],
    live: Liveness,
    queue: VecDeque<(usize, usize)>,
}

impl Shaker<'_> {
    fn mark_statement(&mut self, module: usize, statement: usize) {
        let slot = &mut self.live.statements[module][statement];
        if !*slot {
            *slot = true;
            self.queue.push_back((module, statement));
        }
    }

    fn mark_symbol(&mut self, module: usize, name: &str) {
        let modules = self.modules;
        for &statement in modules[module].declaring_statements(name) {
            self.mark_statement(module, statement);
        }
    }

    fn mark_namespace(&mut self, module: usize) {
        if !self.live.namespaces.insert(module) {
            return;
        }
        let linked = self.linked;
        let chunk = self.modules[module].chunk;
        for (_, symbol) in linked[module].namespace_members() {
            self.mark_target(&Target::Symbol(symbol.clone()), chunk);
        }
    }

    /// Mark `target`, referenced from code placed in chunk `from`.
    fn mark_target(&mut self, target: &Target, from: usize) {
        let owner = match target {
            Target::Symbol(symbol) => {
                self.mark_symbol(symbol.module, &symbol.name);
                self.modules[symbol.module].chunk
            }
            Target::Namespace(module) => {
                self.mark_namespace(*module);
                self.modules[*module].chunk
            }
            Target::External { .. } | Target::Unresolved => return,
        };
        if owner != from {
            self.live.required[owner].insert(target.clone());
        }
    }

    fn reference(&mut self, module: usize, name: &str) {
        let modules = self.modules;
        let linked = self.linked;
        let prepared = &modules[module];
        if prepared.symbols.is_import(name) {
            self.live.used_bindings[module].insert(name.to_string());
            if let Some(target) = linked[module].imports.get(name) {
                self.mark_target(target, prepared.chunk);
            }
        } else if prepared.symbols.get(name).is_some() {
            self.mark_symbol(module, name);
        }
    }

    fn run(&mut self) {
        let modules = self.modules;
        let linked = self.linked;
        while let Some((module, statement)) = self.queue.pop_front() {
            let prepared = &modules[module];
            let info = &prepared.info[statement];
            for name in &info.declares {
                self.mark_symbol(module, name);
            }
            for name in &info.references {
                self.reference(module, name);
            }
            for import in &info.import_types {
                if let Some(target) = linked[module].import_types.get(import) {
                    self.mark_target(target, prepared.chunk);
                }
            }
        }
    }
}

/// Mark everything reachable from the chunks' surfaces and ambient code.
#[tracing::instrument(level = "debug", skip_all, fields(modules = modules.len()))]
pub(crate) fn compute_liveness(
    modules: &[PreparedModule],
    linked: &[LinkedModule],
    surfaces: &[ChunkSurface],
) -> Liveness {
    let mut shaker = Shaker {
        modules,
        linked,
        live: Liveness {
            statements: modules.iter().map(|m| vec![false; m.statements.len()]).collect(),
            used_bindings: vec![FxHashSet::default(); modules.len()],
            namespaces: FxHashSet::default(),
            required: vec![IndexSet::new(); surfaces.len()],
        },
        queue: VecDeque::new(),
    };

    for (chunk, surface) in surfaces.iter().enumerate() {
        for target in surface.exports.values() {
            shaker.mark_target(target, chunk);
        }
    }
    for (module, prepared) in modules.iter().enumerate() {
        for (statement, info) in prepared.info.iter().enumerate() {
            if info.role == StatementRole::Ambient {
                shaker.mark_statement(module, statement);
            }
        }
    }
    shaker.run();

    let live = shaker.live;
    tracing::debug!(
        statements = live.statements.iter().flatten().filter(|l| **l).count(),
        namespaces = live.namespaces.len(),
        "liveness computed"
    );
    live
}
