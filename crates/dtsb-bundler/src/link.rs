//! Cross-module binding resolution.
//!
//! Follows import bindings and re-export chains (`export { a } from`, `export *`,
//! `export * as ns`) through bundled modules down to the declaring module.
//! Cycles resolve to [`Target::Unresolved`] instead of looping.

use crate::prepare::PreparedModule;
use crate::symbols::{ExportEntry, ImportBinding, ImportedName};
use crate::trace::ImportTypeRef;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};

/// A top-level declaration: module index plus original local name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SymbolRef {
    pub module: usize,
    pub name: String,
}

impl SymbolRef {
    pub fn new(module: usize, name: impl Into<String>) -> Self {
        Self {
            module,
            name: name.into(),
        }
    }
}

/// What a binding ultimately refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Target {
    Symbol(SymbolRef),
    /// The whole export object of a bundled module.
    Namespace(usize),
    /// Something in a module that is not bundled; kept as written.
    External {
        specifier: String,
        imported: ImportedName,
    },
    Unresolved,
}

#[derive(Debug, Default)]
pub(crate) struct LinkedModule {
    /// Module-sourced import bindings by local name.
    pub imports: IndexMap<String, Target>,
    /// Every exported name, star re-exports expanded.
    pub exports: IndexMap<String, Target>,
    /// `export * from "lib"` specifiers reachable through bundled star exports.
    pub external_stars: Vec<String>,
    /// Qualified `import("m").X` types, by reference.
    pub import_types: FxHashMap<ImportTypeRef, Target>,
}

impl LinkedModule {
    /// Named exports that resolve to a declaration; the members of a
    /// synthesized namespace for this module.
    pub fn namespace_members(&self) -> impl Iterator<Item = (&str, &SymbolRef)> {
        self.exports
            .iter()
            .filter(|(name, _)| name.as_str() != "default" && name.as_str() != "export=")
            .filter_map(|(name, target)| match target {
                Target::Symbol(symbol) => Some((name.as_str(), symbol)),
                _ => None,
            })
    }
}

struct Linker<'a> {
    modules: &'a [PreparedModule],
    memo: FxHashMap<(usize, String), Target>,
}

impl Linker<'_> {
    fn export(&mut self, module: usize, name: &str) -> Target {
        let key = (module, name.to_string());
        if let Some(target) = self.memo.get(&key) {
            return target.clone();
        }
        let mut visited = FxHashSet::default();
        let target = self.resolve_export(module, name, &mut visited);
        self.memo.insert(key, target.clone());
        target
    }

    fn resolve_export(
        &self,
        module: usize,
        name: &str,
        visited: &mut FxHashSet<(usize, String)>,
    ) -> Target {
        if !visited.insert((module, name.to_string())) {
            return Target::Unresolved;
        }
        let prepared = &self.modules[module];
        match prepared.symbols.exports.get(name) {
            Some(ExportEntry::Local(local)) => self.resolve_local(module, local, visited),
            Some(ExportEntry::ReExport {
                specifier,
                imported,
            }) => match prepared.resolve(specifier) {
                Some(target) => self.resolve_export(target, imported, visited),
                None => Target::External {
                    specifier: specifier.clone(),
                    imported: ImportedName::from_export_name(imported),
                },
            },
            Some(ExportEntry::Namespace { specifier }) => match prepared.resolve(specifier) {
                Some(target) => Target::Namespace(target),
                None => Target::External {
                    specifier: specifier.clone(),
                    imported: ImportedName::Namespace,
                },
            },
            None => {
                if name == "default" || name == "export=" {
                    return Target::Unresolved;
                }
                for specifier in &prepared.symbols.star_exports {
                    if let Some(target) = prepared.resolve(specifier) {
                        let found = self.resolve_export(target, name, visited);
                        if found != Target::Unresolved {
                            return found;
                        }
                    }
                }
                Target::Unresolved
            }
        }
    }

    fn resolve_local(
        &self,
        module: usize,
        local: &str,
        visited: &mut FxHashSet<(usize, String)>,
    ) -> Target {
        let prepared = &self.modules[module];
        if let Some(binding) = prepared.symbols.imports.get(local) {
            return self.resolve_import(module, binding, visited);
        }
        if prepared.symbols.get(local).is_some() {
            return Target::Symbol(SymbolRef::new(module, local));
        }
        Target::Unresolved
    }

    fn resolve_import(
        &self,
        module: usize,
        binding: &ImportBinding,
        visited: &mut FxHashSet<(usize, String)>,
    ) -> Target {
        let Some(target) = self.modules[module].resolve(&binding.specifier) else {
            return Target::External {
                specifier: binding.specifier.clone(),
                imported: binding.imported.clone(),
            };
        };
        let has_export_equals = self.modules[target].symbols.exports.contains_key("export=");
        match &binding.imported {
            ImportedName::Named(name) => self.resolve_export(target, name, visited),
            ImportedName::Default => {
                match self.resolve_export(target, "default", visited) {
                    Target::Unresolved if has_export_equals => {
                        self.resolve_export(target, "export=", visited)
                    }
                    found => found,
                }
            }
            ImportedName::Namespace | ImportedName::ExportEquals => {
                if has_export_equals {
                    self.resolve_export(target, "export=", visited)
                } else {
                    Target::Namespace(target)
                }
            }
        }
    }

    /// Exported names of `module` in declaration order, then star-exported ones.
    fn export_names(
        &self,
        module: usize,
        visiting: &mut FxHashSet<usize>,
        out: &mut IndexSet<String>,
    ) {
        if !visiting.insert(module) {
            return;
        }
        let prepared = &self.modules[module];
        out.extend(prepared.symbols.exports.keys().cloned());
        for specifier in &prepared.symbols.star_exports {
            if let Some(target) = prepared.resolve(specifier) {
                let mut starred = IndexSet::new();
                self.export_names(target, visiting, &mut starred);
                out.extend(starred.into_iter().filter(|n| n != "default" && n != "export="));
            }
        }
    }

    fn external_stars(
        &self,
        module: usize,
        visiting: &mut FxHashSet<usize>,
        out: &mut Vec<String>,
    ) {
        if !visiting.insert(module) {
            return;
        }
        let prepared = &self.modules[module];
        for specifier in &prepared.symbols.star_exports {
            match prepared.resolve(specifier) {
                Some(target) => self.external_stars(target, visiting, out),
                None => {
                    if !out.contains(specifier) {
                        out.push(specifier.clone());
                    }
                }
            }
        }
    }

    fn link(&mut self, module: usize) -> LinkedModule {
        let modules = self.modules;
        let prepared = &modules[module];

        let mut imports = IndexMap::new();
        for (local, binding) in &prepared.symbols.imports {
            let mut visited = FxHashSet::default();
            imports.insert(local.clone(), self.resolve_import(module, binding, &mut visited));
        }

        let mut names = IndexSet::new();
        self.export_names(module, &mut FxHashSet::default(), &mut names);
        let mut exports = IndexMap::new();
        for name in names {
            let target = self.export(module, &name);
            if target != Target::Unresolved {
                exports.insert(name, target);
            }
        }

        let mut external_stars = Vec::new();
        self.external_stars(module, &mut FxHashSet::default(), &mut external_stars);

        let mut import_types = FxHashMap::default();
        for reference in prepared.info.iter().flat_map(|i| i.import_types.iter()) {
            let Some(target) = prepared.resolve(&reference.specifier) else {
                continue;
            };
            // A bare `import("m")` is the module's namespace object.
            let resolved = match &reference.name {
                Some(name) => self.export(target, name),
                None => Target::Namespace(target),
            };
            import_types.insert(reference.clone(), resolved);
        }

        LinkedModule {
            imports,
            exports,
            external_stars,
            import_types,
        }
    }
}

/// Resolve every module's imports, exports and import types.
#[tracing::instrument(level = "debug", skip_all, fields(modules = modules.len()))]
pub(crate) fn link_modules(modules: &[PreparedModule]) -> Vec<LinkedModule> {
    let mut linker = Linker {
        modules,
        memo: FxHashMap::default(),
    };
    (0..modules.len()).map(|module| linker.link(module)).collect()
}
