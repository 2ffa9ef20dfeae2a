//! Export surfaces.
//!
//! An entry chunk exposes the exports of its entry modules; other members only
//! contribute what those re-export. Every chunk also exposes whatever other
//! chunks still import from it after shaking; for a non-entry chunk that is all
//! it exposes. The second part is only known once liveness has run, so surfaces
//! are built in two steps: [`collect_surface`] before shaking, then
//! [`expose_required`].

use crate::assemble::AssembledChunk;
use crate::deconflict::{ChunkNames, namespace_base_name};
use crate::link::{LinkedModule, Target};
use crate::prepare::PreparedModule;
use dtsb_common::Diagnostic;
use dtsb_common::diagnostics::diagnostic_codes;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub(crate) struct ChunkSurface {
    /// Public name to what it exports; `default` and `export=` included.
    pub exports: IndexMap<String, Target>,
    /// First public name of each exported item, `export=` excluded.
    exposure_of: FxHashMap<Target, String>,
    /// `export * from "lib"` specifiers.
    pub external_stars: Vec<String>,
    /// `export as namespace X`, only for entry chunks.
    pub namespace_export: Option<String>,
}

impl ChunkSurface {
    fn insert(&mut self, name: &str, target: Target) {
        if name != "export=" {
            self.exposure_of
                .entry(target.clone())
                .or_insert_with(|| name.to_string());
        }
        self.exports.insert(name.to_string(), target);
    }

    /// The name another chunk imports `target` under.
    pub fn exposure(&self, target: &Target) -> Option<&str> {
        self.exposure_of.get(target).map(String::as_str)
    }
}

/// Exports the chunk has by virtue of its entry modules.
pub(crate) fn collect_surface(
    chunk: &AssembledChunk,
    modules: &[PreparedModule],
    linked: &[LinkedModule],
) -> ChunkSurface {
    let mut surface = ChunkSurface::default();
    if !chunk.is_entry {
        return surface;
    }
    for &module in chunk.entries.iter().filter(|&&m| !modules[m].is_script()) {
        for (name, target) in &linked[module].exports {
            // Earlier entry modules win on a shared public name.
            if !surface.exports.contains_key(name.as_str()) {
                surface.insert(name, target.clone());
            }
        }
        for specifier in &linked[module].external_stars {
            if !surface.external_stars.contains(specifier) {
                surface.external_stars.push(specifier.clone());
            }
        }
        if surface.namespace_export.is_none() {
            surface.namespace_export = modules[module].symbols.namespace_export.clone();
        }
    }
    surface
}

/// Export everything other chunks import from each chunk that is not exported
/// yet, under its final local name (suffixed when that public name is taken).
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn expose_required(
    surfaces: &mut [ChunkSurface],
    required: &[IndexSet<Target>],
    chunks: &[AssembledChunk],
    names: &[ChunkNames],
    modules: &[PreparedModule],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (index, surface) in surfaces.iter_mut().enumerate() {
        for target in &required[index] {
            if surface.exposure(target).is_some() {
                continue;
            }
            let preferred = names[index]
                .local_name(target, index, modules)
                .unwrap_or_else(|| match target {
                    Target::Namespace(module) => namespace_base_name(&modules[*module].id),
                    Target::Symbol(symbol) => symbol.name.clone(),
                    _ => String::from("_"),
                });
            let mut public = preferred.clone();
            let mut counter = 0usize;
            while surface.exports.contains_key(&public) {
                public = format!("{preferred}_${counter}");
                counter += 1;
            }
            if public != preferred && matches!(target, Target::Namespace(_)) {
                diagnostics.push(Diagnostic::from_code(
                    chunks[index].file_name.clone(),
                    0,
                    0,
                    diagnostic_codes::NAMESPACE_EXPORT_NAME_TAKEN,
                    &[&chunks[index].file_name, &preferred],
                ));
            }
            tracing::trace!(
                chunk = %chunks[index].file_name,
                name = %public,
                "exposing for other chunks"
            );
            surface.insert(&public, target.clone());
        }
    }
}
