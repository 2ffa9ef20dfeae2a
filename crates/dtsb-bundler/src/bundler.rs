//! One bundling run, start to finish.
//!
//! Phases:
//! 1. assemble the chunk partition (sequential)
//! 2. prepare every module (parallel)
//! 3. link imports and exports across modules (sequential)
//! 4. deconflict every chunk (parallel)
//! 5. collect surfaces, compute liveness, expose cross-chunk requirements (sequential)
//! 6. print every chunk (parallel)
//!
//! Everything produced by a phase is read-only for the phases after it.

use crate::assemble::{Assembly, assemble_chunks};
use crate::deconflict::{ChunkNames, deconflict_chunk};
use crate::error::BundleError;
use crate::link::{Target, link_modules};
use crate::modularize::Modularizer;
use crate::options::{AmbientDependencies, BundleOptions, ChunkSpec, ModuleResolver};
use crate::output::ChunkDeclarations;
use crate::prepare::{PreparedModule, prepare_module};
use crate::shake::compute_liveness;
use crate::surface::{ChunkSurface, collect_surface, expose_required};
use dtsb_common::Diagnostic;
use dtsb_parser::SourceFile;
use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::Arc;

/// Result of a bundling run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleOutput {
    /// One entry per emitted chunk, in manifest order. Skipped chunks are absent.
    pub chunks: Vec<ChunkDeclarations>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BundleOutput {
    /// The output for the chunk whose code file is `file_name`.
    pub fn chunk(&self, file_name: &str) -> Option<&ChunkDeclarations> {
        self.chunks.iter().find(|chunk| chunk.chunk == file_name)
    }
}

#[tracing::instrument(level = "info", skip_all, fields(chunks = specs.len(), modules = sources.len()))]
pub(crate) fn run_bundle(
    sources: &IndexMap<String, Arc<SourceFile>>,
    resolver: &dyn ModuleResolver,
    specs: &[ChunkSpec],
    ambient: &AmbientDependencies,
    options: &BundleOptions,
) -> Result<BundleOutput, BundleError> {
    let is_known = |id: &str| sources.contains_key(id);
    let is_script = |id: &str| sources.get(id).is_some_and(|source| !source.is_module);

    let Assembly {
        chunks,
        modules: placements,
        index: bundled,
        mut diagnostics,
    } = assemble_chunks(specs, ambient, options, &is_known, &is_script)?;

    let mut modules: Vec<PreparedModule> = placements
        .par_iter()
        .map(|(id, chunk)| {
            let source = sources.get(id).ok_or_else(|| BundleError::ModuleMissing {
                module: id.clone(),
                chunk: chunks[*chunk].file_name.clone(),
            })?;
            prepare_module(id, source, *chunk, resolver, is_known, &bundled)
        })
        .collect::<Result<_, _>>()?;
    for module in &mut modules {
        diagnostics.append(&mut module.diagnostics);
    }

    let linked = link_modules(&modules);
    let namespace_demand: FxHashSet<usize> = linked
        .iter()
        .flat_map(|module| {
            module
                .imports
                .values()
                .chain(module.exports.values())
                .chain(module.import_types.values())
        })
        .filter_map(|target| match target {
            Target::Namespace(module) => Some(*module),
            _ => None,
        })
        .collect();

    let names: Vec<ChunkNames> = chunks
        .par_iter()
        .enumerate()
        .map(|(index, chunk)| deconflict_chunk(index, chunk, &modules, &linked, &namespace_demand))
        .collect();

    let mut surfaces: Vec<ChunkSurface> = chunks
        .iter()
        .map(|chunk| collect_surface(chunk, &modules, &linked))
        .collect();
    let liveness = compute_liveness(&modules, &linked, &surfaces);
    expose_required(
        &mut surfaces,
        &liveness.required,
        &chunks,
        &names,
        &modules,
        &mut diagnostics,
    );

    let modularizer = Modularizer {
        chunks: &chunks,
        modules: &modules,
        linked: &linked,
        names: &names,
        surfaces: &surfaces,
        liveness: &liveness,
        options,
    };
    let outputs = (0..chunks.len())
        .into_par_iter()
        .map(|index| modularizer.emit(index))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        chunks = outputs.len(),
        modules = modules.len(),
        diagnostics = diagnostics.len(),
        "bundle complete"
    );
    Ok(BundleOutput {
        chunks: outputs,
        diagnostics,
    })
}
