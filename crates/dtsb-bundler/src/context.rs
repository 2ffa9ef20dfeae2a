//! Bundle context: the parsed modules one or more runs read from.
//!
//! A context owns its modules; nothing is shared between contexts, so
//! independent runs (for example in tests) never see each other's state.
//! Replacing a module swaps the whole tree, it is never edited in place.

use crate::assemble::module_id;
use crate::bundler::{BundleOutput, run_bundle};
use crate::error::BundleError;
use crate::options::{
    AmbientDependencies, BundleOptions, ChunkSpec, KnownModulesResolver, ModuleResolver,
};
use dtsb_common::Diagnostic;
use dtsb_parser::{SourceFile, parse};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Default)]
pub struct BundleContext {
    modules: IndexMap<String, Arc<SourceFile>>,
    resolver: Option<Arc<dyn ModuleResolver>>,
}

impl std::fmt::Debug for BundleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleContext")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl BundleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `resolver` instead of resolving against the parsed modules.
    pub fn with_resolver(resolver: impl ModuleResolver + 'static) -> Self {
        Self {
            modules: IndexMap::new(),
            resolver: Some(Arc::new(resolver)),
        }
    }

    /// Parse `text` as the declarations of `path` and add (or replace) it.
    /// Returns the syntax diagnostics.
    pub fn parse_module(&mut self, path: &str, text: impl Into<String>) -> Vec<Diagnostic> {
        let id = module_id(path);
        let result = parse(id.clone(), text);
        tracing::trace!(module = %id, diagnostics = result.diagnostics.len(), "parsed module");
        self.modules.insert(id, Arc::new(result.source_file));
        result.diagnostics
    }

    /// Add an already parsed module under its file name. Returns the module id.
    pub fn add_module(&mut self, mut source: SourceFile) -> String {
        let id = module_id(&source.file_name);
        source.file_name.clone_from(&id);
        self.modules.insert(id.clone(), Arc::new(source));
        id
    }

    pub fn remove_module(&mut self, path: &str) -> bool {
        self.modules.shift_remove(&module_id(path)).is_some()
    }

    pub fn module(&self, path: &str) -> Option<&SourceFile> {
        self.modules.get(&module_id(path)).map(|source| &**source)
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Bundle the parsed modules into one declaration file per chunk.
    ///
    /// Recoverable problems (skipped chunks, unresolvable references) are
    /// reported in [`BundleOutput::diagnostics`]; only internal errors fail.
    pub fn bundle(
        &self,
        chunks: &[ChunkSpec],
        ambient: &AmbientDependencies,
        options: &BundleOptions,
    ) -> Result<BundleOutput, BundleError> {
        match &self.resolver {
            Some(resolver) => run_bundle(&self.modules, resolver.as_ref(), chunks, ambient, options),
            None => {
                let resolver = KnownModulesResolver::new(self.modules.keys());
                run_bundle(&self.modules, &resolver, chunks, ambient, options)
            }
        }
    }
}
