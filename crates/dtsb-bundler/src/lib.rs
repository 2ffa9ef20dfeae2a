//! Declaration bundler for the dtsb workspace.
//!
//! Merges per-module declaration trees into one declaration file per output
//! chunk of a host bundler:
//! - `assemble` - chunk partition, entry modules, ambient merging
//! - `symbols` - per-module symbol tables
//! - `trace` - free references of a statement
//! - `prepare` / `link` - per-module analysis and cross-module name resolution
//! - `deconflict` - chunk-unique top-level names
//! - `shake` - reachability from the export surfaces
//! - `surface` - what each chunk exports
//! - `modularize` - generated imports/exports and printing
//!
//! [`BundleContext`] is the entry point.

mod assemble;
mod bundler;
mod context;
mod deconflict;
pub mod error;
mod link;
mod modularize;
pub mod options;
mod output;
mod prepare;
mod shake;
mod surface;
pub mod symbols;
pub mod trace;

pub use bundler::BundleOutput;
pub use context::BundleContext;
pub use error::BundleError;
pub use options::{
    AmbientDependencies, BundleOptions, ChunkSpec, KnownModulesResolver, MULTI_ENTRY_MODULE_ID,
    ModuleResolver, OutputKind, OutputPathHook,
};
pub use output::{ChunkDeclarations, EmittedFile};
