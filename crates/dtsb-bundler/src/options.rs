//! Bundle inputs: chunk manifest entries, options and module resolution.

use dtsb_common::NewLineKind;
use dtsb_common::path::{ensure_posix, is_external_library, normalize, strip_extension};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Module id the multi-entry plugin uses for its synthetic entry point.
pub const MULTI_ENTRY_MODULE_ID: &str = "\0rollup-plugin-multi-entry:entry-point";

/// One chunk as produced by the host bundler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkSpec {
    /// The chunk's code output file name, relative to the output directory.
    pub file_name: String,
    #[serde(default)]
    pub is_entry: bool,
    /// Member module paths in bundling order.
    pub modules: Vec<String>,
    /// Declared entry modules. Empty means "the last member".
    #[serde(default)]
    pub entry_modules: Vec<String>,
}

impl ChunkSpec {
    pub fn new(file_name: impl Into<String>, is_entry: bool, modules: &[&str]) -> Self {
        Self {
            file_name: file_name.into(),
            is_entry,
            modules: modules.iter().map(|m| (*m).to_string()).collect(),
            entry_modules: Vec::new(),
        }
    }
}

/// `module -> modules it depends on`, used to find chunks sharing ambient files.
pub type AmbientDependencies = IndexMap<String, Vec<String>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputKind {
    Declaration,
    DeclarationMap,
}

/// Optional remapping of a default absolute output path.
pub type OutputPathHook = Arc<dyn Fn(&Path, OutputKind) -> Option<PathBuf> + Send + Sync>;

#[derive(Clone)]
pub struct BundleOptions {
    pub declaration_map: bool,
    pub new_line: NewLineKind,
    /// Base for relative `out_dir` / `declaration_dir`.
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    /// Where declaration files go; defaults to `out_dir`.
    pub declaration_dir: Option<PathBuf>,
    /// Entry modules of a multi-entry aggregate chunk.
    pub multi_entry_modules: Option<Vec<PathBuf>>,
    pub output_path: Option<OutputPathHook>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            declaration_map: false,
            new_line: NewLineKind::Lf,
            cwd: PathBuf::from("/"),
            out_dir: PathBuf::from("dist"),
            declaration_dir: None,
            multi_entry_modules: None,
            output_path: None,
        }
    }
}

impl fmt::Debug for BundleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleOptions")
            .field("declaration_map", &self.declaration_map)
            .field("new_line", &self.new_line)
            .field("cwd", &self.cwd)
            .field("out_dir", &self.out_dir)
            .field("declaration_dir", &self.declaration_dir)
            .field("multi_entry_modules", &self.multi_entry_modules)
            .field("output_path", &self.output_path.is_some())
            .finish()
    }
}

impl BundleOptions {
    pub(crate) fn absolute_out_dir(&self) -> PathBuf {
        normalize(&self.cwd.join(&self.out_dir))
    }

    pub(crate) fn absolute_declaration_dir(&self) -> PathBuf {
        match &self.declaration_dir {
            Some(dir) => normalize(&self.cwd.join(dir)),
            None => self.absolute_out_dir(),
        }
    }
}

// =============================================================================
// Module resolution
// =============================================================================

/// Resolves an import specifier written in `from` to an absolute module path.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf>;
}

impl<F> ModuleResolver for F
where
    F: Fn(&str, &Path) -> Option<PathBuf> + Send + Sync,
{
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
        self(specifier, from)
    }
}

/// Resolves relative specifiers against a fixed set of known module ids.
#[derive(Clone, Debug, Default)]
pub struct KnownModulesResolver {
    known: FxHashSet<String>,
}

impl KnownModulesResolver {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            known: modules
                .into_iter()
                .map(|m| ensure_posix(m.as_ref()))
                .collect(),
        }
    }

    fn candidates(base: &str) -> [String; 6] {
        [
            base.to_string(),
            format!("{base}.d.ts"),
            format!("{base}.ts"),
            format!("{}.d.ts", strip_extension(base)),
            format!("{base}/index.d.ts"),
            format!("{base}/index.ts"),
        ]
    }
}

impl ModuleResolver for KnownModulesResolver {
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
        if is_external_library(specifier) {
            return None;
        }
        let dir = from.parent().unwrap_or_else(|| Path::new("/"));
        let joined = normalize(&dir.join(specifier));
        let base = ensure_posix(&joined.to_string_lossy());
        Self::candidates(&base)
            .into_iter()
            .find(|candidate| self.known.contains(candidate))
            .map(PathBuf::from)
    }
}
