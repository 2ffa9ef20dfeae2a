//! Bundle manifest loading and option resolution.
//!
//! The manifest describes the chunk graph the host bundler produced. Relative
//! paths in it are resolved against the manifest's own directory, so a manifest
//! can be moved together with its project.

use crate::args::CliArgs;
use anyhow::{Context, Result, bail};
use dtsb_bundler::{AmbientDependencies, BundleOptions, ChunkSpec, MULTI_ENTRY_MODULE_ID};
use dtsb_common::NewLineKind;
use dtsb_common::path::normalize;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleManifest {
    pub chunks: Vec<ChunkSpec>,
    #[serde(default)]
    pub ambient_dependencies: AmbientDependencies,
    pub out_dir: Option<PathBuf>,
    pub declaration_dir: Option<PathBuf>,
    pub declaration_map: Option<bool>,
    pub new_line: Option<NewLineKind>,
    pub multi_entry_modules: Option<Vec<PathBuf>>,
}

impl BundleManifest {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid bundle manifest")
    }

    /// Make every module path absolute relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &str| -> String {
            if path == MULTI_ENTRY_MODULE_ID {
                return path.to_string();
            }
            normalize(&base.join(path)).to_string_lossy().into_owned()
        };
        for chunk in &mut self.chunks {
            for module in chunk.modules.iter_mut().chain(chunk.entry_modules.iter_mut()) {
                *module = resolve(module);
            }
        }
        self.ambient_dependencies = std::mem::take(&mut self.ambient_dependencies)
            .into_iter()
            .map(|(module, deps)| (resolve(&module), deps.iter().map(|d| resolve(d)).collect()))
            .collect();
        if let Some(modules) = &mut self.multi_entry_modules {
            for module in modules {
                *module = normalize(&base.join(&*module));
            }
        }
    }

    /// Every module path the manifest mentions, without duplicates.
    pub fn module_paths(&self) -> Vec<&str> {
        let mut seen = rustc_hash::FxHashSet::default();
        let chunk_modules = self.chunks.iter().flat_map(|c| c.modules.iter());
        let ambient = self
            .ambient_dependencies
            .iter()
            .flat_map(|(module, deps)| std::iter::once(module).chain(deps));
        chunk_modules
            .chain(ambient)
            .map(String::as_str)
            .filter(|path| *path != MULTI_ENTRY_MODULE_ID && seen.insert(*path))
            .collect()
    }
}

/// Manifest plus the options one run uses.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub manifest: BundleManifest,
    pub options: BundleOptions,
    pub dry_run: bool,
}

pub fn load_manifest(path: &Path) -> Result<BundleManifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let mut manifest = BundleManifest::parse(&text)
        .with_context(|| format!("in manifest {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.resolve_paths(&absolute(base)?);
    Ok(manifest)
}

/// Command-line flags win over manifest values.
pub fn resolve_config(args: &CliArgs) -> Result<ResolvedConfig> {
    let manifest_path = absolute(&args.manifest)?;
    let manifest = load_manifest(&manifest_path)?;
    if manifest.chunks.is_empty() {
        bail!("manifest {} lists no chunks", manifest_path.display());
    }

    let manifest_dir = manifest_path
        .parent()
        .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
    let cwd = match &args.cwd {
        Some(cwd) => absolute(cwd)?,
        None => manifest_dir,
    };

    let options = BundleOptions {
        declaration_map: args.declaration_map || manifest.declaration_map.unwrap_or(false),
        new_line: args
            .new_line
            .map(NewLineKind::from)
            .or(manifest.new_line)
            .unwrap_or_default(),
        out_dir: args
            .out_dir
            .clone()
            .or_else(|| manifest.out_dir.clone())
            .unwrap_or_else(|| PathBuf::from("dist")),
        declaration_dir: args
            .declaration_dir
            .clone()
            .or_else(|| manifest.declaration_dir.clone()),
        multi_entry_modules: manifest.multi_entry_modules.clone(),
        cwd,
        output_path: None,
    };
    tracing::debug!(?options, "resolved bundle options");

    Ok(ResolvedConfig {
        manifest,
        options,
        dry_run: args.dry_run,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(normalize(&cwd.join(path)))
}
