//! One CLI run: read modules, bundle, write declaration files.

use crate::args::CliArgs;
use crate::config::{ResolvedConfig, resolve_config};
use crate::reporter::Reporter;
use anyhow::{Context, Result};
use dtsb_bundler::{BundleContext, BundleOutput};
use dtsb_common::{Diagnostic, DiagnosticCategory};
use std::path::{Path, PathBuf};

/// What a run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub output: BundleOutput,
    /// Parse diagnostics followed by bundle diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Absolute paths written, in chunk order. Empty for dry runs.
    pub written: Vec<PathBuf>,
    /// Module text by path, for rendering diagnostic locations.
    pub sources: Vec<(String, String)>,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }

    pub fn reporter(&self, color: bool) -> Reporter {
        let mut reporter = Reporter::new(color);
        for (path, text) in &self.sources {
            reporter.add_source(path, text);
        }
        reporter
    }
}

pub fn run(args: &CliArgs) -> Result<RunSummary> {
    let config = resolve_config(args)?;
    run_with_config(&config)
}

#[tracing::instrument(level = "info", skip_all, fields(chunks = config.manifest.chunks.len()))]
pub fn run_with_config(config: &ResolvedConfig) -> Result<RunSummary> {
    let mut context = BundleContext::new();
    let mut diagnostics = Vec::new();
    let mut sources = Vec::new();

    for path in config.manifest.module_paths() {
        let Some(text) = read_module(Path::new(path))? else {
            continue;
        };
        diagnostics.extend(context.parse_module(path, text.as_str()));
        sources.push((path.to_string(), text));
    }
    tracing::debug!(modules = context.len(), "parsed modules");

    let output = context
        .bundle(
            &config.manifest.chunks,
            &config.manifest.ambient_dependencies,
            &config.options,
        )
        .context("bundling failed")?;
    diagnostics.extend(output.diagnostics.iter().cloned());

    let written = if config.dry_run {
        Vec::new()
    } else {
        write_output(&output)?
    };

    Ok(RunSummary {
        output,
        diagnostics,
        written,
        sources,
    })
}

/// Declaration inputs only; anything else a chunk lists (code files, assets) is
/// left for the bundler to drop as an unknown member.
fn read_module(path: &Path) -> Result<Option<String>> {
    let name = path.to_string_lossy();
    if !(name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")) {
        tracing::debug!(module = %name, "not a declaration file");
        return Ok(None);
    }
    if !path.exists() {
        tracing::warn!(module = %name, "listed module does not exist");
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Some(text))
}

fn write_output(output: &BundleOutput) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for chunk in &output.chunks {
        let files = std::iter::once(&chunk.declaration).chain(chunk.declaration_map.as_ref());
        for file in files {
            if let Some(dir) = file.absolute_path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            std::fs::write(&file.absolute_path, &file.contents)
                .with_context(|| format!("failed to write {}", file.absolute_path.display()))?;
            tracing::debug!(path = %file.absolute_path.display(), "wrote file");
            written.push(file.absolute_path.clone());
        }
    }
    Ok(written)
}
