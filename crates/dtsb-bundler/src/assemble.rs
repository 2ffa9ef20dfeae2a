//! Chunk Assembler.
//!
//! Turns the host bundler's chunk manifest into the partition every later pass
//! works on: members filtered to parsed modules, entry modules resolved, and
//! chunks that share script (ambient) modules merged so globals are never
//! emitted twice.

use crate::error::BundleError;
use crate::options::{AmbientDependencies, BundleOptions, ChunkSpec, MULTI_ENTRY_MODULE_ID};
use dtsb_common::Diagnostic;
use dtsb_common::diagnostics::diagnostic_codes;
use dtsb_common::path::{ensure_posix, normalize};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::path::Path;

/// Normalized, posix form of a module path; the key modules are stored under.
pub(crate) fn module_id(path: &str) -> String {
    ensure_posix(&normalize(Path::new(path)).to_string_lossy())
}

/// A chunk after filtering and ambient merging. Modules are indices into
/// [`Assembly::modules`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AssembledChunk {
    pub file_name: String,
    pub is_entry: bool,
    pub members: Vec<usize>,
    pub entries: Vec<usize>,
}

impl AssembledChunk {
    pub fn is_entry_module(&self, module: usize) -> bool {
        self.entries.contains(&module)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Assembly {
    pub chunks: Vec<AssembledChunk>,
    /// Every bundled module id with its owning chunk, in chunk order.
    pub modules: Vec<(String, usize)>,
    /// Module id to index in `modules`.
    pub index: FxHashMap<String, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
struct Draft {
    file_name: String,
    is_entry: bool,
    members: IndexSet<String>,
    entries: IndexSet<String>,
    scripts: IndexSet<String>,
}

fn skipped(file_name: &str, code: u32, args: &[&str]) -> Diagnostic {
    Diagnostic::from_code(file_name.to_string(), 0, 0, code, args)
}

/// Resolve members and entries of one chunk, or say why it is skipped.
fn draft_chunk(
    spec: &ChunkSpec,
    options: &BundleOptions,
    is_known: &dyn Fn(&str) -> bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<Draft>, BundleError> {
    let listed: IndexSet<String> = spec.modules.iter().map(|m| module_id(m)).collect();
    let members: IndexSet<String> = listed.iter().filter(|m| is_known(m)).cloned().collect();
    let Some(last) = members.last() else {
        diagnostics.push(skipped(
            &spec.file_name,
            diagnostic_codes::CHUNK_WITHOUT_MEMBERS,
            &[&spec.file_name],
        ));
        return Ok(None);
    };

    let multi_entry = spec
        .modules
        .last()
        .is_some_and(|m| m == MULTI_ENTRY_MODULE_ID);
    let declared: Option<IndexSet<String>> = match &options.multi_entry_modules {
        Some(list) if multi_entry => Some(
            list.iter()
                .map(|p| module_id(&p.to_string_lossy()))
                .collect(),
        ),
        _ if !spec.entry_modules.is_empty() => {
            Some(spec.entry_modules.iter().map(|m| module_id(m)).collect())
        }
        _ => None,
    };

    let entries = match declared {
        Some(entries) => {
            for entry in &entries {
                if members.contains(entry) {
                    continue;
                }
                if listed.contains(entry) {
                    return Err(BundleError::ModuleMissing {
                        module: entry.clone(),
                        chunk: spec.file_name.clone(),
                    });
                }
                diagnostics.push(skipped(
                    &spec.file_name,
                    diagnostic_codes::CHUNK_MISSING_ENTRY_MODULE,
                    &[&spec.file_name, entry],
                ));
                return Ok(None);
            }
            entries
        }
        None => IndexSet::from([last.clone()]),
    };

    Ok(Some(Draft {
        file_name: spec.file_name.clone(),
        is_entry: spec.is_entry,
        members,
        entries,
        scripts: IndexSet::new(),
    }))
}

/// Script modules a chunk pulls in: script members plus scripts reachable
/// through the ambient dependency graph.
fn reachable_scripts(
    members: &IndexSet<String>,
    ambient: &AmbientDependencies,
    is_known: &dyn Fn(&str) -> bool,
    is_script: &dyn Fn(&str) -> bool,
) -> IndexSet<String> {
    let mut scripts = IndexSet::new();
    let mut visited: IndexSet<String> = members.clone();
    let mut queue: VecDeque<String> = members.iter().cloned().collect();
    while let Some(module) = queue.pop_front() {
        if is_known(&module) && is_script(&module) {
            scripts.insert(module.clone());
        }
        let Some(deps) = ambient.get(&module).or_else(|| {
            ambient
                .iter()
                .find(|(key, _)| module_id(key) == module)
                .map(|(_, deps)| deps)
        }) else {
            continue;
        };
        for dep in deps {
            let dep = module_id(dep);
            if visited.insert(dep.clone()) {
                queue.push_back(dep);
            }
        }
    }
    scripts
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

/// Build the chunk partition used by the rest of the run.
#[tracing::instrument(level = "debug", skip_all, fields(chunks = specs.len()))]
pub(crate) fn assemble_chunks(
    specs: &[ChunkSpec],
    ambient: &AmbientDependencies,
    options: &BundleOptions,
    is_known: &dyn Fn(&str) -> bool,
    is_script: &dyn Fn(&str) -> bool,
) -> Result<Assembly, BundleError> {
    let mut assembly = Assembly::default();

    let mut drafts = Vec::new();
    for spec in specs {
        if let Some(mut draft) = draft_chunk(spec, options, is_known, &mut assembly.diagnostics)? {
            draft.scripts = reachable_scripts(&draft.members, ambient, is_known, is_script);
            drafts.push(draft);
        }
    }

    // Chunks sharing a script module end up in one group.
    let mut parent: Vec<usize> = (0..drafts.len()).collect();
    let mut script_owner: FxHashMap<&str, usize> = FxHashMap::default();
    for (index, draft) in drafts.iter().enumerate() {
        for script in &draft.scripts {
            match script_owner.get(script.as_str()) {
                Some(&other) => {
                    let (a, b) = (find(&mut parent, index), find(&mut parent, other));
                    if a != b {
                        parent[a.max(b)] = a.min(b);
                    }
                }
                None => {
                    script_owner.insert(script.as_str(), index);
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: FxHashMap<usize, usize> = FxHashMap::default();
    for index in 0..drafts.len() {
        let root = find(&mut parent, index);
        let group = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(index);
    }

    for group in groups {
        let representative = group
            .iter()
            .copied()
            .find(|&i| drafts[i].is_entry)
            .unwrap_or(group[0]);
        if group.len() > 1 {
            tracing::debug!(
                chunk = %drafts[representative].file_name,
                merged = group.len() - 1,
                "merged chunks sharing ambient modules"
            );
        }

        let mut members: IndexSet<String> = IndexSet::new();
        let mut entries: IndexSet<String> = drafts[representative].entries.clone();
        for &index in &group {
            for script in &drafts[index].scripts {
                if !drafts[index].members.contains(script) {
                    members.insert(script.clone());
                }
            }
        }
        for &index in &group {
            members.extend(drafts[index].members.iter().cloned());
            if drafts[index].is_entry {
                entries.extend(drafts[index].entries.iter().cloned());
            }
        }

        let chunk_index = assembly.chunks.len();
        let mut chunk = AssembledChunk {
            file_name: drafts[representative].file_name.clone(),
            is_entry: drafts[representative].is_entry,
            members: Vec::with_capacity(members.len()),
            entries: Vec::new(),
        };
        for id in members {
            if assembly.index.contains_key(&id) {
                tracing::debug!(
                    module = %id,
                    chunk = %chunk.file_name,
                    "module already owned by an earlier chunk"
                );
                continue;
            }
            let module = assembly.modules.len();
            assembly.index.insert(id.clone(), module);
            assembly.modules.push((id, chunk_index));
            chunk.members.push(module);
        }
        if chunk.members.is_empty() {
            continue;
        }
        chunk.entries = entries
            .iter()
            .filter_map(|id| assembly.index.get(id).copied())
            .filter(|module| chunk.members.contains(module))
            .collect();
        if chunk.entries.is_empty()
            && let Some(&last) = chunk.members.last()
        {
            chunk.entries.push(last);
        }
        assembly.chunks.push(chunk);
    }

    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn known(ids: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |id| ids.iter().any(|known| *known == id)
    }

    fn ids(assembly: &Assembly, modules: &[usize]) -> Vec<String> {
        modules
            .iter()
            .map(|&m| assembly.modules[m].0.clone())
            .collect()
    }

    #[test]
    fn entry_defaults_to_last_known_member() {
        let specs = [ChunkSpec::new(
            "index.js",
            true,
            &["/src/a.d.ts", "/src/style.css", "/src/index.d.ts"],
        )];
        let is_known = known(&["/src/a.d.ts", "/src/index.d.ts"]);
        let assembly = assemble_chunks(
            &specs,
            &AmbientDependencies::default(),
            &BundleOptions::default(),
            &is_known,
            &|_| false,
        )
        .unwrap();
        assert_eq!(assembly.chunks.len(), 1);
        let chunk = &assembly.chunks[0];
        assert_eq!(ids(&assembly, &chunk.members), ["/src/a.d.ts", "/src/index.d.ts"]);
        assert_eq!(ids(&assembly, &chunk.entries), ["/src/index.d.ts"]);
    }

    #[test]
    fn missing_entry_skips_the_chunk_with_a_warning() {
        let mut spec = ChunkSpec::new("index.js", true, &["/src/a.d.ts"]);
        spec.entry_modules = vec!["/src/main.d.ts".to_string()];
        let is_known = known(&["/src/a.d.ts"]);
        let assembly = assemble_chunks(
            &[spec],
            &AmbientDependencies::default(),
            &BundleOptions::default(),
            &is_known,
            &|_| false,
        )
        .unwrap();
        assert!(assembly.chunks.is_empty());
        assert_eq!(assembly.diagnostics.len(), 1);
        assert_eq!(
            assembly.diagnostics[0].code,
            diagnostic_codes::CHUNK_MISSING_ENTRY_MODULE
        );
    }

    #[test]
    fn listed_but_unparsed_entry_is_fatal() {
        let mut spec = ChunkSpec::new("index.js", true, &["/src/a.d.ts", "/src/main.d.ts"]);
        spec.entry_modules = vec!["/src/main.d.ts".to_string()];
        let is_known = known(&["/src/a.d.ts"]);
        let err = assemble_chunks(
            &[spec],
            &AmbientDependencies::default(),
            &BundleOptions::default(),
            &is_known,
            &|_| false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            BundleError::ModuleMissing {
                module: "/src/main.d.ts".to_string(),
                chunk: "index.js".to_string(),
            }
        );
    }

    #[test]
    fn multi_entry_marker_uses_configured_entries() {
        let specs = [ChunkSpec::new(
            "bundle.js",
            true,
            &["/src/a.d.ts", "/src/b.d.ts", MULTI_ENTRY_MODULE_ID],
        )];
        let options = BundleOptions {
            multi_entry_modules: Some(vec![
                PathBuf::from("/src/a.d.ts"),
                PathBuf::from("/src/b.d.ts"),
            ]),
            ..BundleOptions::default()
        };
        let is_known = known(&["/src/a.d.ts", "/src/b.d.ts"]);
        let assembly = assemble_chunks(
            &specs,
            &AmbientDependencies::default(),
            &options,
            &is_known,
            &|_| false,
        )
        .unwrap();
        let chunk = &assembly.chunks[0];
        assert_eq!(ids(&assembly, &chunk.entries), ["/src/a.d.ts", "/src/b.d.ts"]);
    }

    #[test]
    fn chunks_sharing_a_script_are_merged() {
        let specs = [
            ChunkSpec::new("shared.js", false, &["/src/util.d.ts"]),
            ChunkSpec::new("index.js", true, &["/src/index.d.ts"]),
        ];
        let mut ambient = AmbientDependencies::default();
        ambient.insert("/src/util.d.ts".to_string(), vec!["/src/globals.d.ts".to_string()]);
        ambient.insert("/src/index.d.ts".to_string(), vec!["/src/globals.d.ts".to_string()]);
        let is_known = known(&["/src/util.d.ts", "/src/index.d.ts", "/src/globals.d.ts"]);
        let is_script = |id: &str| id == "/src/globals.d.ts";
        let assembly = assemble_chunks(
            &specs,
            &ambient,
            &BundleOptions::default(),
            &is_known,
            &is_script,
        )
        .unwrap();

        assert_eq!(assembly.chunks.len(), 1);
        let chunk = &assembly.chunks[0];
        assert_eq!(chunk.file_name, "index.js");
        assert!(chunk.is_entry);
        assert_eq!(
            ids(&assembly, &chunk.members),
            ["/src/globals.d.ts", "/src/util.d.ts", "/src/index.d.ts"]
        );
        assert_eq!(ids(&assembly, &chunk.entries), ["/src/index.d.ts"]);
    }
}
