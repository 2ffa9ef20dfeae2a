//! Output file names and cross-chunk specifiers.

use crate::options::{BundleOptions, OutputKind};
use dtsb_common::path::{
    DECLARATION_EXTENSION, DECLARATION_MAP_EXTENSION, clamp_to_root,
    ensure_has_leading_dot_and_posix, ensure_posix, normalize, relative, set_extension,
    strip_extension,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One file produced by a bundling run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedFile {
    /// Relative to the output directory, posix separators, never escaping it.
    pub file_name: String,
    pub absolute_path: PathBuf,
    pub contents: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDeclarations {
    /// The chunk's code output file name as given in the manifest.
    pub chunk: String,
    pub declaration: EmittedFile,
    pub declaration_map: Option<EmittedFile>,
}

/// Where one chunk's declaration files go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChunkPaths {
    pub declaration: PathBuf,
    pub declaration_file_name: String,
    pub map: PathBuf,
    pub map_file_name: String,
}

impl ChunkPaths {
    /// Base name of the map, as written in `sourceMappingURL`.
    pub fn map_base_name(&self) -> String {
        base_name(&self.map)
    }

    pub fn declaration_base_name(&self) -> String {
        base_name(&self.declaration)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn remap(options: &BundleOptions, default: PathBuf, kind: OutputKind) -> PathBuf {
    match options.output_path.as_ref().and_then(|hook| hook(&default, kind)) {
        Some(path) => normalize(&options.cwd.join(path)),
        None => default,
    }
}

/// `path` relative to `root`, posix, with leading `../` segments stripped.
pub(crate) fn file_name_in(root: &Path, path: &Path) -> String {
    let relative = ensure_posix(&relative(root, path).to_string_lossy());
    clamp_to_root(&relative).to_string()
}

pub(crate) fn chunk_paths(chunk_file_name: &str, options: &BundleOptions) -> ChunkPaths {
    let out_dir = options.absolute_out_dir();
    let declaration_dir = options.absolute_declaration_dir();

    let default_declaration = normalize(
        &declaration_dir.join(set_extension(chunk_file_name, DECLARATION_EXTENSION)),
    );
    let declaration = remap(options, default_declaration, OutputKind::Declaration);

    // The map always sits next to its declaration; the hook only picks its name.
    let default_map = normalize(
        &declaration_dir.join(set_extension(chunk_file_name, DECLARATION_MAP_EXTENSION)),
    );
    let map_name = base_name(&remap(options, default_map, OutputKind::DeclarationMap));
    let map = declaration
        .parent()
        .map_or_else(|| PathBuf::from(&map_name), |dir| dir.join(&map_name));

    ChunkPaths {
        declaration_file_name: file_name_in(&out_dir, &declaration),
        map_file_name: file_name_in(&out_dir, &map),
        declaration,
        map,
    }
}

/// Relative specifier for importing chunk `to` from chunk `from` (code output
/// file names), without extension.
pub(crate) fn chunk_specifier(from: &str, to: &str) -> String {
    let from_dir = Path::new(from).parent().unwrap_or_else(|| Path::new(""));
    let relative = relative(from_dir, Path::new(to));
    ensure_has_leading_dot_and_posix(&strip_extension(&relative.to_string_lossy()))
}

/// Name of `module_id` in the `sources` of a map written at `map`.
pub(crate) fn source_name(map: &Path, module_id: &str) -> String {
    let dir = map.parent().unwrap_or_else(|| Path::new("/"));
    ensure_posix(&relative(dir, Path::new(module_id)).to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn options() -> BundleOptions {
        BundleOptions {
            cwd: PathBuf::from("/project"),
            out_dir: PathBuf::from("dist"),
            ..BundleOptions::default()
        }
    }

    #[test]
    fn declaration_paths_replace_the_code_extension() {
        let paths = chunk_paths("index.js", &options());
        assert_eq!(paths.declaration, PathBuf::from("/project/dist/index.d.ts"));
        assert_eq!(paths.declaration_file_name, "index.d.ts");
        assert_eq!(paths.map, PathBuf::from("/project/dist/index.d.ts.map"));
        assert_eq!(paths.map_file_name, "index.d.ts.map");
        assert_eq!(paths.map_base_name(), "index.d.ts.map");
    }

    #[test]
    fn declaration_dir_outside_out_dir_is_clamped() {
        let options = BundleOptions {
            declaration_dir: Some(PathBuf::from("types")),
            ..options()
        };
        let paths = chunk_paths("nested/index.js", &options);
        assert_eq!(paths.declaration, PathBuf::from("/project/types/nested/index.d.ts"));
        assert_eq!(paths.declaration_file_name, "types/nested/index.d.ts");
    }

    #[test]
    fn output_hook_moves_declaration_and_names_the_map() {
        let options = BundleOptions {
            output_path: Some(Arc::new(|path: &Path, kind: OutputKind| match kind {
                OutputKind::Declaration => Some(PathBuf::from("/project/dist/types/main.d.ts")),
                OutputKind::DeclarationMap => path
                    .file_name()
                    .map(|_| PathBuf::from("/elsewhere/main.d.ts.map")),
            })),
            ..options()
        };
        let paths = chunk_paths("index.js", &options);
        assert_eq!(paths.declaration_file_name, "types/main.d.ts");
        assert_eq!(paths.map, PathBuf::from("/project/dist/types/main.d.ts.map"));
    }

    #[test]
    fn chunk_specifiers_are_relative_and_extensionless() {
        assert_eq!(chunk_specifier("index.js", "chunk-abc.js"), "./chunk-abc");
        assert_eq!(chunk_specifier("a/index.js", "shared/util.js"), "../shared/util");
        assert_eq!(chunk_specifier("a/index.js", "a/b/c.mjs"), "./b/c");
    }

    #[test]
    fn source_names_are_relative_to_the_map() {
        let map = Path::new("/project/dist/index.d.ts.map");
        assert_eq!(source_name(map, "/project/src/a.d.ts"), "../src/a.d.ts");
    }
}
