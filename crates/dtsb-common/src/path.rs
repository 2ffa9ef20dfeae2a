//! Lexical path helpers.
//!
//! Nothing in here touches the file system: module ids handed to the bundler are
//! already resolved, so every operation is purely textual.

use std::path::{Component, Path, PathBuf};

pub const DECLARATION_EXTENSION: &str = ".d.ts";
pub const DECLARATION_MAP_EXTENSION: &str = ".d.ts.map";

const COMPOUND_EXTENSIONS: &[&str] = &[
    ".d.ts.map",
    ".d.mts",
    ".d.cts",
    ".d.ts",
];

/// Convert backslashes to forward slashes.
#[must_use]
pub fn ensure_posix(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lexically normalize a path: drop `.` segments and fold `..` where possible.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// The file name with any (compound) extension removed, e.g. `foo.d.ts` -> `foo`.
#[must_use]
pub fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_extension_str(&name).to_string()
}

fn strip_extension_str(name: &str) -> &str {
    for ext in COMPOUND_EXTENSIONS {
        if let Some(stripped) = name.strip_suffix(ext) {
            return stripped;
        }
    }
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Remove the extension of the last path segment (`.d.ts` counts as one).
#[must_use]
pub fn strip_extension(path: &str) -> String {
    let posix = ensure_posix(path);
    let (dir, name) = match posix.rfind('/') {
        Some(idx) => (&posix[..=idx], &posix[idx + 1..]),
        None => ("", posix.as_str()),
    };
    format!("{dir}{}", strip_extension_str(name))
}

/// Replace the extension of `path` with `extension` (which includes the dot).
#[must_use]
pub fn set_extension(path: &str, extension: &str) -> String {
    format!("{}{extension}", strip_extension(path))
}

/// Bare specifiers (`react`, `@scope/pkg`) refer to external libraries.
#[must_use]
pub fn is_external_library(specifier: &str) -> bool {
    !specifier.starts_with('.') && !specifier.starts_with('/')
}

/// Make a chunk-relative `path` usable as a relative module specifier.
#[must_use]
pub fn ensure_has_leading_dot_and_posix(path: &str) -> String {
    let posix = ensure_posix(path);
    if posix.starts_with('.') {
        posix
    } else if posix.starts_with('/') {
        format!(".{posix}")
    } else {
        format!("./{posix}")
    }
}

/// Lexical relative path from directory `from` to `to`.
#[must_use]
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<Component<'_>> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to_parts: Vec<Component<'_>> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from_parts.len() {
        out.push("..");
    }
    for part in &to_parts[common..] {
        out.push(part.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Strip leading `../` (or `..\`) segments so the path stays inside its root.
#[must_use]
pub fn clamp_to_root(path: &str) -> &str {
    let mut rest = path;
    while let Some(stripped) = rest
        .strip_prefix("../")
        .or_else(|| rest.strip_prefix("..\\"))
    {
        rest = stripped;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_and_set_extension_treat_declarations_as_one_extension() {
        assert_eq!(strip_extension("dist/index.d.ts"), "dist/index");
        assert_eq!(strip_extension("chunk-abc.js"), "chunk-abc");
        assert_eq!(strip_extension("a/.hidden"), "a/.hidden");
        assert_eq!(set_extension("shared/util.mjs", DECLARATION_EXTENSION), "shared/util.d.ts");
        assert_eq!(set_extension("index.js", DECLARATION_MAP_EXTENSION), "index.d.ts.map");
        assert_eq!(file_stem(Path::new("/src/my-file.d.ts")), "my-file");
    }

    #[test]
    fn relative_paths_between_directories() {
        assert_eq!(relative(Path::new("/out"), Path::new("/out/a/b.d.ts")), PathBuf::from("a/b.d.ts"));
        assert_eq!(relative(Path::new("/out/a"), Path::new("/out/b.d.ts")), PathBuf::from("../b.d.ts"));
        assert_eq!(relative(Path::new("/out"), Path::new("/out")), PathBuf::from("."));
    }

    #[test]
    fn leading_dot_and_clamping() {
        assert_eq!(ensure_has_leading_dot_and_posix("chunk"), "./chunk");
        assert_eq!(ensure_has_leading_dot_and_posix("a\\b"), "./a/b");
        assert_eq!(ensure_has_leading_dot_and_posix("../x"), "../x");
        assert_eq!(clamp_to_root("../../types/index.d.ts"), "types/index.d.ts");
        assert_eq!(clamp_to_root("index.d.ts"), "index.d.ts");
    }

    #[test]
    fn normalize_folds_parent_segments() {
        assert_eq!(normalize(Path::new("/a/./b/../c.d.ts")), PathBuf::from("/a/c.d.ts"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }
}
