//! Properties every bundle must have, checked by re-reading the emitted files.

use dtsb_bundler::symbols::{ImportedName, ModuleSymbols, declared_names, extract_symbols};
use dtsb_bundler::trace::free_identifiers;
use dtsb_bundler::{AmbientDependencies, BundleContext, BundleOptions, BundleOutput, ChunkSpec};
use dtsb_parser::{SourceFile, parse};
use indexmap::{IndexMap, IndexSet};
use std::path::PathBuf;

const SHARED: &str = r#"export interface Options { verbose: boolean }
export interface Result { ok: boolean }
interface Cache { size: number }
export declare function createCache(): Cache;
declare const internal: number;
"#;

const READER: &str = r#"import { Options, Result } from "./shared";
interface State { pos: number }
export declare function read(opts: Options): Result;
export declare function state(): State;
"#;

const WRITER: &str = r#"import { Options } from "./shared";
interface State { buffered: number }
export declare function write(opts: Options, state: State): void;
"#;

const INDEX: &str = r#"export { read } from "./reader";
export { write } from "./writer";
export { Result } from "./shared";
"#;

fn context(modules: &[(&str, &str)]) -> BundleContext {
    let mut ctx = BundleContext::new();
    for (path, text) in modules {
        let diagnostics = ctx.parse_module(path, *text);
        assert!(diagnostics.is_empty(), "{path}: {diagnostics:?}");
    }
    ctx
}

fn options() -> BundleOptions {
    BundleOptions {
        cwd: PathBuf::from("/project"),
        out_dir: PathBuf::from("dist"),
        ..BundleOptions::default()
    }
}

fn entry_chunk(file_name: &str, modules: &[&str], entries: &[&str]) -> ChunkSpec {
    let mut spec = ChunkSpec::new(file_name, true, modules);
    spec.entry_modules = entries.iter().map(|e| (*e).to_string()).collect();
    spec
}

/// The reader/writer project split into an entry chunk and a shared chunk.
fn split_project() -> BundleOutput {
    let ctx = context(&[
        ("/project/src/shared.d.ts", SHARED),
        ("/project/src/reader.d.ts", READER),
        ("/project/src/writer.d.ts", WRITER),
        ("/project/src/index.d.ts", INDEX),
    ]);
    let chunks = [
        entry_chunk(
            "index.js",
            &[
                "/project/src/reader.d.ts",
                "/project/src/writer.d.ts",
                "/project/src/index.d.ts",
            ],
            &["/project/src/index.d.ts"],
        ),
        ChunkSpec::new("shared-1a2b.js", false, &["/project/src/shared.d.ts"]),
    ];
    ctx.bundle(&chunks, &AmbientDependencies::default(), &options())
        .expect("bundle should succeed")
}

/// Every emitted declaration file, re-parsed, keyed by chunk file name.
fn reparse(output: &BundleOutput) -> IndexMap<String, SourceFile> {
    output
        .chunks
        .iter()
        .map(|chunk| {
            let result = parse(
                format!("/project/dist/{}", chunk.declaration.file_name),
                chunk.declaration.contents.clone(),
            );
            assert!(
                result.diagnostics.is_empty(),
                "{} does not reparse: {:?}\n{}",
                chunk.chunk,
                result.diagnostics,
                chunk.declaration.contents
            );
            (chunk.chunk.clone(), result.source_file)
        })
        .collect()
}

fn symbols(source: &SourceFile) -> ModuleSymbols {
    extract_symbols(&source.file_name, &source.statements, source.is_module)
}

#[test]
fn test_top_level_names_are_unique_per_chunk() {
    let output = split_project();
    for (chunk, source) in reparse(&output) {
        let mut seen = IndexSet::new();
        for stmt in &source.statements {
            for name in declared_names(stmt) {
                assert!(seen.insert(name.clone()), "{chunk}: `{name}` declared twice");
            }
        }
    }
}

#[test]
fn test_every_reference_resolves_inside_its_chunk() {
    let output = split_project();
    for (chunk, source) in reparse(&output) {
        let table = symbols(&source);
        for stmt in &source.statements {
            for name in free_identifiers(&source.file_name, stmt).expect("traceable output") {
                assert!(
                    table.symbols.contains_key(&name),
                    "{chunk}: `{name}` is referenced but neither declared nor imported"
                );
            }
        }
    }
}

#[test]
fn test_unreachable_declarations_are_dropped() {
    let output = split_project();
    let shared = &output.chunk("shared-1a2b.js").expect("shared chunk").declaration.contents;
    assert!(shared.contains("interface Options"), "{shared}");
    assert!(shared.contains("interface Result"), "{shared}");
    assert!(!shared.contains("Cache"), "{shared}");
    assert!(!shared.contains("internal"), "{shared}");
}

#[test]
fn test_cross_chunk_imports_are_exported_by_their_target() {
    let output = split_project();
    let sources = reparse(&output);
    let exports: IndexMap<String, ModuleSymbols> = sources
        .iter()
        .map(|(chunk, source)| (chunk.clone(), symbols(source)))
        .collect();

    let mut checked = 0;
    for (chunk, table) in &exports {
        for binding in table.imports.values() {
            let Some(target) = binding.specifier.strip_prefix("./") else {
                continue;
            };
            let target = format!("{target}.js");
            let Some(target_table) = exports.get(&target) else {
                panic!("{chunk} imports from unknown chunk {target}");
            };
            let ImportedName::Named(name) = &binding.imported else {
                panic!("{chunk}: cross-chunk imports are always named, got {binding:?}");
            };
            assert!(
                target_table.exports.contains_key(name),
                "{chunk} imports `{name}` which {target} does not export"
            );
            checked += 1;
        }
    }
    assert!(checked > 0, "expected at least one cross-chunk import");
}

#[test]
fn test_entry_chunk_exports_the_entry_surface() {
    let output = split_project();
    let sources = reparse(&output);
    let index = symbols(&sources["index.js"]);
    for name in ["read", "write", "Result"] {
        assert!(index.exports.contains_key(name), "index.js does not export `{name}`");
    }
    // `state` is exported by reader.d.ts, which the entry module does not re-export.
    assert!(!index.exports.contains_key("state"));
    assert!(!index.symbols.contains_key("state"));
}

#[test]
fn test_bundling_a_bundle_changes_nothing() {
    let ctx = context(&[
        (
            "/project/src/a.d.ts",
            "interface Item { a: string }\nexport declare function fromA(): Item;\n",
        ),
        (
            "/project/src/b.d.ts",
            "interface Item { b: number }\nexport declare function fromB(): Item;\n",
        ),
        (
            "/project/src/index.d.ts",
            r#"export * from "./a";
export * from "./b";
interface Item { c: boolean }
export declare function fromIndex(): Item;
"#,
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/a.d.ts", "/project/src/b.d.ts", "/project/src/index.d.ts"],
        &["/project/src/index.d.ts"],
    );
    let first = ctx
        .bundle(&[chunk], &AmbientDependencies::default(), &options())
        .expect("first bundle");
    let bundled = &first.chunk("index.js").expect("index chunk").declaration.contents;
    assert!(bundled.contains("declare function fromA(): Item_$0;"), "{bundled}");
    assert!(bundled.contains("declare function fromB(): Item_$1;"), "{bundled}");
    assert!(bundled.contains("export declare function fromIndex(): Item;"), "{bundled}");

    let again = context(&[("/project/src/index.d.ts", bundled.as_str())]);
    let chunk = entry_chunk("index.js", &["/project/src/index.d.ts"], &["/project/src/index.d.ts"]);
    let second = again
        .bundle(&[chunk], &AmbientDependencies::default(), &options())
        .expect("second bundle");
    assert_eq!(
        &second.chunk("index.js").expect("index chunk").declaration.contents,
        bundled
    );
}

#[test]
fn test_chunks_sharing_a_script_are_merged() {
    let ctx = context(&[
        (
            "/project/src/globals.d.ts",
            "declare const VERSION: string;\ninterface GlobalConfig { debug: boolean }\n",
        ),
        ("/project/src/util.d.ts", "export declare function version(): string;\n"),
        (
            "/project/src/index.d.ts",
            "export declare function config(): GlobalConfig;\nexport { version } from \"./util\";\n",
        ),
        ("/project/src/extra.d.ts", "export declare function unused(): void;\n"),
    ]);
    let chunks = [
        ChunkSpec::new(
            "shared.js",
            false,
            &["/project/src/util.d.ts", "/project/src/extra.d.ts"],
        ),
        entry_chunk("index.js", &["/project/src/index.d.ts"], &["/project/src/index.d.ts"]),
    ];
    let mut ambient = AmbientDependencies::default();
    ambient.insert("/project/src/util.d.ts".into(), vec!["/project/src/globals.d.ts".into()]);
    ambient.insert("/project/src/index.d.ts".into(), vec!["/project/src/globals.d.ts".into()]);

    let output = ctx.bundle(&chunks, &ambient, &options()).expect("bundle");
    assert_eq!(output.chunks.len(), 1, "{:?}", output.chunks);

    let text = &output.chunk("index.js").expect("merged chunk").declaration.contents;
    assert_eq!(text.matches("VERSION").count(), 1, "{text}");
    assert!(text.contains("declare global {"), "{text}");
    assert!(text.contains("export declare function config(): GlobalConfig;"), "{text}");
    assert!(text.contains("declare function version(): string;"), "{text}");
    assert!(text.contains("export { version };"), "{text}");
    assert!(!text.contains("unused"), "{text}");
}
