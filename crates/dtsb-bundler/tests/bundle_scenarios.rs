//! End-to-end bundling scenarios: modules in, declaration files out.

use dtsb_bundler::{
    AmbientDependencies, BundleContext, BundleOptions, BundleOutput, ChunkSpec, OutputKind,
};
use dtsb_common::diagnostics::diagnostic_codes;
use std::path::{Path, PathBuf};
use std::sync::Arc;

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

fn bundle(ctx: &BundleContext, chunks: &[ChunkSpec]) -> BundleOutput {
    ctx.bundle(chunks, &AmbientDependencies::default(), &options())
        .expect("bundle should succeed")
}

fn contents<'a>(output: &'a BundleOutput, chunk: &str) -> &'a str {
    &output
        .chunk(chunk)
        .unwrap_or_else(|| panic!("no output for {chunk}: {:?}", output.diagnostics))
        .declaration
        .contents
}

#[test]
fn test_colliding_names_are_suffixed_in_the_non_entry_module() {
    let ctx = context(&[
        (
            "/project/src/a.d.ts",
            "export declare function run(): void;\nexport { helper } from \"./b\";\n",
        ),
        (
            "/project/src/b.d.ts",
            "declare function run(): void;\nexport { run as helper };\n",
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/a.d.ts", "/project/src/b.d.ts"],
        &["/project/src/a.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(
        contents(&output, "index.js"),
        "export declare function run(): void;\ndeclare function run_$0(): void;\nexport { run_$0 as helper };\n"
    );
}

#[test]
fn test_unreachable_declarations_are_removed() {
    let ctx = context(&[
        (
            "/project/src/types.d.ts",
            "export interface Level { value: number }\ninterface Orphan {}\n",
        ),
        (
            "/project/src/index.d.ts",
            r#"import { Level } from "./types";
interface Internal { hidden: boolean }
export interface Config { level: Level }
declare function unrelated(): void;
"#,
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/types.d.ts", "/project/src/index.d.ts"],
        &["/project/src/index.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);
    let text = contents(&output, "index.js");

    assert!(text.contains("interface Level {"), "{text}");
    assert!(!text.contains("export interface Level"), "{text}");
    assert!(text.contains("export interface Config {"), "{text}");
    assert!(!text.contains("export { Level }"), "{text}");
    assert!(!text.contains("Internal"), "{text}");
    assert!(!text.contains("unrelated"), "{text}");
    assert!(!text.contains("Orphan"), "{text}");
    assert!(!text.contains("from \"./types\""), "{text}");
}

#[test]
fn test_entry_chunk_exposes_only_entry_module_exports() {
    let ctx = context(&[
        (
            "/project/src/helpers.d.ts",
            "export interface Dep { x: number }\nexport interface Unrelated { y: string }\n",
        ),
        (
            "/project/src/index.d.ts",
            "import { Dep } from \"./helpers\";\nexport interface Config { d: Dep }\n",
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/helpers.d.ts", "/project/src/index.d.ts"],
        &["/project/src/index.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);

    assert_eq!(
        contents(&output, "index.js"),
        "interface Dep {\n    x: number;\n}\nexport interface Config {\n    d: Dep;\n}\n"
    );
}

#[test]
fn test_parameter_named_like_a_type_keeps_the_type_alive() {
    let ctx = context(&[
        ("/project/src/a.d.ts", "export interface Options { a: number }\n"),
        (
            "/project/src/b.d.ts",
            "interface Options { b: number }\nexport declare function g(Options: Options): void;\n",
        ),
        (
            "/project/src/index.d.ts",
            "export { Options } from \"./a\";\nexport { g } from \"./b\";\n",
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/a.d.ts", "/project/src/b.d.ts", "/project/src/index.d.ts"],
        &["/project/src/index.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);
    let text = contents(&output, "index.js");

    assert!(text.contains("interface Options {\n    a: number;\n}"), "{text}");
    assert!(text.contains("interface Options_$0 {\n    b: number;\n}"), "{text}");
    assert!(text.contains("declare function g(Options: Options_$0): void;"), "{text}");
    assert!(text.contains("export { Options, g };"), "{text}");
}

#[test]
fn test_cross_chunk_default_import_becomes_named_import() {
    let ctx = context(&[
        (
            "/project/src/parser.d.ts",
            r#"declare class Parser { parse(text: string): Node; }
interface Node { kind: string }
declare const unused: number;
export default Parser;
"#,
        ),
        (
            "/project/src/index.d.ts",
            "import Parser from \"./parser\";\nexport declare function createParser(): Parser;\n",
        ),
    ]);
    let chunks = [
        entry_chunk("index.js", &["/project/src/index.d.ts"], &["/project/src/index.d.ts"]),
        ChunkSpec::new("parser-abc.js", false, &["/project/src/parser.d.ts"]),
    ];
    let output = bundle(&ctx, &chunks);

    assert_eq!(
        contents(&output, "index.js"),
        "import { Parser } from \"./parser-abc\";\nexport declare function createParser(): Parser;\n"
    );
    let parser = contents(&output, "parser-abc.js");
    assert!(parser.contains("declare class Parser {"), "{parser}");
    assert!(parser.contains("interface Node {"), "{parser}");
    assert!(parser.contains("export { Parser };"), "{parser}");
    assert!(!parser.contains("unused"), "{parser}");
    assert!(!parser.contains("export default"), "{parser}");
    assert_eq!(
        output.chunk("parser-abc.js").map(|c| c.declaration.file_name.as_str()),
        Some("parser-abc.d.ts")
    );
}

#[test]
fn test_namespace_import_is_synthesized_inside_the_chunk() {
    let ctx = context(&[
        (
            "/project/src/shapes.d.ts",
            "export interface Circle { r: number }\nexport declare function area(c: Circle): number;\n",
        ),
        (
            "/project/src/index.d.ts",
            "import * as shapes from \"./shapes\";\nexport declare function describe(c: shapes.Circle): string;\n",
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/shapes.d.ts", "/project/src/index.d.ts"],
        &["/project/src/index.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);
    let text = contents(&output, "index.js");

    assert!(text.contains("declare namespace shapes {"), "{text}");
    assert!(text.contains("    export { Circle, area };"), "{text}");
    assert!(text.contains("export declare function describe(c: shapes.Circle): string;"), "{text}");
    assert!(!text.contains("import * as"), "{text}");
}

#[test]
fn test_bare_import_type_becomes_the_namespace_object() {
    let ctx = context(&[
        ("/project/src/lazy.d.ts", "export declare function load(): void;\n"),
        (
            "/project/src/index.d.ts",
            "export declare const loader: typeof import(\"./lazy\");\n",
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/lazy.d.ts", "/project/src/index.d.ts"],
        &["/project/src/index.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);
    let text = contents(&output, "index.js");

    assert!(text.contains("declare namespace lazy {\n    export { load };\n}"), "{text}");
    assert!(text.contains("declare function load(): void;"), "{text}");
    assert!(text.contains("export declare const loader: typeof lazy;"), "{text}");
    assert!(!text.contains("import("), "{text}");
}

#[test]
fn test_bare_import_type_across_chunks_points_at_the_owning_chunk() {
    let ctx = context(&[
        ("/project/src/lazy.d.ts", "export declare function load(): void;\n"),
        (
            "/project/src/index.d.ts",
            "export declare const loader: typeof import(\"./lazy\");\n",
        ),
    ]);
    let chunks = [
        entry_chunk("index.js", &["/project/src/index.d.ts"], &["/project/src/index.d.ts"]),
        ChunkSpec::new("lazy-9f.js", false, &["/project/src/lazy.d.ts"]),
    ];
    let output = bundle(&ctx, &chunks);

    let index = contents(&output, "index.js");
    assert!(
        index.contains("export declare const loader: typeof import(\"./lazy-9f\").lazy;"),
        "{index}"
    );
    let lazy = contents(&output, "lazy-9f.js");
    assert!(lazy.contains("declare namespace lazy {"), "{lazy}");
    assert!(lazy.contains("export { lazy };"), "{lazy}");
}

#[test]
fn test_external_imports_are_kept_and_merged() {
    let ctx = context(&[
        (
            "/project/src/a.d.ts",
            "import { Readable } from \"stream\";\nexport declare function read(): Readable;\n",
        ),
        (
            "/project/src/index.d.ts",
            "import { Writable } from \"stream\";\nexport * from \"./a\";\nexport declare function write(): Writable;\n",
        ),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/a.d.ts", "/project/src/index.d.ts"],
        &["/project/src/index.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);
    let text = contents(&output, "index.js");

    assert_eq!(text.matches("from \"stream\"").count(), 1, "{text}");
    assert!(text.contains("Readable"), "{text}");
    assert!(text.contains("Writable"), "{text}");
    assert!(text.contains("export { read };"), "{text}");
    assert!(!text.contains("./a"), "{text}");
}

#[test]
fn test_chunk_without_exports_is_still_a_module() {
    let ctx = context(&[("/project/src/index.d.ts", "interface Hidden {}\nexport {};\n")]);
    let chunk = entry_chunk("index.js", &["/project/src/index.d.ts"], &["/project/src/index.d.ts"]);
    let output = bundle(&ctx, &[chunk]);

    assert_eq!(contents(&output, "index.js"), "export {};\n");
}

#[test]
fn test_multi_entry_chunk_exports_every_entry() {
    let ctx = context(&[
        ("/project/src/a.d.ts", "export declare const a: number;\n"),
        ("/project/src/b.d.ts", "export declare const b: string;\n"),
    ]);
    let chunk = entry_chunk(
        "index.js",
        &["/project/src/a.d.ts", "/project/src/b.d.ts"],
        &["/project/src/a.d.ts", "/project/src/b.d.ts"],
    );
    let output = bundle(&ctx, &[chunk]);

    assert_eq!(
        contents(&output, "index.js"),
        "export declare const a: number;\nexport declare const b: string;\n"
    );
}

#[test]
fn test_chunk_with_missing_entry_is_skipped() {
    let ctx = context(&[("/project/src/a.d.ts", "export declare const a: number;\n")]);
    let chunk = entry_chunk("index.js", &["/project/src/a.d.ts"], &["/project/src/main.d.ts"]);
    let output = bundle(&ctx, &[chunk]);

    assert!(output.chunk("index.js").is_none());
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, diagnostic_codes::CHUNK_MISSING_ENTRY_MODULE);
}

#[test]
fn test_declaration_map_is_emitted_next_to_the_declaration() {
    let source = "export declare const answer: number;\n";
    let ctx = context(&[("/project/src/a.d.ts", source)]);
    let chunk = entry_chunk("index.js", &["/project/src/a.d.ts"], &["/project/src/a.d.ts"]);
    let options = BundleOptions {
        declaration_map: true,
        ..options()
    };
    let output = ctx
        .bundle(&[chunk], &AmbientDependencies::default(), &options)
        .expect("bundle should succeed");

    let chunk = output.chunk("index.js").expect("index chunk");
    assert_eq!(chunk.declaration.file_name, "index.d.ts");
    assert!(
        chunk
            .declaration
            .contents
            .ends_with("//# sourceMappingURL=index.d.ts.map\n"),
        "{}",
        chunk.declaration.contents
    );

    let map = chunk.declaration_map.as_ref().expect("declaration map");
    assert_eq!(map.file_name, "index.d.ts.map");
    assert_eq!(map.absolute_path, PathBuf::from("/project/dist/index.d.ts.map"));
    let json: serde_json::Value = serde_json::from_str(&map.contents).expect("valid JSON");
    assert_eq!(json["version"], 3);
    assert_eq!(json["file"], "index.d.ts");
    assert_eq!(json["sources"][0], "../src/a.d.ts");
    assert_eq!(json["sourcesContent"][0], source);
}

#[test]
fn test_output_path_hook_relocates_declarations() {
    let ctx = context(&[("/project/src/a.d.ts", "export declare const a: number;\n")]);
    let chunk = entry_chunk("index.js", &["/project/src/a.d.ts"], &["/project/src/a.d.ts"]);
    let options = BundleOptions {
        output_path: Some(Arc::new(|path: &Path, _: OutputKind| {
            let name = path.file_name()?;
            Some(PathBuf::from("/project/dist/types").join(name))
        })),
        ..options()
    };
    let output = ctx
        .bundle(&[chunk], &AmbientDependencies::default(), &options)
        .expect("bundle should succeed");

    let declaration = &output.chunk("index.js").expect("index chunk").declaration;
    assert_eq!(declaration.absolute_path, PathBuf::from("/project/dist/types/index.d.ts"));
    assert_eq!(declaration.file_name, "types/index.d.ts");
}

#[test]
fn test_independent_contexts_do_not_share_modules() {
    let first = context(&[("/project/src/a.d.ts", "export declare const first: number;\n")]);
    let second = context(&[("/project/src/a.d.ts", "export declare const second: number;\n")]);
    let chunk = entry_chunk("index.js", &["/project/src/a.d.ts"], &["/project/src/a.d.ts"]);

    let one = bundle(&first, std::slice::from_ref(&chunk));
    let two = bundle(&second, &[chunk]);
    assert_eq!(contents(&one, "index.js"), "export declare const first: number;\n");
    assert_eq!(contents(&two, "index.js"), "export declare const second: number;\n");
}
