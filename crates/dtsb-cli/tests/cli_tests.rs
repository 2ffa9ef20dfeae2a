//! CLI driver tests against scratch projects on disk.

use clap::Parser;
use dtsb_cli::args::CliArgs;
use dtsb_cli::config::BundleManifest;
use dtsb_cli::driver;
use dtsb_cli::reporter::Reporter;
use dtsb_cli::tracing_config::LogFormat;
use dtsb_common::{Diagnostic, NewLineKind};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  "chunks": [
    {
      "fileName": "index.js",
      "isEntry": true,
      "modules": ["src/types.d.ts", "src/index.d.ts", "src/styles.css"],
      "entryModules": ["src/index.d.ts"]
    }
  ]
}"#;

fn project(manifest: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let src = dir.path().join("src");
    fs::create_dir_all(&src).expect("create src");
    fs::write(
        src.join("types.d.ts"),
        "export interface Options { verbose: boolean }\ninterface Unused {}\n",
    )
    .expect("write types");
    fs::write(
        src.join("index.d.ts"),
        "import { Options } from \"./types\";\nexport declare function run(options: Options): void;\n",
    )
    .expect("write index");
    fs::write(dir.path().join("bundle.json"), manifest).expect("write manifest");
    dir
}

fn args(dir: &Path, extra: &[&str]) -> CliArgs {
    let manifest = dir.join("bundle.json");
    let mut argv = vec!["dtsb".to_string(), manifest.to_string_lossy().into_owned()];
    argv.extend(extra.iter().map(|s| (*s).to_string()));
    CliArgs::try_parse_from(argv).expect("valid arguments")
}

#[test]
fn test_bundle_writes_declarations_into_out_dir() {
    let dir = project(MANIFEST);
    let summary = driver::run(&args(dir.path(), &[])).expect("run");

    assert!(summary.diagnostics.is_empty(), "{:?}", summary.diagnostics);
    let written = dir.path().join("dist").join("index.d.ts");
    assert_eq!(summary.written, [written.clone()]);

    let text = fs::read_to_string(&written).expect("read output");
    assert!(text.contains("interface Options {"), "{text}");
    assert!(text.contains("export declare function run(options: Options): void;"), "{text}");
    assert!(!text.contains("export { Options }"), "{text}");
    assert!(!text.contains("Unused"), "{text}");
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = project(MANIFEST);
    let summary = driver::run(&args(dir.path(), &["--dry-run"])).expect("run");

    assert!(summary.written.is_empty());
    assert_eq!(summary.output.chunks.len(), 1);
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_flags_override_manifest_options() {
    let manifest = MANIFEST.replacen("\"chunks\"", "\"outDir\": \"build\",\n  \"chunks\"", 1);
    let dir = project(&manifest);
    let summary = driver::run(&args(
        dir.path(),
        &["--outDir", "lib", "--declarationMap", "--newLine", "crlf"],
    ))
    .expect("run");

    let declaration = dir.path().join("lib").join("index.d.ts");
    let map = dir.path().join("lib").join("index.d.ts.map");
    assert_eq!(summary.written, [declaration.clone(), map.clone()]);
    assert!(!dir.path().join("build").exists());

    let text = fs::read_to_string(&declaration).expect("read declaration");
    assert!(text.contains("\r\n"), "{text:?}");
    assert!(text.ends_with("//# sourceMappingURL=index.d.ts.map\r\n"), "{text:?}");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&map).expect("read map")).expect("map JSON");
    assert_eq!(json["file"], "index.d.ts");
}

#[test]
fn test_missing_entry_is_reported_not_fatal() {
    let manifest = MANIFEST.replace("\"src/index.d.ts\"]", "\"src/main.d.ts\"]");
    let dir = project(&manifest);
    let summary = driver::run(&args(dir.path(), &[])).expect("run");

    assert!(summary.written.is_empty());
    assert_eq!(summary.diagnostics.len(), 1, "{:?}", summary.diagnostics);
    assert_eq!(summary.diagnostics[0].code, 9001);
    assert_eq!(summary.diagnostics[0].file, "index.js");
}

#[test]
fn test_unreadable_manifest_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("bundle.json"), "{ not json").expect("write manifest");
    let error = driver::run(&args(dir.path(), &[])).expect_err("invalid manifest");
    assert!(format!("{error:#}").contains("invalid bundle manifest"), "{error:#}");
}

#[test]
fn test_manifest_paths_resolve_against_manifest_dir() {
    let mut manifest = BundleManifest::parse(
        r#"{
  "chunks": [{ "fileName": "a.js", "isEntry": true, "modules": ["./src/a.d.ts", "../shared/b.d.ts"] }],
  "ambientDependencies": { "./src/a.d.ts": ["./types/globals.d.ts"] },
  "newLine": "crlf"
}"#,
    )
    .expect("manifest");
    manifest.resolve_paths(Path::new("/work/project"));

    assert_eq!(
        manifest.chunks[0].modules,
        ["/work/project/src/a.d.ts", "/work/shared/b.d.ts"]
    );
    assert_eq!(
        manifest.ambient_dependencies.get("/work/project/src/a.d.ts"),
        Some(&vec!["/work/project/types/globals.d.ts".to_string()])
    );
    assert_eq!(manifest.new_line, Some(NewLineKind::Crlf));
    assert_eq!(
        manifest.module_paths(),
        [
            "/work/project/src/a.d.ts",
            "/work/shared/b.d.ts",
            "/work/project/types/globals.d.ts"
        ]
    );
}

#[test]
fn test_unknown_manifest_keys_are_rejected() {
    let error = BundleManifest::parse(r#"{ "chunks": [], "outdir": "dist" }"#).expect_err("unknown key");
    assert!(format!("{error:#}").contains("outdir"), "{error:#}");
}

#[test]
fn test_reporter_renders_locations_for_known_sources() {
    let mut reporter = Reporter::new(false);
    reporter.add_source("/src/a.d.ts", "interface A {}\ndeclare const x: ;\n");
    let diagnostics = [
        Diagnostic::error("/src/a.d.ts".into(), 32, 1, "Type expected.".into(), 1110),
        Diagnostic::warning("index.js".into(), 0, 0, "Skipped.".into(), 9001),
    ];

    assert_eq!(
        reporter.render(&diagnostics),
        "/src/a.d.ts:2:18 - error TS1110: Type expected.\nindex.js - warning DTSB9001: Skipped."
    );
}

#[test]
fn test_log_format_names() {
    assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
    assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::parse(""), LogFormat::Text);
    assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
}
