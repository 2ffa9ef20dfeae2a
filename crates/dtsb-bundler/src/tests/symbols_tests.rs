//! Symbol extraction and default-export normalization tests.

use super::*;
use dtsb_parser::parse;

fn statements(source: &str) -> (Vec<Stmt>, bool) {
    let result = parse("/src/index.d.ts", source);
    assert!(
        result.diagnostics.is_empty(),
        "unexpected parse diagnostics: {:?}",
        result.diagnostics
    );
    (result.source_file.statements, result.source_file.is_module)
}

fn symbols_of(source: &str) -> ModuleSymbols {
    let (statements, is_module) = statements(source);
    extract_symbols("/src/index.d.ts", &statements, is_module)
}

#[test]
fn test_declarations_and_local_exports() {
    let symbols = symbols_of(
        r#"
export declare function run(): void;
declare class Helper {}
interface Options { verbose: boolean }
export { Helper as H, Options };
export default Helper;
"#,
    );

    let names: Vec<&str> = symbols.symbols.keys().map(String::as_str).collect();
    assert_eq!(names, ["run", "Helper", "Options"]);

    assert_eq!(symbols.exports.get("run"), Some(&ExportEntry::Local("run".into())));
    assert_eq!(symbols.exports.get("H"), Some(&ExportEntry::Local("Helper".into())));
    assert_eq!(symbols.exports.get("Options"), Some(&ExportEntry::Local("Options".into())));
    assert_eq!(symbols.exports.get("default"), Some(&ExportEntry::Local("Helper".into())));

    let helper = symbols.get("Helper").expect("Helper symbol");
    assert_eq!(helper.kind, SymbolKind::Class);
    assert!(helper.exported);
    assert!(helper.is_default_export);
    assert_eq!(symbols.get("run").map(|s| s.kind), Some(SymbolKind::Function));
    assert!(!symbols.is_script);
}

#[test]
fn test_import_bindings() {
    let symbols = symbols_of(
        r#"
import def, { a as b, type c } from "./x";
import * as ns from "lib";
import eq = require("eq");
import "./side";
export {};
"#,
    );

    let imported = |local: &str| symbols.imports.get(local).map(|b| b.imported.clone());
    assert_eq!(imported("def"), Some(ImportedName::Default));
    assert_eq!(imported("b"), Some(ImportedName::Named("a".into())));
    assert_eq!(imported("c"), Some(ImportedName::Named("c".into())));
    assert_eq!(imported("ns"), Some(ImportedName::Namespace));
    assert_eq!(imported("eq"), Some(ImportedName::ExportEquals));

    assert!(symbols.imports["c"].type_only);
    assert_eq!(symbols.imports["ns"].specifier, "lib");
    assert!(symbols.is_import("def"));
    assert_eq!(symbols.get("b").map(|s| s.kind), Some(SymbolKind::ImportBinding));
    assert_eq!(symbols.side_effect_imports, ["./side"]);
}

#[test]
fn test_re_exports_and_stars() {
    let symbols = symbols_of(
        r#"
export { a as b } from "./m";
export * from "./star";
export * as ns from "./ns";
export as namespace Lib;
"#,
    );

    assert_eq!(
        symbols.exports.get("b"),
        Some(&ExportEntry::ReExport {
            specifier: "./m".into(),
            imported: "a".into(),
        })
    );
    assert_eq!(
        symbols.exports.get("ns"),
        Some(&ExportEntry::Namespace {
            specifier: "./ns".into(),
        })
    );
    assert_eq!(symbols.star_exports, ["./star"]);
    assert_eq!(symbols.namespace_export.as_deref(), Some("Lib"));
    assert!(symbols.symbols.is_empty());
}

#[test]
fn test_destructured_variables_declare_every_bound_name() {
    let symbols = symbols_of("export declare const { a, b: [c, , d] }: Pair;");
    let names: Vec<&str> = symbols.symbols.keys().map(String::as_str).collect();
    assert_eq!(names, ["a", "c", "d"]);
    assert!(symbols.exports.contains_key("c"));
    assert_eq!(symbols.get("d").map(|s| s.kind), Some(SymbolKind::Variable));
}

#[test]
fn test_overloads_and_merged_declarations_share_a_symbol() {
    let symbols = symbols_of(
        r#"
declare function pick(a: string): string;
declare function pick(a: number): number;
interface Box {}
declare namespace Box {}
export {};
"#,
    );
    assert_eq!(symbols.get("pick").map(|s| s.statements.to_vec()), Some(vec![0, 1]));
    assert_eq!(symbols.get("Box").map(|s| s.statements.to_vec()), Some(vec![2, 3]));
}

#[test]
fn test_ambient_module_declarations_are_not_symbols() {
    let symbols = symbols_of(
        r#"
declare module "augmented" {
    interface Extra {}
}
declare global {
    interface Window { custom: string }
}
export declare const value: number;
"#,
    );
    let names: Vec<&str> = symbols.symbols.keys().map(String::as_str).collect();
    assert_eq!(names, ["value"]);
}

#[test]
fn test_script_symbols_are_ambient() {
    let symbols = symbols_of("declare function greet(name: string): void;\ninterface Greeting {}");
    assert!(symbols.is_script);
    assert!(symbols.symbols.values().all(|s| s.is_ambient));
    assert!(symbols.exports.is_empty());
}

#[test]
fn test_default_export_name_is_pascal_cased_file_stem() {
    assert_eq!(default_export_name("/src/index.d.ts"), "defaultIndexExport");
    assert_eq!(default_export_name("/src/my-file.d.ts"), "defaultMyFileExport");
    assert_eq!(default_export_name("/src/parser_utils.ts"), "defaultParserUtilsExport");
}

#[test]
fn test_anonymous_default_class_gets_synthesized_name() {
    let (mut statements, is_module) = statements("export default class {}");
    name_anonymous_defaults("/src/index.d.ts", &mut statements);

    let StmtKind::Class(class) = &statements[0].kind else {
        panic!("expected class, got {:?}", statements[0].kind);
    };
    assert_eq!(class.name.as_ref().map(|n| n.name.as_str()), Some("defaultIndexExport"));

    let symbols = extract_symbols("/src/index.d.ts", &statements, is_module);
    assert_eq!(
        symbols.exports.get("default"),
        Some(&ExportEntry::Local("defaultIndexExport".into()))
    );
}

#[test]
fn test_default_entity_expression_becomes_alias() {
    let (mut statements, _) = statements("declare namespace ns { const inner: number; }\nexport default ns.inner;");
    name_anonymous_defaults("/src/index.d.ts", &mut statements);

    assert_eq!(statements.len(), 3);
    let StmtKind::ImportEquals(alias) = &statements[1].kind else {
        panic!("expected import alias, got {:?}", statements[1].kind);
    };
    assert_eq!(alias.name.name, "defaultIndexExport");
    let ModuleReference::Entity(entity) = &alias.target else {
        panic!("expected entity target");
    };
    let parts: Vec<&str> = entity.parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(parts, ["ns", "inner"]);

    let StmtKind::ExportAssignment(assignment) = &statements[2].kind else {
        panic!("expected export assignment");
    };
    assert!(matches!(&assignment.expr.kind, ExprKind::Ident(i) if i.name == "defaultIndexExport"));
}

#[test]
fn test_default_non_entity_expression_becomes_any_const() {
    let (mut statements, _) = statements("export default 42;");
    name_anonymous_defaults("/src/index.d.ts", &mut statements);

    assert_eq!(statements.len(), 2);
    assert!(statements[0].has(ModifierFlags::DECLARE));
    assert_eq!(
        declared_names(&statements[0]).to_vec(),
        vec!["defaultIndexExport".to_string()]
    );
}
