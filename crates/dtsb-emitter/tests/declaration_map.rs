//! Source maps produced while printing declarations.

use dtsb_emitter::{PrintOptions, Printer};
use dtsb_parser::ast::Ident;
use dtsb_parser::visit::{VisitMut, walk_stmts};
use serde_json::Value;

fn map_json(raw: &str) -> Value {
    serde_json::from_str(raw).expect("source map is valid JSON")
}

struct Rename<'a> {
    from: &'a str,
    to: &'a str,
}

impl VisitMut for Rename<'_> {
    fn visit_ident(&mut self, ident: &mut Ident) {
        if ident.name == self.from {
            ident.name = self.to.to_string();
        }
    }
}

#[test]
fn unchanged_identifiers_map_per_character() {
    let text = "export declare function run(): void;\n";
    let file = dtsb_parser::parse("a.d.ts", text).source_file;

    let mut printer = Printer::new(PrintOptions::default());
    printer.enable_source_map("index.d.ts".to_string());
    printer.set_source("a.d.ts", &file.text);
    printer.print_statements(&file.statements);
    let output = printer.finish();

    assert_eq!(output.code, text);
    let map = map_json(&output.source_map.expect("source map requested"));
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "index.d.ts");
    assert_eq!(map["sources"], serde_json::json!(["a.d.ts"]));
    assert_eq!(map["sourcesContent"], serde_json::json!([text]));
    // Statement start, `run` at column 24 one character at a time, then `void`.
    assert_eq!(map["mappings"], "AAAA,wBAAwB,CAAC,CAAC,KAAK");
    assert_eq!(map["names"], serde_json::json!([]));
}

#[test]
fn renamed_identifiers_record_the_original_name() {
    let text = "export declare function run(): void;\n";
    let mut file = dtsb_parser::parse("b.d.ts", text).source_file;
    walk_stmts(
        &mut Rename {
            from: "run",
            to: "run_$0",
        },
        &mut file.statements,
    );

    let mut printer = Printer::new(PrintOptions::default());
    printer.enable_source_map("index.d.ts".to_string());
    printer.set_source("b.d.ts", &file.text);
    printer.print_statements(&file.statements);
    let output = printer.finish();

    assert_eq!(output.code, "export declare function run_$0(): void;\n");
    let map = map_json(&output.source_map.expect("source map requested"));
    assert_eq!(map["names"], serde_json::json!(["run"]));
    assert_eq!(map["mappings"], "AAAA,wBAAwBA,OAAO");
}

#[test]
fn statements_from_several_files_use_their_own_source() {
    let a = dtsb_parser::parse("a.d.ts", "type A = 1;\n").source_file;
    let b = dtsb_parser::parse("b.d.ts", "\ntype B = 2;\n").source_file;

    let mut printer = Printer::new(PrintOptions::default());
    printer.enable_source_map("index.d.ts".to_string());
    printer.set_source("a.d.ts", &a.text);
    printer.print_statements(&a.statements);
    printer.set_source("b.d.ts", &b.text);
    printer.print_statements(&b.statements);
    printer.clear_source();
    printer.print_comment_line("# sourceMappingURL=index.d.ts.map");
    let output = printer.finish();

    assert_eq!(
        output.code,
        "type A = 1;\ntype B = 2;\n//# sourceMappingURL=index.d.ts.map\n"
    );
    let map = map_json(&output.source_map.expect("source map requested"));
    assert_eq!(map["sources"], serde_json::json!(["a.d.ts", "b.d.ts"]));

    let mappings = map["mappings"].as_str().unwrap_or_default();
    let lines: Vec<&str> = mappings.split(';').collect();
    // Two mapped lines; the trailing comment line carries no segments.
    assert_eq!(lines.len(), 2, "{mappings}");
    // Line 2 switches to source 1 ("C") and original line 1 ("C").
    assert!(lines[1].starts_with("AACC"), "{mappings}");
}

#[test]
fn synthesized_nodes_are_not_mapped() {
    let text = "interface A {}\n";
    let file = dtsb_parser::parse("a.d.ts", text).source_file;
    let synthesized = dtsb_parser::parse("synthetic.d.ts", "export { A };\n").source_file;
    let mut export = synthesized.statements[0].clone();
    // Give the statement dummy spans, as the bundler does for generated code.
    export.span = dtsb_common::Span::DUMMY;
    if let dtsb_parser::ast::StmtKind::Export(decl) = &mut export.kind
        && let dtsb_parser::ast::ExportClause::Named(specifiers) = &mut decl.clause
    {
        for specifier in specifiers {
            specifier.name.span = dtsb_common::Span::DUMMY;
        }
    }

    let mut printer = Printer::new(PrintOptions::default());
    printer.enable_source_map("index.d.ts".to_string());
    printer.set_source("a.d.ts", &file.text);
    printer.print_statements(&file.statements);
    printer.print_statement(&export);
    let output = printer.finish();

    let map = map_json(&output.source_map.expect("source map requested"));
    let mappings = map["mappings"].as_str().unwrap_or_default();
    let lines: Vec<&str> = mappings.split(';').collect();
    // Only the first line of the interface carries segments.
    assert_eq!(lines.len(), 1, "generated export must not be mapped: {mappings}");
}
