//! Parses representative declaration files through the public API.

use dtsb_parser::ast::{ModifierFlags, StmtKind};
use dtsb_parser::parse;

const EMITTED_DECLARATION: &str = r#"/// <reference types="node" />
/// <reference path="./globals.d.ts" />
import { EventEmitter } from "events";
import type { Options } from "./options";
/**
 * A small server.
 */
export declare class Server<T extends object = {}> extends EventEmitter {
    readonly options: Options;
    constructor(options?: Partial<Options>);
    listen(port: number, callback?: (err?: Error) => void): this;
    on(event: "close", listener: () => void): this;
    static readonly [Symbol.species]: typeof Server;
}
export interface Handler<in out T> {
    (req: T): Promise<void> | void;
    new (): Handler<T>;
    readonly name?: string;
}
export type Middleware<T = unknown> = (ctx: T, next: () => Promise<void>) => Promise<void>;
export type Keys<T> = { [K in keyof T]-?: T[K] extends Function ? K : never }[keyof T];
declare const _default: {
    create: typeof Server;
};
export default _default;
"#;

#[test]
fn parses_a_typical_emitted_declaration_file() {
    let result = parse("/src/server.d.ts", EMITTED_DECLARATION);
    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics: {:#?}",
        result.diagnostics
    );
    let file = result.source_file;
    assert!(file.is_module);
    assert_eq!(file.references.len(), 2);
    assert_eq!(file.statements.len(), 8);

    let server = &file.statements[2];
    assert!(server.doc.as_deref().is_some_and(|d| d.contains("A small server.")));
    assert!(server.has(ModifierFlags::EXPORT | ModifierFlags::DECLARE));
    let StmtKind::Class(class) = &server.kind else {
        panic!("expected class, got {}", server.kind_name());
    };
    assert_eq!(class.members.len(), 5);

    assert!(matches!(file.statements[7].kind, StmtKind::ExportAssignment(_)));
}

#[test]
fn script_files_are_not_modules() {
    let result = parse(
        "/src/globals.d.ts",
        "declare var VERSION: string;\ninterface Window { app: unknown }\n",
    );
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert!(!result.source_file.is_module);
}

#[test]
fn syntax_errors_do_not_abort_parsing() {
    let result = parse("/src/broken.d.ts", "export declare const a: ;\nexport declare const b: string;\n");
    assert!(!result.diagnostics.is_empty());
    assert_eq!(result.source_file.statements.len(), 2);
    assert!(result.diagnostics.iter().all(|d| d.file == "/src/broken.d.ts"));
}
