//! Printing a parsed file and parsing the output again gives the same shape.

use dtsb_emitter::{PrintOptions, print_source_file};
use dtsb_parser::ast::{SourceFile, StmtKind};

const TYPICAL_DECLARATIONS: &str = r#"/// <reference types="node" />
import { EventEmitter } from "events";
import type * as fs from 'fs';
/**
 * Options accepted by {@link createServer}.
 */
export interface ServerOptions<TContext = unknown> {
    port?: number
    host: string,
    onRequest(ctx: TContext, next: () => Promise<void>): void
    readonly [extra: string]: unknown
}
export declare class Server<T extends object = {}> extends EventEmitter implements Disposable {
    constructor(options: ServerOptions<T>, private readonly log?: (msg: string) => void);
    listen(port?: number): Promise<this>;
    static readonly default: Server<any>;
    get address(): string | undefined;
    dispose(): void;
}
export type Handler<T> = T extends (...args: infer A) => infer R ? (...args: A) => Promise<R> : never;
export type Readonlyish<T> = { readonly [K in keyof T]: T[K] extends Function ? T[K] : Readonlyish<T[K]> };
export declare function createServer<T extends object>(options: ServerOptions<T>): Server<T>;
export declare const enum Status { Idle, Running = 2, Stopped = Running << 1 }
declare namespace Internal.Detail { const flag: boolean; }
declare const [first, , third]: string[];
export { Server as default };
export * from "./extra";
"#;

fn parse_clean(name: &str, text: &str) -> SourceFile {
    let result = dtsb_parser::parse(name, text);
    assert!(
        result.diagnostics.is_empty(),
        "diagnostics for {name}: {:?}",
        result.diagnostics
    );
    result.source_file
}

fn kinds(file: &SourceFile) -> Vec<&'static str> {
    file.statements.iter().map(|s| s.kind_name()).collect()
}

#[test]
fn printed_output_reparses_to_the_same_statements() {
    let original = parse_clean("typical.d.ts", TYPICAL_DECLARATIONS);
    let printed = print_source_file(&original, PrintOptions::default());
    let reparsed = parse_clean("printed.d.ts", &printed);

    assert_eq!(kinds(&original), kinds(&reparsed), "printed:\n{printed}");
    assert_eq!(original.references, reparsed.references);
    assert_eq!(original.is_module, reparsed.is_module);

    for (before, after) in original.statements.iter().zip(&reparsed.statements) {
        assert_eq!(before.modifiers, after.modifiers, "printed:\n{printed}");
        assert_eq!(before.doc.is_some(), after.doc.is_some());
    }
}

#[test]
fn printing_is_idempotent() {
    let original = parse_clean("typical.d.ts", TYPICAL_DECLARATIONS);
    let once = print_source_file(&original, PrintOptions::default());
    let twice = print_source_file(&parse_clean("once.d.ts", &once), PrintOptions::default());
    assert_eq!(once, twice);
}

#[test]
fn members_survive_the_round_trip() {
    let original = parse_clean("typical.d.ts", TYPICAL_DECLARATIONS);
    let printed = print_source_file(&original, PrintOptions::default());
    let reparsed = parse_clean("printed.d.ts", &printed);

    let member_counts = |file: &SourceFile| -> Vec<usize> {
        file.statements
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::Class(class) => Some(class.members.len()),
                StmtKind::Interface(interface) => Some(interface.members.len()),
                StmtKind::Enum(decl) => Some(decl.members.len()),
                _ => None,
            })
            .collect()
    };
    assert_eq!(member_counts(&original), vec![4, 5, 3]);
    assert_eq!(member_counts(&original), member_counts(&reparsed));
}

#[test]
fn script_files_stay_scripts() {
    let original = parse_clean(
        "globals.d.ts",
        "declare var __DEV__: boolean;\ninterface Window { app: string }\n",
    );
    assert!(!original.is_module);
    let printed = print_source_file(&original, PrintOptions::default());
    assert_eq!(
        printed,
        "declare var __DEV__: boolean;\ninterface Window {\n    app: string;\n}\n"
    );
    assert!(!parse_clean("printed.d.ts", &printed).is_module);
}
