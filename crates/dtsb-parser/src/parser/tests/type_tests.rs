//! Type-position parser tests.

use crate::ast::{ExprKind, MappedModifier, StmtKind, TypeKind, TypeNode, TypeOperator};
use crate::parser::ParserState;

/// Parse `type T = <text>;` and return the aliased type.
fn parse_alias(text: &str) -> TypeNode {
    let source = format!("type T = {text};");
    let mut parser = ParserState::new("types.d.ts".to_string(), source);
    let file = parser.parse_source_file();
    assert!(
        parser.get_diagnostics().is_empty(),
        "unexpected diagnostics for `{text}`: {:?}",
        parser.get_diagnostics()
    );
    match file.statements.into_iter().next().map(|s| s.kind) {
        Some(StmtKind::TypeAlias(alias)) => alias.ty,
        other => panic!("expected type alias, got {other:?}"),
    }
}

#[test]
fn test_conditional_with_infer_constraint() {
    let ty = parse_alias("T extends [infer H extends string, ...infer R] ? H : never");
    let TypeKind::Conditional { extends, .. } = &ty.kind else {
        panic!("expected conditional, got {:?}", ty.kind);
    };
    let TypeKind::Tuple(elements) = &extends.kind else {
        panic!("expected tuple");
    };
    assert!(matches!(&elements[0].ty.kind, TypeKind::Infer(p) if p.constraint.is_some()));
    assert!(elements[1].rest);
}

#[test]
fn test_infer_without_constraint_in_check_position() {
    let ty = parse_alias("T extends (...args: any[]) => infer R ? R : never");
    let TypeKind::Conditional { extends, true_ty, .. } = &ty.kind else {
        panic!("expected conditional, got {:?}", ty.kind);
    };
    let TypeKind::Function { sig, .. } = &extends.kind else {
        panic!("expected function type");
    };
    assert!(matches!(sig.ret.as_deref().map(|r| &r.kind), Some(TypeKind::Infer(_))));
    assert!(matches!(&true_ty.kind, TypeKind::Reference { name, .. } if name.first().name == "R"));
}

#[test]
fn test_mapped_type_modifiers() {
    let ty = parse_alias("{ -readonly [K in keyof T as `get${K & string}`]+?: T[K] }");
    let TypeKind::Mapped {
        readonly,
        optional,
        name_type,
        ty: value,
        ..
    } = &ty.kind
    else {
        panic!("expected mapped type, got {:?}", ty.kind);
    };
    assert_eq!(*readonly, Some(MappedModifier::Minus));
    assert_eq!(*optional, Some(MappedModifier::Plus));
    assert!(matches!(name_type.as_deref().map(|t| &t.kind), Some(TypeKind::TemplateLiteral { spans, .. }) if spans.len() == 1));
    assert!(matches!(value.as_deref().map(|t| &t.kind), Some(TypeKind::IndexedAccess(..))));
}

#[test]
fn test_import_and_query_types() {
    let ty = parse_alias("import(\"./dep\").Options<string> | typeof import(\"./x\") | typeof value.prop");
    let TypeKind::Union(types) = &ty.kind else {
        panic!("expected union");
    };
    assert!(matches!(&types[0].kind, TypeKind::Import { is_typeof: false, argument, qualifier: Some(q), type_args }
        if argument.value == "./dep" && q.first().name == "Options" && type_args.len() == 1));
    assert!(matches!(&types[1].kind, TypeKind::Import { is_typeof: true, qualifier: None, .. }));
    assert!(matches!(&types[2].kind, TypeKind::Query { name, .. } if name.parts.len() == 2));
}

#[test]
fn test_function_and_constructor_types() {
    let ty = parse_alias("abstract new <T>(x: T) => Base<T>");
    assert!(matches!(&ty.kind, TypeKind::Function { constructor: true, is_abstract: true, sig } if sig.type_params.len() == 1));

    let paren = parse_alias("(A | B)[]");
    assert!(matches!(&paren.kind, TypeKind::Array(inner) if matches!(inner.kind, TypeKind::Paren(_))));
}

#[test]
fn test_operators_literals_and_tuples() {
    let ty = parse_alias("readonly [first: string, second?: -1, ...rest: unique symbol[]]");
    let TypeKind::Operator(TypeOperator::Readonly, inner) = &ty.kind else {
        panic!("expected readonly operator, got {:?}", ty.kind);
    };
    let TypeKind::Tuple(elements) = &inner.kind else {
        panic!("expected tuple");
    };
    assert_eq!(elements.len(), 3);
    assert_eq!(elements[0].name.as_ref().map(|n| n.name.as_str()), Some("first"));
    assert!(elements[1].optional);
    assert!(matches!(elements[1].ty.kind, TypeKind::Literal(_)));
    assert!(elements[2].rest);
}

#[test]
fn test_negative_numeric_and_bigint_literals() {
    let ty = parse_alias("-1 | -2n");
    let TypeKind::Union(types) = &ty.kind else {
        panic!("expected union, got {:?}", ty.kind);
    };
    let operands: Vec<&ExprKind> = types
        .iter()
        .map(|ty| match &ty.kind {
            TypeKind::Literal(expr) => match &expr.kind {
                ExprKind::Unary("-", operand) => &operand.kind,
                other => panic!("expected negation, got {other:?}"),
            },
            other => panic!("expected literal, got {other:?}"),
        })
        .collect();
    assert!(matches!(operands[0], ExprKind::Num(n) if n == "1"));
    assert!(matches!(operands[1], ExprKind::BigInt(n) if n == "2n" || n == "2"));
}

#[test]
fn test_type_predicates() {
    let source = "declare function isString(x: unknown): x is string;\ndeclare function assert(v: unknown): asserts v;";
    let mut parser = ParserState::new("p.d.ts".to_string(), source.to_string());
    let file = parser.parse_source_file();
    assert!(parser.get_diagnostics().is_empty(), "{:?}", parser.get_diagnostics());
    for (stmt, asserts) in file.statements.iter().zip([false, true]) {
        let StmtKind::Function(function) = &stmt.kind else {
            panic!("expected function");
        };
        let ret = function.sig.ret.as_deref().map(|r| &r.kind);
        assert!(
            matches!(ret, Some(TypeKind::Predicate { asserts: a, .. }) if *a == asserts),
            "unexpected return type {ret:?}"
        );
    }
}

#[test]
fn test_missing_type_reports_ts1110() {
    let mut parser = ParserState::new("bad.d.ts".to_string(), "type T = ;".to_string());
    parser.parse_source_file();
    assert!(
        parser.get_diagnostics().iter().any(|d| d.code == 1110),
        "{:?}",
        parser.get_diagnostics()
    );
}
