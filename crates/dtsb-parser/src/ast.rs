//! Declaration-file syntax tree.
//!
//! The tree is owned and tagged: every declaration form is one variant of a
//! `*Kind` enum, so passes dispatch with a single `match` per node and fall back
//! to recursing into children for the forms they do not care about.

use bitflags::bitflags;
use dtsb_common::Span;
use std::sync::Arc;

bitflags! {
    /// Modifiers that can precede a statement, a member, or a parameter.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u32 {
        const EXPORT = 1 << 0;
        const DEFAULT = 1 << 1;
        const DECLARE = 1 << 2;
        const ABSTRACT = 1 << 3;
        const CONST = 1 << 4;
        const PUBLIC = 1 << 5;
        const PRIVATE = 1 << 6;
        const PROTECTED = 1 << 7;
        const STATIC = 1 << 8;
        const READONLY = 1 << 9;
        const OVERRIDE = 1 << 10;
        const ACCESSOR = 1 << 11;
        const ASYNC = 1 << 12;
        const IN = 1 << 13;
        const OUT = 1 << 14;
    }
}

impl ModifierFlags {
    /// Modifiers in the order the printer emits them.
    pub const PRINT_ORDER: [(ModifierFlags, &'static str); 15] = [
        (ModifierFlags::EXPORT, "export"),
        (ModifierFlags::DEFAULT, "default"),
        (ModifierFlags::DECLARE, "declare"),
        (ModifierFlags::PUBLIC, "public"),
        (ModifierFlags::PRIVATE, "private"),
        (ModifierFlags::PROTECTED, "protected"),
        (ModifierFlags::STATIC, "static"),
        (ModifierFlags::OVERRIDE, "override"),
        (ModifierFlags::ABSTRACT, "abstract"),
        (ModifierFlags::READONLY, "readonly"),
        (ModifierFlags::ACCESSOR, "accessor"),
        (ModifierFlags::ASYNC, "async"),
        (ModifierFlags::CONST, "const"),
        (ModifierFlags::IN, "in"),
        (ModifierFlags::OUT, "out"),
    ];

    /// Map a modifier keyword to its flag.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<ModifierFlags> {
        Self::PRINT_ORDER
            .iter()
            .find(|(_, text)| *text == word)
            .map(|(flag, _)| *flag)
    }
}

/// A parsed declaration file.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub file_name: String,
    pub text: Arc<str>,
    pub statements: Vec<Stmt>,
    /// Leading `/// <reference .. />` (and other triple-slash) directives, verbatim.
    pub references: Vec<String>,
    /// True when the file has a top-level import or export and is therefore a module.
    pub is_module: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// An identifier that does not originate from parsed text.
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(name, Span::DUMMY)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Str {
    pub value: String,
    pub span: Span,
}

impl Str {
    pub fn synthetic(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            span: Span::DUMMY,
        }
    }
}

/// `A.B.C` in type and heritage positions. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityName {
    pub parts: Vec<Ident>,
}

impl EntityName {
    pub fn first(&self) -> &Ident {
        &self.parts[0]
    }

    pub fn from_ident(ident: Ident) -> Self {
        Self { parts: vec![ident] }
    }
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub span: Span,
    pub doc: Option<String>,
    pub modifiers: ModifierFlags,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            span: Span::DUMMY,
            doc: None,
            modifiers: ModifierFlags::empty(),
            kind,
        }
    }

    pub fn with_modifiers(mut self, modifiers: ModifierFlags) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[inline]
    pub fn has(&self, flag: ModifierFlags) -> bool {
        self.modifiers.contains(flag)
    }

    /// Kind name used in logs and errors.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Import(ImportDecl),
    ImportEquals(ImportEqualsDecl),
    Export(ExportDecl),
    /// `export default <expr>` or `export = <expr>`.
    ExportAssignment(ExportAssignment),
    /// `export as namespace X`.
    NamespaceExport(Ident),
    Class(ClassDecl),
    Function(FunctionDecl),
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Enum(EnumDecl),
    Module(ModuleDecl),
    Variable(VariableDecl),
    /// A statement the parser could not make sense of; printed from its source text.
    Unknown(String),
}

impl StmtKind {
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Import(_) => "ImportDeclaration",
            StmtKind::ImportEquals(_) => "ImportEqualsDeclaration",
            StmtKind::Export(_) => "ExportDeclaration",
            StmtKind::ExportAssignment(_) => "ExportAssignment",
            StmtKind::NamespaceExport(_) => "NamespaceExportDeclaration",
            StmtKind::Class(_) => "ClassDeclaration",
            StmtKind::Function(_) => "FunctionDeclaration",
            StmtKind::Interface(_) => "InterfaceDeclaration",
            StmtKind::TypeAlias(_) => "TypeAliasDeclaration",
            StmtKind::Enum(_) => "EnumDeclaration",
            StmtKind::Module(_) => "ModuleDeclaration",
            StmtKind::Variable(_) => "VariableStatement",
            StmtKind::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImportDecl {
    pub type_only: bool,
    pub default: Option<Ident>,
    pub bindings: Option<ImportBindings>,
    pub specifier: Str,
}

#[derive(Clone, Debug)]
pub enum ImportBindings {
    Namespace(Ident),
    Named(Vec<ImportSpecifier>),
}

#[derive(Clone, Debug)]
pub struct ImportSpecifier {
    pub type_only: bool,
    /// The exported name when it differs from the local one (`a as b`).
    pub property_name: Option<Ident>,
    pub name: Ident,
}

impl ImportSpecifier {
    pub fn imported_name(&self) -> &str {
        self.property_name.as_ref().unwrap_or(&self.name).name.as_str()
    }
}

#[derive(Clone, Debug)]
pub struct ImportEqualsDecl {
    pub type_only: bool,
    pub name: Ident,
    pub target: ModuleReference,
}

#[derive(Clone, Debug)]
pub enum ModuleReference {
    Require(Str),
    Entity(EntityName),
}

#[derive(Clone, Debug)]
pub struct ExportDecl {
    pub type_only: bool,
    pub clause: ExportClause,
    pub specifier: Option<Str>,
}

#[derive(Clone, Debug)]
pub enum ExportClause {
    Named(Vec<ExportSpecifier>),
    Star,
    StarAs(Ident),
}

#[derive(Clone, Debug)]
pub struct ExportSpecifier {
    pub type_only: bool,
    /// The local (or re-exported) name when it differs from the exported one.
    pub property_name: Option<Ident>,
    pub name: Ident,
}

impl ExportSpecifier {
    pub fn local_name(&self) -> &str {
        self.property_name.as_ref().unwrap_or(&self.name).name.as_str()
    }
}

#[derive(Clone, Debug)]
pub struct ExportAssignment {
    pub is_export_equals: bool,
    pub expr: Expr,
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: Option<Ident>,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<ExprWithTypeArgs>,
    pub implements: Vec<ExprWithTypeArgs>,
    pub members: Vec<Member>,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: Option<Ident>,
    pub generator: bool,
    pub sig: Signature,
}

#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<ExprWithTypeArgs>,
    pub members: Vec<Member>,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeNode,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub name: Ident,
    pub members: Vec<EnumMember>,
}

#[derive(Clone, Debug)]
pub struct EnumMember {
    pub span: Span,
    pub doc: Option<String>,
    pub name: PropName,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct ModuleDecl {
    pub name: ModuleName,
    /// `namespace` rather than `module`.
    pub namespace_keyword: bool,
    pub body: Option<ModuleBody>,
}

#[derive(Clone, Debug)]
pub enum ModuleName {
    Ident(Ident),
    Str(Str),
    Global(Span),
}

#[derive(Clone, Debug)]
pub enum ModuleBody {
    Block(Vec<Stmt>),
    /// The tail of a dotted name: `namespace A.B { }` is `A` with nested body `B`.
    Nested(Box<ModuleDecl>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

#[derive(Clone, Debug)]
pub struct VariableDecl {
    pub kind: VarKind,
    pub declarations: Vec<VarDeclarator>,
}

#[derive(Clone, Debug)]
pub struct VarDeclarator {
    pub span: Span,
    pub name: BindingName,
    pub ty: Option<TypeNode>,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug)]
pub enum BindingName {
    Ident(Ident),
    Object(Vec<BindingElement>),
    /// `None` entries are omitted elements (`[a, , b]`).
    Array(Vec<Option<BindingElement>>),
}

impl BindingName {
    /// Every identifier bound by this name, in source order.
    pub fn bound_idents(&self) -> Vec<&Ident> {
        let mut out = Vec::new();
        self.collect_idents(&mut out);
        out
    }

    fn collect_idents<'a>(&'a self, out: &mut Vec<&'a Ident>) {
        match self {
            BindingName::Ident(ident) => out.push(ident),
            BindingName::Object(elements) => {
                for element in elements {
                    element.name.collect_idents(out);
                }
            }
            BindingName::Array(elements) => {
                for element in elements.iter().flatten() {
                    element.name.collect_idents(out);
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct BindingElement {
    pub span: Span,
    pub rest: bool,
    pub property_name: Option<PropName>,
    pub name: BindingName,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct Member {
    pub span: Span,
    pub doc: Option<String>,
    pub modifiers: ModifierFlags,
    pub kind: MemberKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessorKind {
    Get,
    Set,
}

#[derive(Clone, Debug)]
pub enum MemberKind {
    Property {
        name: PropName,
        optional: bool,
        ty: Option<TypeNode>,
        init: Option<Expr>,
    },
    Method {
        name: PropName,
        optional: bool,
        sig: Signature,
    },
    Constructor(Signature),
    Accessor {
        kind: AccessorKind,
        name: PropName,
        sig: Signature,
    },
    CallSignature(Signature),
    ConstructSignature(Signature),
    Index {
        params: Vec<Param>,
        ty: TypeNode,
    },
}

#[derive(Clone, Debug)]
pub enum PropName {
    Ident(Ident),
    Str(Str),
    Num(String, Span),
    Computed(Box<Expr>),
    Private(Ident),
}

#[derive(Clone, Debug, Default)]
pub struct Signature {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub ret: Option<Box<TypeNode>>,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub span: Span,
    pub modifiers: ModifierFlags,
    pub rest: bool,
    pub name: BindingName,
    pub optional: bool,
    pub ty: Option<TypeNode>,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct TypeParam {
    pub span: Span,
    pub modifiers: ModifierFlags,
    pub name: Ident,
    pub constraint: Option<Box<TypeNode>>,
    pub default: Option<Box<TypeNode>>,
}

#[derive(Clone, Debug)]
pub struct ExprWithTypeArgs {
    pub span: Span,
    pub expr: Expr,
    pub type_args: Vec<TypeNode>,
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    pub fn ident(ident: Ident) -> Self {
        Self {
            span: ident.span,
            kind: ExprKind::Ident(ident),
        }
    }

    /// The leftmost identifier of an `a.b.c` chain, if the expression is one.
    pub fn root_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            ExprKind::Member(object, _) => object.root_ident(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Ident(Ident),
    Member(Box<Expr>, Ident),
    Element(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Str(Str),
    Num(String),
    BigInt(String),
    Bool(bool),
    Null,
    This,
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
    /// Source text kept verbatim (object or array literals and other rare initializers).
    Raw(String),
}

#[derive(Clone, Debug)]
pub struct TypeNode {
    pub span: Span,
    pub kind: TypeKind,
}

impl TypeNode {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            span: Span::DUMMY,
            kind,
        }
    }

    pub fn reference(name: EntityName) -> Self {
        Self::new(TypeKind::Reference {
            name,
            type_args: Vec::new(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeOperator {
    KeyOf,
    Unique,
    Readonly,
}

impl TypeOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeOperator::KeyOf => "keyof",
            TypeOperator::Unique => "unique",
            TypeOperator::Readonly => "readonly",
        }
    }
}

/// `+`, `-` or bare modifier on a mapped type's `readonly` / `?`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappedModifier {
    Present,
    Plus,
    Minus,
}

#[derive(Clone, Debug)]
pub struct TupleElement {
    pub span: Span,
    pub name: Option<Ident>,
    pub optional: bool,
    pub rest: bool,
    pub ty: TypeNode,
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    /// `any`, `string`, `void`, ... stored as written.
    Keyword(String),
    This,
    Reference {
        name: EntityName,
        type_args: Vec<TypeNode>,
    },
    Literal(Expr),
    TemplateLiteral {
        head: String,
        spans: Vec<(TypeNode, String)>,
    },
    Array(Box<TypeNode>),
    Tuple(Vec<TupleElement>),
    Union(Vec<TypeNode>),
    Intersection(Vec<TypeNode>),
    Function {
        constructor: bool,
        is_abstract: bool,
        sig: Signature,
    },
    TypeLiteral(Vec<Member>),
    Paren(Box<TypeNode>),
    Query {
        name: EntityName,
        type_args: Vec<TypeNode>,
    },
    Operator(TypeOperator, Box<TypeNode>),
    IndexedAccess(Box<TypeNode>, Box<TypeNode>),
    Conditional {
        check: Box<TypeNode>,
        extends: Box<TypeNode>,
        true_ty: Box<TypeNode>,
        false_ty: Box<TypeNode>,
    },
    Infer(Box<TypeParam>),
    Mapped {
        readonly: Option<MappedModifier>,
        type_param: Box<TypeParam>,
        name_type: Option<Box<TypeNode>>,
        optional: Option<MappedModifier>,
        ty: Option<Box<TypeNode>>,
    },
    Import {
        is_typeof: bool,
        argument: Str,
        qualifier: Option<EntityName>,
        type_args: Vec<TypeNode>,
    },
    Predicate {
        asserts: bool,
        param: Ident,
        ty: Option<Box<TypeNode>>,
    },
}
