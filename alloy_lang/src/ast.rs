//! The abstract syntax tree (C3 data model).
//!
//! Nodes live in flat arenas keyed by integer id rather than behind an
//! inheritance hierarchy or `Box`-linked tree: a signature's `extends`
//! pointer, a field's owning signature, and a command's target are all just
//! ids, which keeps the tree free of ownership cycles even though the
//! concepts it represents (signature hierarchies, mutually referencing
//! predicates) are not themselves a tree.

use crate::source::Span;

pub type ExprId = usize;
pub type SigId = usize;
pub type FieldId = usize;

/// A full parsed module: its own declarations plus the arenas every
/// expression/formula node in it was allocated into.
#[derive(Debug, Default)]
pub struct Module {
    pub name: Option<String>,
    pub opens: Vec<Open>,
    pub signatures: Vec<SigDecl>,
    pub facts: Vec<Fact>,
    pub preds: Vec<PredDecl>,
    pub funs: Vec<FunDecl>,
    pub asserts: Vec<AssertDecl>,
    pub enums: Vec<EnumDecl>,
    pub commands: Vec<Command>,
    pub exprs: Vec<ExprNode>,
}

impl Module {
    pub fn alloc(&mut self, node: ExprNode) -> ExprId {
        self.exprs.push(node);
        self.exprs.len() - 1
    }

    pub fn expr(&self, id: ExprId) -> &ExprNode {
        &self.exprs[id]
    }
}

#[derive(Clone, Debug)]
pub struct Open {
    pub path: String,
    pub alias: Option<String>,
    pub span: Span,
}

/// A multiplicity marker, used both for signature shape and decorated arrows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Multiplicity {
    Lone,
    One,
    Some,
    Set,
    Seq,
}

#[derive(Clone, Debug)]
pub struct SigDecl {
    pub names: Vec<String>,
    pub abstract_: bool,
    pub var: bool,
    pub multiplicity: Option<Multiplicity>,
    pub extends: Option<String>,
    pub subset_of: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub disjoint: bool,
    pub var: bool,
    pub type_expr: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Fact {
    pub name: Option<String>,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub type_expr: ExprId,
}

#[derive(Clone, Debug)]
pub struct PredDecl {
    pub receiver: Option<String>,
    pub name: String,
    pub params: Vec<Param>,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FunDecl {
    pub receiver: Option<String>,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: ExprId,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct AssertDecl {
    pub name: Option<String>,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<String>,
    pub span: Span,
}

/// A per-signature scope override: `exactly 2 Sig` or `Sig: 3`, or a `but`
/// delta applied on top of the command's default scope.
#[derive(Clone, Debug)]
pub struct SigScope {
    pub signature: String,
    pub bound: u32,
    pub exact: bool,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub default_scope: u32,
    pub per_sig: Vec<SigScope>,
    pub steps: Option<u32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandKind {
    Run,
    Check,
}

/// What a command is checking: a named predicate/assertion, or an inline
/// anonymous body.
#[derive(Clone, Debug)]
pub enum CommandTarget {
    Named(String),
    Body(ExprId),
}

#[derive(Clone, Debug)]
pub struct Command {
    pub kind: CommandKind,
    pub name: Option<String>,
    pub target: CommandTarget,
    pub scope: Scope,
    pub span: Span,
}

/// Declarations introduced by a quantifier, comprehension, or `let`:
/// `disj x, y: D`.
#[derive(Clone, Debug)]
pub struct Decl {
    pub names: Vec<String>,
    pub disjoint: bool,
    pub domain: ExprId,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quantifier {
    All,
    No,
    Some,
    One,
    Lone,
    Sum,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LessEq,
    GreaterEq,
    In,
    NotIn,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetOp {
    Union,
    Difference,
    Intersection,
    Override,
    DomRestrict,
    RanRestrict,
    Product,
    Join,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryRelOp {
    Transpose,
    Closure,
    ReflexiveClosure,
    Cardinality,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FutureOp {
    Always,
    Eventually,
    After,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PastOp {
    Historically,
    Once,
    Before,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FutureBinOp {
    Until,
    Releases,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PastBinOp {
    Since,
    Triggered,
}

/// Every expression and formula variant the grammar produces, closed over
/// one tagged enum per the project's convention of matching on a tag rather
/// than dispatching through a trait object.
#[derive(Clone, Debug)]
pub enum ExprNode {
    Ident(String),
    IntLit(i64),
    StrLit(String),
    Univ,
    Iden,
    None_,
    IntType,
    This,

    And(ExprId, ExprId),
    Or(ExprId, ExprId),
    Not(ExprId),
    Implies(ExprId, ExprId),
    Iff(ExprId, ExprId),

    Compare(CompareOp, ExprId, ExprId),
    SetBinary(SetOp, ExprId, ExprId),
    UnaryRel(UnaryRelOp, ExprId),
    Arrow {
        left: ExprId,
        left_mult: Option<Multiplicity>,
        right: ExprId,
        right_mult: Option<Multiplicity>,
    },
    Prime(ExprId),
    At(ExprId, ExprId),

    Quantified {
        quantifier: Quantifier,
        decls: Vec<Decl>,
        body: ExprId,
    },
    /// A multiplicity test applied directly to a set expression with no
    /// bound variable, e.g. `no A` or `some r.A` -- distinct from the bound
    /// form `no x: A | ...`.
    SetTest(Quantifier, ExprId),
    Comprehension {
        decls: Vec<Decl>,
        body: ExprId,
    },
    Let {
        name: String,
        bound: ExprId,
        body: ExprId,
    },
    IfElse {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },
    Block(Vec<ExprId>),
    Sequence(ExprId, ExprId),

    Future(FutureOp, ExprId),
    Past(PastOp, ExprId),
    FutureBin(FutureBinOp, ExprId, ExprId),
    PastBin(PastBinOp, ExprId, ExprId),

    Call {
        receiver: Option<ExprId>,
        name: String,
        args: Vec<ExprId>,
    },

    Error,
}
