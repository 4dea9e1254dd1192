//! The symbol table (C4 data model): name resolution targets built from a
//! parsed module, before any type inference or encoding happens.

use std::collections::HashMap;

use crate::ast::{ExprId, Multiplicity};
use crate::source::Span;

pub type SigId = usize;

/// A resolved signature: its declared shape plus links into the
/// extends/subset forest. `parent` is the owning `extends` target (a
/// signature forms a tree via these pointers); `subset_of` additionally
/// lists `in` targets, which don't participate in the ownership tree.
#[derive(Clone, Debug)]
pub struct SigSymbol {
    pub name: String,
    pub abstract_: bool,
    pub var: bool,
    pub multiplicity: Option<Multiplicity>,
    pub parent: Option<SigId>,
    pub subset_of: Vec<SigId>,
    pub fields: Vec<FieldSymbol>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FieldSymbol {
    pub name: String,
    pub owner: SigId,
    pub disjoint: bool,
    pub var: bool,
    pub type_expr: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct PredSymbol {
    pub name: String,
    pub receiver: Option<SigId>,
    pub params: Vec<(String, ExprId)>,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FunSymbol {
    pub name: String,
    pub receiver: Option<SigId>,
    pub params: Vec<(String, ExprId)>,
    pub return_type: ExprId,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct AssertSymbol {
    pub name: String,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumSymbol {
    pub name: String,
    pub values: Vec<String>,
    pub span: Span,
}

/// Every resolvable name in a module, keyed by its unqualified spelling.
/// Signatures get their own arena (`sigs`) so other symbols can hold a
/// stable [`SigId`] rather than a name that might be renamed or shadowed.
#[derive(Default, Debug)]
pub struct SymbolTable {
    pub sigs: Vec<SigSymbol>,
    pub sig_by_name: HashMap<String, SigId>,
    pub preds: HashMap<String, PredSymbol>,
    pub funs: HashMap<String, FunSymbol>,
    pub asserts: HashMap<String, AssertSymbol>,
    pub enums: HashMap<String, EnumSymbol>,
    pub enum_values: HashMap<String, (String, usize)>,
}

impl SymbolTable {
    pub fn sig(&self, id: SigId) -> &SigSymbol {
        &self.sigs[id]
    }

    pub fn sig_named(&self, name: &str) -> Option<SigId> {
        self.sig_by_name.get(name).copied()
    }

    /// Every signature id from which `id` descends via `extends`, including
    /// itself -- the order a quantifier over a supertype should also range
    /// over, outermost (most general) last.
    pub fn ancestors(&self, id: SigId) -> Vec<SigId> {
        let mut chain = vec![id];
        let mut current = self.sigs[id].parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.sigs[p].parent;
        }
        chain
    }

    /// True if `descendant` extends `ancestor`, directly or transitively
    /// (reflexive: every signature is its own ancestor for this purpose).
    pub fn extends(&self, descendant: SigId, ancestor: SigId) -> bool {
        self.ancestors(descendant).contains(&ancestor)
    }
}
