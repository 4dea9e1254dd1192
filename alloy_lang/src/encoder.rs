//! The relational encoder (C9): walks the AST and emits assertions into the
//! CNF builder. Shared by both the plain-model pipeline and the trace/LTL
//! encoder (`trace.rs`), parameterized over a state index so temporal
//! operators and ordinary ones go through the same lowering.

use std::collections::HashMap;

use alloy_sat::structures::literal::Literal;

use crate::ast::{
    CompareOp, Decl, ExprId, ExprNode, FutureBinOp, FutureOp, Module, PastBinOp, PastOp, Quantifier, SetOp,
    UnaryRelOp,
};
use crate::error::EncodingError;
use crate::formula::{BoolTerm, CnfBuilder};
use crate::matrix::BoolMatrix;
use crate::symbols::SymbolTable;
use crate::tuples::{Tuple, TupleSet};
use crate::universe::Universe;

/// Every signature and field's boolean matrix, indexed by qualified name
/// (`"Sig"`, `"Sig.field"`) and by trace state. Non-`var` relations carry
/// exactly one matrix, shared across every state index; `var` relations
/// carry one per state.
#[derive(Clone, Debug, Default)]
pub struct RelationalEnvironment {
    relations: HashMap<String, Vec<BoolMatrix>>,
}

impl RelationalEnvironment {
    pub fn new() -> Self {
        RelationalEnvironment::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, states: Vec<BoolMatrix>) {
        self.relations.insert(name.into(), states);
    }

    pub fn get(&self, name: &str, state: usize) -> Option<&BoolMatrix> {
        self.relations.get(name).map(|states| {
            let index = state.min(states.len() - 1);
            &states[index]
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }
}

/// A fixed-width two's-complement bit-blasted integer, least-significant
/// bit first.
#[derive(Clone, Debug)]
pub struct IntTerm {
    bits: Vec<BoolTerm>,
}

impl IntTerm {
    pub fn from_const(width: u32, value: i64) -> Self {
        let bits = (0..width).map(|i| BoolTerm::Const((value >> i) & 1 == 1)).collect();
        IntTerm { bits }
    }

    pub fn from_bit(width: u32, bit: BoolTerm) -> Self {
        let mut bits = vec![BoolTerm::bottom(); width as usize];
        if !bits.is_empty() {
            bits[0] = bit;
        }
        IntTerm { bits }
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    fn sign_bit(&self) -> BoolTerm {
        self.bits.last().cloned().unwrap_or_else(BoolTerm::bottom)
    }

    fn xor(a: BoolTerm, b: BoolTerm) -> BoolTerm {
        BoolTerm::disj([
            BoolTerm::conj([a.clone(), BoolTerm::not(b.clone())]),
            BoolTerm::conj([BoolTerm::not(a), b]),
        ])
    }

    /// Truncating ripple-carry addition, built structurally out of
    /// [`BoolTerm`] combinators rather than fresh SAT variables -- the
    /// fixed small widths this language uses keep the resulting formulas
    /// manageable.
    pub fn add(&self, other: &IntTerm) -> IntTerm {
        let width = self.width().max(other.width());
        let mut bits = Vec::with_capacity(width);
        let mut carry = BoolTerm::bottom();
        for i in 0..width {
            let a = self.bits.get(i).cloned().unwrap_or_else(|| self.sign_bit());
            let b = other.bits.get(i).cloned().unwrap_or_else(|| other.sign_bit());
            let sum = Self::xor(Self::xor(a.clone(), b.clone()), carry.clone());
            let next_carry = BoolTerm::disj([
                BoolTerm::conj([a.clone(), b.clone()]),
                BoolTerm::conj([carry.clone(), BoolTerm::disj([a, b])]),
            ]);
            bits.push(sum);
            carry = next_carry;
        }
        IntTerm { bits }
    }

    pub fn negate(&self) -> IntTerm {
        let flipped: Vec<BoolTerm> = self.bits.iter().cloned().map(BoolTerm::not).collect();
        IntTerm { bits: flipped }.add(&IntTerm::from_const(self.width() as u32, 1))
    }

    pub fn eq(&self, other: &IntTerm) -> BoolTerm {
        let width = self.width().max(other.width());
        let terms: Vec<BoolTerm> = (0..width)
            .map(|i| {
                let a = self.bits.get(i).cloned().unwrap_or_else(|| self.sign_bit());
                let b = other.bits.get(i).cloned().unwrap_or_else(|| other.sign_bit());
                BoolTerm::not(Self::xor(a, b))
            })
            .collect();
        BoolTerm::conj(terms)
    }

    /// Signed less-than: flipping each operand's sign bit turns two's
    /// complement ordering into plain unsigned ordering, compared
    /// most-significant-bit first.
    pub fn lt(&self, other: &IntTerm) -> BoolTerm {
        let width = self.width().max(other.width());
        let flip = |term: &IntTerm| -> Vec<BoolTerm> {
            let mut bits: Vec<BoolTerm> = (0..width)
                .map(|i| term.bits.get(i).cloned().unwrap_or_else(|| term.sign_bit()))
                .collect();
            if let Some(last) = bits.last_mut() {
                *last = BoolTerm::not(last.clone());
            }
            bits
        };
        let a = flip(self);
        let b = flip(other);
        Self::unsigned_lt_msb_first(&a.into_iter().rev().collect::<Vec<_>>(), &b.into_iter().rev().collect::<Vec<_>>())
    }

    fn unsigned_lt_msb_first(a: &[BoolTerm], b: &[BoolTerm]) -> BoolTerm {
        if a.is_empty() {
            return BoolTerm::bottom();
        }
        let (a0, arest) = (&a[0], &a[1..]);
        let (b0, brest) = (&b[0], &b[1..]);
        let here = BoolTerm::conj([BoolTerm::not(a0.clone()), b0.clone()]);
        let tie = BoolTerm::not(Self::xor(a0.clone(), b0.clone()));
        BoolTerm::disj([here, BoolTerm::conj([tie, Self::unsigned_lt_msb_first(arest, brest)])])
    }

    pub fn le(&self, other: &IntTerm) -> BoolTerm {
        BoolTerm::disj([self.lt(other), self.eq(other)])
    }

    pub fn gt(&self, other: &IntTerm) -> BoolTerm {
        other.lt(self)
    }

    pub fn ge(&self, other: &IntTerm) -> BoolTerm {
        other.le(self)
    }
}

/// A let/quantifier-bound name resolves to one of these.
#[derive(Clone, Debug)]
pub enum Value {
    Set(BoolMatrix),
    Formula(BoolTerm),
    Int(IntTerm),
}

type Scope = HashMap<String, Value>;

pub struct Encoder<'a> {
    module: &'a Module,
    symbols: &'a SymbolTable,
    env: RelationalEnvironment,
    universe: Universe,
    builder: &'a mut CnfBuilder,
    bit_width: u32,
    states: usize,
    loop_lits: Option<Vec<Literal>>,
}

impl<'a> Encoder<'a> {
    pub fn new(
        module: &'a Module,
        symbols: &'a SymbolTable,
        env: RelationalEnvironment,
        universe: Universe,
        builder: &'a mut CnfBuilder,
        bit_width: u32,
    ) -> Self {
        Encoder {
            module,
            symbols,
            env,
            universe,
            builder,
            bit_width,
            states: 1,
            loop_lits: None,
        }
    }

    /// Switches this encoder into trace mode: `states` state indices,
    /// `loop_lits[k]` true exactly when state `L-1`'s successor is state
    /// `k`.
    pub fn with_trace(mut self, states: usize, loop_lits: Vec<Literal>) -> Self {
        self.states = states;
        self.loop_lits = Some(loop_lits);
        self
    }

    pub fn states(&self) -> usize {
        self.states
    }

    pub fn assert_fact(&mut self, body: ExprId) -> Result<(), EncodingError> {
        let term = self.lower_formula(body, 0, &Scope::new())?;
        self.builder.assert_formula(&term).map_err(EncodingError::from)
    }

    pub fn lower_formula(&mut self, id: ExprId, state: usize, scope: &Scope) -> Result<BoolTerm, EncodingError> {
        match self.lower_expr(id, state, scope)? {
            Value::Formula(f) => Ok(f),
            Value::Set(m) => Ok(self.nonempty(&m)),
            Value::Int(_) => Err(EncodingError::UndefinedName {
                name: "<integer used as a formula>".to_string(),
            }),
        }
    }

    fn lower_set(&mut self, id: ExprId, state: usize, scope: &Scope) -> Result<BoolMatrix, EncodingError> {
        match self.lower_expr(id, state, scope)? {
            Value::Set(m) => Ok(m),
            _ => Err(EncodingError::UndefinedName {
                name: "<non-relational expression used as a set>".to_string(),
            }),
        }
    }

    fn lower_int(&mut self, id: ExprId, state: usize, scope: &Scope) -> Result<IntTerm, EncodingError> {
        match self.lower_expr(id, state, scope)? {
            Value::Int(i) => Ok(i),
            Value::Set(m) => Ok(self.cardinality(&m)),
            Value::Formula(_) => Err(EncodingError::UndefinedName {
                name: "<formula used as an integer>".to_string(),
            }),
        }
    }

    fn nonempty(&self, matrix: &BoolMatrix) -> BoolTerm {
        BoolTerm::disj(matrix.tuples().map(|(_, t)| t.clone()))
    }

    fn cardinality(&mut self, matrix: &BoolMatrix) -> IntTerm {
        let mut total = IntTerm::from_const(self.bit_width, 0);
        for (_, term) in matrix.tuples() {
            total = total.add(&IntTerm::from_bit(self.bit_width, term.clone()));
        }
        total
    }

    fn singleton(&self, tuple: Tuple) -> BoolMatrix {
        let arity = tuple.len();
        BoolMatrix::constant(&TupleSet::from_iter(arity, std::iter::once(tuple)), self.universe.len())
    }

    fn lower_expr(&mut self, id: ExprId, state: usize, scope: &Scope) -> Result<Value, EncodingError> {
        let node = self.module.expr(id).clone();
        match node {
            ExprNode::Ident(name) => self.resolve_ident(&name, state, scope),
            ExprNode::IntLit(value) => Ok(Value::Int(IntTerm::from_const(self.bit_width, value))),
            ExprNode::StrLit(_) => Ok(Value::Set(BoolMatrix::empty(1, self.universe.len()))),
            ExprNode::Univ => Ok(Value::Set(BoolMatrix::constant(&self.universe.all_tuples(1), self.universe.len()))),
            ExprNode::Iden => Ok(Value::Set(BoolMatrix::constant(&self.universe.identity(), self.universe.len()))),
            ExprNode::None_ => Ok(Value::Set(BoolMatrix::empty(1, self.universe.len()))),
            ExprNode::IntType => Ok(Value::Set(BoolMatrix::empty(1, self.universe.len()))),
            ExprNode::This => match scope.get("this") {
                Some(value) => Ok(value.clone()),
                None => Err(EncodingError::UndefinedName { name: "this".to_string() }),
            },
            ExprNode::Error => Ok(Value::Formula(BoolTerm::bottom())),

            ExprNode::And(a, b) => {
                let a = self.lower_formula(a, state, scope)?;
                let b = self.lower_formula(b, state, scope)?;
                Ok(Value::Formula(BoolTerm::conj([a, b])))
            }
            ExprNode::Or(a, b) => {
                let a = self.lower_formula(a, state, scope)?;
                let b = self.lower_formula(b, state, scope)?;
                Ok(Value::Formula(BoolTerm::disj([a, b])))
            }
            ExprNode::Not(a) => Ok(Value::Formula(BoolTerm::not(self.lower_formula(a, state, scope)?))),
            ExprNode::Implies(a, b) => {
                let a = self.lower_formula(a, state, scope)?;
                let b = self.lower_formula(b, state, scope)?;
                Ok(Value::Formula(a.implies(b)))
            }
            ExprNode::Iff(a, b) => {
                let a = self.lower_formula(a, state, scope)?;
                let b = self.lower_formula(b, state, scope)?;
                Ok(Value::Formula(a.iff(b)))
            }

            ExprNode::Compare(op, a, b) => self.lower_compare(op, a, b, state, scope),
            ExprNode::SetBinary(op, a, b) => self.lower_set_binary(op, a, b, state, scope),
            ExprNode::UnaryRel(op, a) => self.lower_unary_rel(op, a, state, scope),

            ExprNode::Arrow { left, right, .. } => {
                let l = self.lower_set(left, state, scope)?;
                let r = self.lower_set(right, state, scope)?;
                Ok(Value::Set(l.product(&r)))
            }

            ExprNode::Prime(a) => {
                let value = self.lower_expr(a, self.advance(state), scope)?;
                Ok(value)
            }
            ExprNode::At(_, _) => Err(EncodingError::UndefinedName {
                name: "<@ qualifier is not supported outside enum member access>".to_string(),
            }),

            ExprNode::Quantified { quantifier, decls, body } => self.lower_quantified(quantifier, &decls, body, state, scope),
            ExprNode::SetTest(quantifier, operand) => {
                let matrix = self.lower_set(operand, state, scope)?;
                Ok(Value::Formula(self.multiplicity_test(quantifier, &matrix)))
            }
            ExprNode::Comprehension { decls, body } => self.lower_comprehension(&decls, body, state, scope),

            ExprNode::Let { name, bound, body } => {
                let value = self.lower_expr(bound, state, scope)?;
                let mut inner = scope.clone();
                inner.insert(name, value);
                self.lower_expr(body, state, &inner)
            }
            ExprNode::IfElse { cond, then_branch, else_branch } => {
                let cond_term = self.lower_formula(cond, state, scope)?;
                let then_val = self.lower_expr(then_branch, state, scope)?;
                let else_val = self.lower_expr(else_branch, state, scope)?;
                self.ite(cond_term, then_val, else_val)
            }
            ExprNode::Block(items) => {
                let mut terms = Vec::with_capacity(items.len());
                for item in items {
                    terms.push(self.lower_formula(item, state, scope)?);
                }
                Ok(Value::Formula(BoolTerm::conj(terms)))
            }
            ExprNode::Sequence(a, b) => {
                let _ = self.lower_formula(a, state, scope)?;
                self.lower_expr(b, state, scope)
            }

            ExprNode::Future(op, a) => Ok(Value::Formula(self.lower_future(op, a, state, scope)?)),
            ExprNode::Past(op, a) => Ok(Value::Formula(self.lower_past(op, a, state, scope)?)),
            ExprNode::FutureBin(op, a, b) => Ok(Value::Formula(self.lower_future_bin(op, a, b, state, scope)?)),
            ExprNode::PastBin(op, a, b) => Ok(Value::Formula(self.lower_past_bin(op, a, b, state, scope)?)),

            ExprNode::Call { receiver, name, args } => self.lower_call(receiver, &name, &args, state, scope),
        }
    }

    fn resolve_ident(&mut self, name: &str, state: usize, scope: &Scope) -> Result<Value, EncodingError> {
        if let Some(value) = scope.get(name) {
            return Ok(value.clone());
        }
        if let Some(matrix) = self.env.get(name, state) {
            return Ok(Value::Set(matrix.clone()));
        }
        if let Some(qualified) = self.qualify_field(name) {
            if let Some(matrix) = self.env.get(&qualified, state) {
                return Ok(Value::Set(matrix.clone()));
            }
        }
        if let Some(&(_, index)) = self.symbols.enum_values.get(name) {
            return Ok(Value::Int(IntTerm::from_const(self.bit_width, index as i64)));
        }
        Err(EncodingError::UndefinedName { name: name.to_string() })
    }

    /// A bare field name (e.g. `r` in `a.r`) is keyed in the environment as
    /// `"Sig.r"`. Fields are expected to be uniquely named across a module,
    /// so the first declaring sig wins.
    fn qualify_field(&self, name: &str) -> Option<String> {
        self.symbols
            .sigs
            .iter()
            .find(|sig| sig.fields.iter().any(|f| f.name == name))
            .map(|sig| format!("{}.{name}", sig.name))
    }

    fn ite(&mut self, cond: BoolTerm, then_val: Value, else_val: Value) -> Result<Value, EncodingError> {
        match (then_val, else_val) {
            (Value::Formula(t), Value::Formula(e)) => Ok(Value::Formula(BoolTerm::disj([
                BoolTerm::conj([cond.clone(), t]),
                BoolTerm::conj([BoolTerm::not(cond), e]),
            ]))),
            (Value::Set(t), Value::Set(e)) => {
                assert_eq!(t.arity(), e.arity(), "if-then-else branches must share an arity");
                let guarded_t = BoolMatrix::constant(&TupleSet::empty(t.arity()), self.universe.len());
                let mut result = guarded_t;
                for (tuple, term) in t.tuples() {
                    result.set(tuple.clone(), BoolTerm::conj([cond.clone(), term.clone()]));
                }
                for (tuple, term) in e.tuples() {
                    let existing = result.get(tuple);
                    let contribution = BoolTerm::conj([BoolTerm::not(cond.clone()), term.clone()]);
                    result.set(tuple.clone(), BoolTerm::disj([existing, contribution]));
                }
                Ok(Value::Set(result))
            }
            (Value::Int(t), Value::Int(e)) => {
                let width = t.width().max(e.width());
                let bits: Vec<BoolTerm> = (0..width)
                    .map(|i| {
                        let tb = t.bits.get(i).cloned().unwrap_or_else(BoolTerm::bottom);
                        let eb = e.bits.get(i).cloned().unwrap_or_else(BoolTerm::bottom);
                        BoolTerm::disj([
                            BoolTerm::conj([cond.clone(), tb]),
                            BoolTerm::conj([BoolTerm::not(cond.clone()), eb]),
                        ])
                    })
                    .collect();
                Ok(Value::Int(IntTerm { bits }))
            }
            _ => Err(EncodingError::UndefinedName {
                name: "<if-then-else branches of mismatched kind>".to_string(),
            }),
        }
    }

    fn lower_compare(&mut self, op: CompareOp, a: ExprId, b: ExprId, state: usize, scope: &Scope) -> Result<Value, EncodingError> {
        let left = self.lower_expr(a, state, scope)?;
        let right = self.lower_expr(b, state, scope)?;
        let term = match (left, right) {
            (Value::Int(l), Value::Int(r)) => match op {
                CompareOp::Eq => l.eq(&r),
                CompareOp::NotEq => BoolTerm::not(l.eq(&r)),
                CompareOp::Lt => l.lt(&r),
                CompareOp::Gt => l.gt(&r),
                CompareOp::LessEq => l.le(&r),
                CompareOp::GreaterEq => l.ge(&r),
                CompareOp::In | CompareOp::NotIn => {
                    return Err(EncodingError::UndefinedName {
                        name: "<in/not in applied to integers>".to_string(),
                    })
                }
            },
            (Value::Set(l), Value::Set(r)) => {
                assert_eq!(l.arity(), r.arity(), "comparison requires matching arities");
                let subset_lr = self.subset(&l, &r);
                match op {
                    CompareOp::Eq => BoolTerm::conj([subset_lr, self.subset(&r, &l)]),
                    CompareOp::NotEq => BoolTerm::not(BoolTerm::conj([subset_lr.clone(), self.subset(&r, &l)])),
                    CompareOp::In => subset_lr,
                    CompareOp::NotIn => BoolTerm::not(subset_lr),
                    _ => {
                        return Err(EncodingError::UndefinedName {
                            name: "<ordering comparison applied to relations>".to_string(),
                        })
                    }
                }
            }
            _ => {
                return Err(EncodingError::UndefinedName {
                    name: "<comparison between mismatched kinds>".to_string(),
                })
            }
        };
        Ok(Value::Formula(term))
    }

    /// `l in r`: every tuple `l` might contain is also a member of `r`.
    fn subset(&self, l: &BoolMatrix, r: &BoolMatrix) -> BoolTerm {
        BoolTerm::conj(l.tuples().map(|(t, term)| term.clone().implies(r.get(t))))
    }

    fn lower_set_binary(&mut self, op: SetOp, a: ExprId, b: ExprId, state: usize, scope: &Scope) -> Result<Value, EncodingError> {
        let left = self.lower_set(a, state, scope)?;
        let right = self.lower_set(b, state, scope)?;
        let result = match op {
            SetOp::Union => left.union(&right),
            SetOp::Difference => left.difference(&right),
            SetOp::Intersection => left.intersection(&right),
            SetOp::Override => left.override_with(&right),
            SetOp::DomRestrict => right.domain_restrict(&left),
            SetOp::RanRestrict => left.range_restrict(&right),
            SetOp::Product => left.product(&right),
            SetOp::Join => left.join(&right),
        };
        Ok(Value::Set(result))
    }

    fn lower_unary_rel(&mut self, op: UnaryRelOp, a: ExprId, state: usize, scope: &Scope) -> Result<Value, EncodingError> {
        match op {
            UnaryRelOp::Cardinality => {
                let matrix = self.lower_set(a, state, scope)?;
                Ok(Value::Int(self.cardinality(&matrix)))
            }
            UnaryRelOp::Transpose => Ok(Value::Set(self.lower_set(a, state, scope)?.transpose())),
            UnaryRelOp::Closure => {
                let matrix = self.lower_set(a, state, scope)?;
                if matrix.arity() != 2 {
                    return Err(EncodingError::UnsupportedCardinalityArity { arity: matrix.arity() });
                }
                Ok(Value::Set(matrix.transitive_closure()))
            }
            UnaryRelOp::ReflexiveClosure => {
                let matrix = self.lower_set(a, state, scope)?;
                Ok(Value::Set(matrix.reflexive_transitive_closure(&self.universe)))
            }
        }
    }

    fn multiplicity_test(&mut self, quantifier: Quantifier, matrix: &BoolMatrix) -> BoolTerm {
        let terms: Vec<BoolTerm> = matrix.tuples().map(|(_, t)| t.clone()).collect();
        match quantifier {
            Quantifier::No => BoolTerm::not(BoolTerm::disj(terms)),
            Quantifier::Some => BoolTerm::disj(terms),
            Quantifier::One => exactly_one_formula(&terms),
            Quantifier::Lone => at_most_one_formula(&terms),
            Quantifier::All | Quantifier::Sum => unreachable!("the parser never produces these as a SetTest"),
        }
    }

    /// Expands a list of (possibly multi-name) declarations into every
    /// ground combination: a scope extension paired with the conjunction
    /// of "this atom really is a member of its domain" guards. `disj`
    /// groups are pruned at this ground-enumeration stage rather than
    /// turned into a SAT constraint, since every candidate here is already
    /// a concrete tuple.
    fn expand_decls(&mut self, decls: &[Decl], state: usize, scope: &Scope) -> Result<Vec<(Scope, BoolTerm)>, EncodingError> {
        let mut combos: Vec<(Scope, BoolTerm)> = vec![(scope.clone(), BoolTerm::top())];
        for decl in decls {
            let mut next = Vec::new();
            for (combo_scope, guard) in &combos {
                let domain = self.lower_set(decl.domain, state, combo_scope)?;
                let candidates: Vec<(Tuple, BoolTerm)> = domain.tuples().map(|(t, term)| (t.clone(), term.clone())).collect();
                self.expand_names(&decl.names, decl.disjoint, &candidates, combo_scope, guard, &mut next);
            }
            combos = next;
        }
        Ok(combos)
    }

    fn expand_names(
        &self,
        names: &[String],
        disjoint: bool,
        candidates: &[(Tuple, BoolTerm)],
        base_scope: &Scope,
        base_guard: &BoolTerm,
        out: &mut Vec<(Scope, BoolTerm)>,
    ) {
        fn go(
            encoder: &Encoder,
            names: &[String],
            disjoint: bool,
            candidates: &[(Tuple, BoolTerm)],
            chosen: &mut Vec<Tuple>,
            scope: Scope,
            guard: BoolTerm,
            out: &mut Vec<(Scope, BoolTerm)>,
        ) {
            if names.is_empty() {
                out.push((scope, guard));
                return;
            }
            for (tuple, term) in candidates {
                if disjoint && chosen.contains(tuple) {
                    continue;
                }
                chosen.push(tuple.clone());
                let mut next_scope = scope.clone();
                next_scope.insert(names[0].clone(), Value::Set(encoder.singleton(tuple.clone())));
                let next_guard = BoolTerm::conj([guard.clone(), term.clone()]);
                go(encoder, &names[1..], disjoint, candidates, chosen, next_scope, next_guard, out);
                chosen.pop();
            }
        }
        let mut chosen = Vec::new();
        go(self, names, disjoint, candidates, &mut chosen, base_scope.clone(), base_guard.clone(), out);
    }

    fn lower_quantified(
        &mut self,
        quantifier: Quantifier,
        decls: &[Decl],
        body: ExprId,
        state: usize,
        scope: &Scope,
    ) -> Result<Value, EncodingError> {
        let combos = self.expand_decls(decls, state, scope)?;
        match quantifier {
            Quantifier::Sum => {
                let mut total = IntTerm::from_const(self.bit_width, 0);
                for (combo_scope, _guard) in &combos {
                    let contribution = self.lower_int(body, state, combo_scope)?;
                    total = total.add(&contribution);
                }
                Ok(Value::Int(total))
            }
            _ => {
                let mut terms = Vec::with_capacity(combos.len());
                for (combo_scope, guard) in &combos {
                    let body_term = self.lower_formula(body, state, combo_scope)?;
                    terms.push(match quantifier {
                        Quantifier::All => guard.clone().implies(body_term),
                        _ => BoolTerm::conj([guard.clone(), body_term]),
                    });
                }
                let formula = match quantifier {
                    Quantifier::All => BoolTerm::conj(terms),
                    Quantifier::Some => BoolTerm::disj(terms),
                    Quantifier::No => BoolTerm::not(BoolTerm::disj(terms)),
                    Quantifier::One => exactly_one_formula(&terms),
                    Quantifier::Lone => at_most_one_formula(&terms),
                    Quantifier::Sum => unreachable!("handled above"),
                };
                Ok(Value::Formula(formula))
            }
        }
    }

    fn lower_comprehension(&mut self, decls: &[Decl], body: ExprId, state: usize, scope: &Scope) -> Result<Value, EncodingError> {
        let combos = self.expand_decls(decls, state, scope)?;
        let arity: usize = decls.iter().map(|_| 1).sum::<usize>().max(1);
        let mut result = BoolMatrix::empty(arity.max(decls.len().max(1)), self.universe.len());
        for (combo_scope, guard) in &combos {
            let body_term = self.lower_formula(body, state, combo_scope)?;
            let mut tuple = Vec::new();
            for decl in decls {
                for name in &decl.names {
                    if let Some(Value::Set(m)) = combo_scope.get(name) {
                        if let Some((t, _)) = m.tuples().next() {
                            tuple.extend_from_slice(t);
                        }
                    }
                }
            }
            if tuple.len() != result.arity() {
                result = BoolMatrix::empty(tuple.len(), self.universe.len());
            }
            result.set(tuple, BoolTerm::conj([guard.clone(), body_term]));
        }
        Ok(Value::Set(result))
    }

    /// Looks up the callee in the AST rather than the symbol table: unlike
    /// [`crate::symbols::PredSymbol`]/[`crate::symbols::FunSymbol`], a
    /// [`crate::ast::PredDecl`]/[`crate::ast::FunDecl`] still carries the
    /// receiver's bound name (`pred Sig.p[...] {}` binds `this`), which the
    /// call needs in order to extend the inner scope correctly.
    fn lower_call(&mut self, receiver: Option<ExprId>, name: &str, args: &[ExprId], state: usize, scope: &Scope) -> Result<Value, EncodingError> {
        if let Some(pred) = self.module.preds.iter().find(|p| p.name == name) {
            let body = pred.body;
            let has_receiver = pred.receiver.is_some();
            let mut inner = scope.clone();
            if let (true, Some(r)) = (has_receiver, receiver) {
                let value = self.lower_expr(r, state, scope)?;
                inner.insert("this".to_string(), value);
            }
            for (param, arg) in pred.params.iter().zip(args) {
                let value = self.lower_expr(*arg, state, scope)?;
                inner.insert(param.name.clone(), value);
            }
            return Ok(Value::Formula(self.lower_formula(body, state, &inner)?));
        }
        if let Some(fun) = self.module.funs.iter().find(|f| f.name == name) {
            let body = fun.body;
            let has_receiver = fun.receiver.is_some();
            let mut inner = scope.clone();
            if let (true, Some(r)) = (has_receiver, receiver) {
                let value = self.lower_expr(r, state, scope)?;
                inner.insert("this".to_string(), value);
            }
            for (param, arg) in fun.params.iter().zip(args) {
                let value = self.lower_expr(*arg, state, scope)?;
                inner.insert(param.name.clone(), value);
            }
            return self.lower_expr(body, state, &inner);
        }
        Err(EncodingError::UndefinedName { name: name.to_string() })
    }

    fn advance(&self, state: usize) -> usize {
        (state + 1).min(self.states.saturating_sub(1))
    }

    fn lower_future(&mut self, op: FutureOp, a: ExprId, state: usize, scope: &Scope) -> Result<BoolTerm, EncodingError> {
        match op {
            FutureOp::After => self.after(a, state, scope),
            FutureOp::Always => {
                let mut terms = Vec::new();
                for s in state..self.states {
                    terms.push(self.lower_formula(a, s, scope)?);
                }
                if let Some(loop_lits) = self.loop_lits.clone() {
                    for (k, lit) in loop_lits.iter().enumerate() {
                        if k < state {
                            let at_k = self.lower_formula(a, k, scope)?;
                            terms.push(BoolTerm::lit(*lit).implies(at_k));
                        }
                    }
                }
                Ok(BoolTerm::conj(terms))
            }
            FutureOp::Eventually => {
                let mut terms = Vec::new();
                for s in state..self.states {
                    terms.push(self.lower_formula(a, s, scope)?);
                }
                Ok(BoolTerm::disj(terms))
            }
        }
    }

    fn after(&mut self, a: ExprId, state: usize, scope: &Scope) -> Result<BoolTerm, EncodingError> {
        if state + 1 < self.states {
            return self.lower_formula(a, state + 1, scope);
        }
        match self.loop_lits.clone() {
            Some(loop_lits) => {
                let mut terms = Vec::with_capacity(loop_lits.len());
                for (k, lit) in loop_lits.iter().enumerate() {
                    let at_k = self.lower_formula(a, k, scope)?;
                    terms.push(BoolTerm::conj([BoolTerm::lit(*lit), at_k]));
                }
                Ok(BoolTerm::disj(terms))
            }
            None => Ok(BoolTerm::bottom()),
        }
    }

    fn lower_past(&mut self, op: PastOp, a: ExprId, state: usize, scope: &Scope) -> Result<BoolTerm, EncodingError> {
        match op {
            PastOp::Before => {
                if state == 0 {
                    Ok(BoolTerm::bottom())
                } else {
                    self.lower_formula(a, state - 1, scope)
                }
            }
            PastOp::Historically => {
                let mut terms = Vec::new();
                for s in 0..=state {
                    terms.push(self.lower_formula(a, s, scope)?);
                }
                Ok(BoolTerm::conj(terms))
            }
            PastOp::Once => {
                let mut terms = Vec::new();
                for s in 0..=state {
                    terms.push(self.lower_formula(a, s, scope)?);
                }
                Ok(BoolTerm::disj(terms))
            }
        }
    }

    fn lower_future_bin(&mut self, op: FutureBinOp, a: ExprId, b: ExprId, state: usize, scope: &Scope) -> Result<BoolTerm, EncodingError> {
        let mut until_terms = Vec::new();
        for j in state..self.states {
            let psi_j = self.lower_formula(b, j, scope)?;
            let mut phi_prefix = Vec::new();
            for i in state..j {
                phi_prefix.push(self.lower_formula(a, i, scope)?);
            }
            until_terms.push(BoolTerm::conj({
                let mut all = phi_prefix;
                all.push(psi_j);
                all
            }));
        }
        let until = BoolTerm::disj(until_terms);
        match op {
            FutureBinOp::Until => Ok(until),
            FutureBinOp::Releases => {
                let always_b = self.lower_future(FutureOp::Always, b, state, scope)?;
                Ok(BoolTerm::disj([until, always_b]))
            }
        }
    }

    fn lower_past_bin(&mut self, op: PastBinOp, a: ExprId, b: ExprId, state: usize, scope: &Scope) -> Result<BoolTerm, EncodingError> {
        let mut since_terms = Vec::new();
        for j in (0..=state).rev() {
            let psi_j = self.lower_formula(b, j, scope)?;
            let mut phi_suffix = Vec::new();
            for i in (j + 1)..=state {
                phi_suffix.push(self.lower_formula(a, i, scope)?);
            }
            since_terms.push(BoolTerm::conj({
                let mut all = phi_suffix;
                all.push(psi_j);
                all
            }));
        }
        let since = BoolTerm::disj(since_terms);
        match op {
            PastBinOp::Since => Ok(since),
            PastBinOp::Triggered => {
                let historically_b = self.lower_past(PastOp::Historically, b, state, scope)?;
                Ok(BoolTerm::disj([since, historically_b]))
            }
        }
    }
}

fn exactly_one_formula(terms: &[BoolTerm]) -> BoolTerm {
    BoolTerm::conj([BoolTerm::disj(terms.iter().cloned()), at_most_one_formula(terms)])
}

fn at_most_one_formula(terms: &[BoolTerm]) -> BoolTerm {
    let mut clauses = Vec::new();
    for i in 0..terms.len() {
        for j in (i + 1)..terms.len() {
            clauses.push(BoolTerm::disj([BoolTerm::not(terms[i].clone()), BoolTerm::not(terms[j].clone())]));
        }
    }
    BoolTerm::conj(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::bounds::BoundsBuilder;
    use crate::parser::parse;
    use alloy_sat::config::Config;
    use alloy_sat::context::Context;
    use alloy_sat::reports::Report;

    fn env_for_a(universe: &Universe, builder: &mut CnfBuilder) -> RelationalEnvironment {
        let bounds = BoundsBuilder::new().unary_upper("A", universe.atoms().collect()).build();
        let matrix = BoolMatrix::from_bounds(bounds.get("A").unwrap(), universe.len(), builder);
        let mut env = RelationalEnvironment::new();
        env.insert("A", vec![matrix]);
        env
    }

    #[test]
    fn no_a_forces_every_candidate_atom_false() {
        let (module, diags) = parse("sig A {} fact { no A }");
        assert!(diags.is_empty());
        let analysis = analyze(&module);
        assert!(analysis.diagnostics.is_empty());

        let universe = Universe::synthetic("A", 3);
        let mut builder = CnfBuilder::new(Context::from_config(Config::default()));
        let env = env_for_a(&universe, &mut builder);
        let mut encoder = Encoder::new(&module, &analysis.symbols, env, universe, &mut builder, 4);
        encoder.assert_fact(module.facts[0].body).unwrap();

        let mut ctx = builder.into_context();
        assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
    }

    #[test]
    fn some_and_no_a_is_unsatisfiable() {
        let (module, diags) = parse("sig A {} fact { some A and no A }");
        assert!(diags.is_empty());
        let analysis = analyze(&module);

        let universe = Universe::synthetic("A", 3);
        let mut builder = CnfBuilder::new(Context::from_config(Config::default()));
        let env = env_for_a(&universe, &mut builder);
        let mut encoder = Encoder::new(&module, &analysis.symbols, env, universe, &mut builder, 4);
        encoder.assert_fact(module.facts[0].body).unwrap();

        let mut ctx = builder.into_context();
        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }
}
