//! Boolean formulas and the CNF builder (C7): structural simplification,
//! hash-consed Tseitin lowering, direct clause emission, and cardinality
//! encodings, all funneling into an [`alloy_sat::context::Context`].

use std::collections::HashMap;

use alloy_sat::context::Context;
use alloy_sat::structures::literal::Literal;
use alloy_sat::structures::Atom;
use alloy_sat::types::err::ErrorKind;

/// A boolean term over SAT atoms, simplified structurally as it's built so
/// the Tseitin pass downstream never has to rediscover a constant subterm.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoolTerm {
    Const(bool),
    Lit(Literal),
    And(Vec<BoolTerm>),
    Or(Vec<BoolTerm>),
    Not(Box<BoolTerm>),
}

impl BoolTerm {
    pub fn top() -> Self {
        BoolTerm::Const(true)
    }

    pub fn bottom() -> Self {
        BoolTerm::Const(false)
    }

    pub fn lit(lit: Literal) -> Self {
        BoolTerm::Lit(lit)
    }

    /// `conj({x, top}) -> x`, `conj([.., bottom, ..]) -> bottom`.
    pub fn conj(terms: impl IntoIterator<Item = BoolTerm>) -> Self {
        let mut flat = Vec::new();
        for term in terms {
            match term {
                BoolTerm::Const(true) => continue,
                BoolTerm::Const(false) => return BoolTerm::bottom(),
                BoolTerm::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => BoolTerm::top(),
            1 => flat.into_iter().next().unwrap(),
            _ => BoolTerm::And(flat),
        }
    }

    /// `disj({x, bottom}) -> x`, `disj([.., top, ..]) -> top`.
    pub fn disj(terms: impl IntoIterator<Item = BoolTerm>) -> Self {
        let mut flat = Vec::new();
        for term in terms {
            match term {
                BoolTerm::Const(false) => continue,
                BoolTerm::Const(true) => return BoolTerm::top(),
                BoolTerm::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => BoolTerm::bottom(),
            1 => flat.into_iter().next().unwrap(),
            _ => BoolTerm::Or(flat),
        }
    }

    /// `not(not(x)) -> x`, `not(top) -> bottom`, `not(bottom) -> top`.
    pub fn not(term: BoolTerm) -> Self {
        match term {
            BoolTerm::Const(b) => BoolTerm::Const(!b),
            BoolTerm::Not(inner) => *inner,
            BoolTerm::Lit(lit) => BoolTerm::Lit(lit.negate()),
            other => BoolTerm::Not(Box::new(other)),
        }
    }

    pub fn implies(self, other: BoolTerm) -> Self {
        BoolTerm::disj([BoolTerm::not(self), other])
    }

    pub fn iff(self, other: BoolTerm) -> Self {
        BoolTerm::conj([
            self.clone().implies(other.clone()),
            other.implies(self),
        ])
    }
}

/// Owns the solver context clauses are emitted into, plus a memo of
/// already-lowered subterms so repeated structure (the same formula reused
/// across several quantifier instantiations) gets one auxiliary variable
/// rather than one per occurrence.
pub struct CnfBuilder {
    ctx: Context,
    memo: HashMap<BoolTerm, Literal>,
}

impl CnfBuilder {
    pub fn new(ctx: Context) -> Self {
        CnfBuilder {
            ctx,
            memo: HashMap::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn into_context(self) -> Context {
        self.ctx
    }

    pub fn fresh_var(&mut self) -> Atom {
        self.ctx.fresh_atom()
    }

    fn add_clause(&mut self, literals: Vec<Literal>) -> Result<(), ErrorKind> {
        self.ctx.add_clause(literals).map(|_| ())
    }

    /// Tseitin-lowers `term` to a single literal standing for its value,
    /// memoized on the term's own structure so a term built twice is only
    /// ever given clauses once.
    pub fn lower(&mut self, term: &BoolTerm) -> Result<Literal, ErrorKind> {
        if let BoolTerm::Lit(lit) = term {
            return Ok(*lit);
        }
        if let BoolTerm::Const(b) = term {
            let var = self.fresh_var();
            let lit = Literal::new(var, *b);
            self.add_clause(vec![lit])?;
            return Ok(lit);
        }
        if let Some(existing) = self.memo.get(term) {
            return Ok(*existing);
        }

        let result = match term {
            BoolTerm::Not(inner) => {
                let inner_lit = self.lower(inner)?;
                inner_lit.negate()
            }
            BoolTerm::And(terms) => {
                let lits: Vec<Literal> = terms
                    .iter()
                    .map(|t| self.lower(t))
                    .collect::<Result<_, _>>()?;
                let aux = Literal::new(self.fresh_var(), true);
                for lit in &lits {
                    self.add_clause(vec![aux.negate(), *lit])?;
                }
                let mut clause: Vec<Literal> = lits.iter().map(|l| l.negate()).collect();
                clause.push(aux);
                self.add_clause(clause)?;
                aux
            }
            BoolTerm::Or(terms) => {
                let lits: Vec<Literal> = terms
                    .iter()
                    .map(|t| self.lower(t))
                    .collect::<Result<_, _>>()?;
                let aux = Literal::new(self.fresh_var(), true);
                for lit in &lits {
                    self.add_clause(vec![aux, lit.negate()])?;
                }
                let mut clause: Vec<Literal> = lits.clone();
                clause.push(aux.negate());
                self.add_clause(clause)?;
                aux
            }
            BoolTerm::Lit(_) | BoolTerm::Const(_) => unreachable!("handled above"),
        };

        self.memo.insert(term.clone(), result);
        Ok(result)
    }

    /// Asserts `term` as a top-level fact: lowers it and forces the result
    /// true.
    pub fn assert_formula(&mut self, term: &BoolTerm) -> Result<(), ErrorKind> {
        let lit = self.lower(term)?;
        self.add_clause(vec![lit])
    }

    pub fn assert_some(&mut self, members: &[Literal]) -> Result<(), ErrorKind> {
        self.at_least_one(members)
    }

    pub fn assert_no(&mut self, members: &[Literal]) -> Result<(), ErrorKind> {
        for &lit in members {
            self.add_clause(vec![lit.negate()])?;
        }
        Ok(())
    }

    pub fn assert_one(&mut self, members: &[Literal]) -> Result<(), ErrorKind> {
        self.at_least_one(members)?;
        self.at_most_one(members)
    }

    /// At least one of `literals` holds: a single clause.
    pub fn at_least_one(&mut self, literals: &[Literal]) -> Result<(), ErrorKind> {
        if literals.is_empty() {
            return self.add_clause(vec![]);
        }
        self.add_clause(literals.to_vec())
    }

    /// At most one of `literals` holds: pairwise below a small threshold,
    /// a sequential-counter encoding above it (linear instead of quadratic
    /// clauses for large cardinalities).
    pub fn at_most_one(&mut self, literals: &[Literal]) -> Result<(), ErrorKind> {
        const PAIRWISE_THRESHOLD: usize = 6;
        if literals.len() <= PAIRWISE_THRESHOLD {
            for i in 0..literals.len() {
                for j in (i + 1)..literals.len() {
                    self.add_clause(vec![literals[i].negate(), literals[j].negate()])?;
                }
            }
            return Ok(());
        }

        // Sinz's sequential counter: one auxiliary `s_i` per prefix meaning
        // "some literal among the first i+1 has been seen".
        let mut aux: Vec<Atom> = Vec::with_capacity(literals.len() - 1);
        for _ in 0..literals.len() - 1 {
            aux.push(self.fresh_var());
        }
        let s = |i: usize| Literal::new(aux[i], true);

        self.add_clause(vec![literals[0].negate(), s(0)])?;
        for i in 1..literals.len() - 1 {
            self.add_clause(vec![literals[i].negate(), s(i)])?;
            self.add_clause(vec![s(i - 1).negate(), s(i)])?;
            self.add_clause(vec![literals[i].negate(), s(i - 1).negate()])?;
        }
        let last = literals.len() - 1;
        self.add_clause(vec![literals[last].negate(), s(last - 1).negate()])?;
        Ok(())
    }

    /// Exactly one of `literals` holds.
    pub fn exactly_one(&mut self, literals: &[Literal]) -> Result<(), ErrorKind> {
        self.at_least_one(literals)?;
        self.at_most_one(literals)
    }

    /// At most `k` of `literals` hold, via a sequential-counter cardinality
    /// network generalizing [`CnfBuilder::at_most_one`] (`k=1`).
    pub fn at_most_k(&mut self, literals: &[Literal], k: usize) -> Result<(), ErrorKind> {
        if k >= literals.len() {
            return Ok(());
        }
        if k == 0 {
            return self.assert_no(literals);
        }
        if k == 1 {
            return self.at_most_one(literals);
        }

        let n = literals.len();
        // register[i][j]: "at least j+1 of the first i+1 literals are true".
        let mut register: Vec<Vec<Atom>> = Vec::with_capacity(n - 1);
        for _ in 0..n - 1 {
            let mut row = Vec::with_capacity(k);
            for _ in 0..k {
                row.push(self.fresh_var());
            }
            register.push(row);
        }
        let r = |i: usize, j: usize, register: &[Vec<Atom>]| Literal::new(register[i][j], true);

        self.add_clause(vec![literals[0].negate(), r(0, 0, &register)])?;
        for j in 1..k {
            self.add_clause(vec![r(0, j, &register).negate()])?;
        }
        for i in 1..n - 1 {
            self.add_clause(vec![literals[i].negate(), r(i, 0, &register)])?;
            self.add_clause(vec![r(i - 1, 0, &register).negate(), r(i, 0, &register)])?;
            for j in 1..k {
                self.add_clause(vec![
                    literals[i].negate(),
                    r(i - 1, j - 1, &register).negate(),
                    r(i, j, &register),
                ])?;
                self.add_clause(vec![r(i - 1, j, &register).negate(), r(i, j, &register)])?;
            }
            self.add_clause(vec![
                literals[i].negate(),
                r(i - 1, k - 1, &register).negate(),
            ])?;
        }
        self.add_clause(vec![literals[n - 1].negate(), r(n - 2, k - 1, &register).negate()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sat::config::Config;
    use alloy_sat::reports::Report;

    fn builder() -> CnfBuilder {
        CnfBuilder::new(Context::from_config(Config::default()))
    }

    #[test]
    fn conj_drops_top_and_absorbs_bottom() {
        let x = BoolTerm::lit(Literal::new(1, true));
        assert_eq!(BoolTerm::conj([x.clone(), BoolTerm::top()]), x);
        assert_eq!(
            BoolTerm::conj([x.clone(), BoolTerm::bottom()]),
            BoolTerm::bottom()
        );
    }

    #[test]
    fn double_negation_cancels() {
        let x = BoolTerm::lit(Literal::new(1, true));
        assert_eq!(BoolTerm::not(BoolTerm::not(x.clone())), x);
    }

    #[test]
    fn tseitin_lowering_is_equisatisfiable_with_the_source_formula() {
        let mut builder = builder();
        let a = Literal::new(builder.fresh_var(), true);
        let b = Literal::new(builder.fresh_var(), true);
        let conj = BoolTerm::conj([BoolTerm::lit(a), BoolTerm::lit(b)]);
        builder.assert_formula(&conj).unwrap();
        let mut ctx = builder.into_context();
        assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
        assert_eq!(ctx.atom_db.value_of(a.atom()), Some(true));
        assert_eq!(ctx.atom_db.value_of(b.atom()), Some(true));
    }

    #[test]
    fn at_most_one_forbids_two_true_literals() {
        let mut builder = builder();
        let lits: Vec<Literal> = (0..3).map(|_| Literal::new(builder.fresh_var(), true)).collect();
        builder.at_most_one(&lits).unwrap();
        builder.assert_formula(&BoolTerm::lit(lits[0])).unwrap();
        builder.assert_formula(&BoolTerm::lit(lits[1])).unwrap();
        let mut ctx = builder.into_context();
        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }

    #[test]
    fn exactly_one_is_satisfiable_with_a_single_literal_true() {
        let mut builder = builder();
        let lits: Vec<Literal> = (0..4).map(|_| Literal::new(builder.fresh_var(), true)).collect();
        builder.exactly_one(&lits).unwrap();
        let mut ctx = builder.into_context();
        assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
        let true_count = lits
            .iter()
            .filter(|l| ctx.atom_db.value_of(l.atom()) == Some(true))
            .count();
        assert_eq!(true_count, 1);
    }

    #[test]
    fn at_most_k_permits_up_to_k_true_literals() {
        let mut builder = builder();
        let lits: Vec<Literal> = (0..8).map(|_| Literal::new(builder.fresh_var(), true)).collect();
        builder.at_most_k(&lits, 2).unwrap();
        for lit in &lits[..3] {
            builder.assert_formula(&BoolTerm::lit(*lit)).unwrap();
        }
        let mut ctx = builder.into_context();
        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }
}
