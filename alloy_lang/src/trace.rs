//! Trace construction (C10): builds the per-state [`RelationalEnvironment`]
//! a temporal command needs -- `var` relations get one matrix per state,
//! everything else is shared -- plus the `loop_k` literals, and hands both
//! to [`crate::encoder::Encoder`] rather than re-implementing lowering.

use alloy_sat::structures::literal::Literal;

use crate::bounds::Bounds;
use crate::encoder::RelationalEnvironment;
use crate::formula::{BoolTerm, CnfBuilder};
use crate::matrix::BoolMatrix;
use crate::symbols::SymbolTable;
use crate::universe::Universe;

/// The state count and loop-completion literals a temporal run needs,
/// built once and then shared by every operator that crosses state
/// boundaries (`after`, `always`, `until`, ...).
pub struct TraceSkeleton {
    pub length: usize,
    pub loop_lits: Vec<Literal>,
}

impl TraceSkeleton {
    /// Allocates `length` fresh `loop_k` literals with an exactly-one
    /// constraint -- "the successor of the last state is state k".
    pub fn build(length: usize, builder: &mut CnfBuilder) -> Result<Self, alloy_sat::types::err::ErrorKind> {
        let loop_lits: Vec<Literal> = (0..length).map(|_| Literal::new(builder.fresh_var(), true)).collect();
        builder.exactly_one(&loop_lits)?;
        Ok(TraceSkeleton { length, loop_lits })
    }

    /// `assertTransition(f)`: conjoins `f(i, i+1)` for every adjacent pair in
    /// the finite prefix, plus, gated on each state being the designated
    /// loop target, `f(L-1, k)`.
    pub fn assert_transition(
        &self,
        builder: &mut CnfBuilder,
        mut f: impl FnMut(usize, usize) -> BoolTerm,
    ) -> Result<(), alloy_sat::types::err::ErrorKind> {
        for i in 0..self.length.saturating_sub(1) {
            builder.assert_formula(&f(i, i + 1))?;
        }
        if self.length > 0 {
            let last = self.length - 1;
            let terms: Vec<BoolTerm> = self
                .loop_lits
                .iter()
                .enumerate()
                .map(|(k, lit)| BoolTerm::conj([BoolTerm::lit(*lit), f(last, k)]))
                .collect();
            builder.assert_formula(&BoolTerm::disj(terms))?;
        }
        Ok(())
    }
}

/// Builds the environment a temporal encoder walks: `var`-flagged relations
/// get `length` independently-allocated matrices, everything else gets one
/// matrix reused across every state index.
pub fn build_trace_environment(
    bounds: &Bounds,
    symbols: &SymbolTable,
    universe: &Universe,
    length: usize,
    builder: &mut CnfBuilder,
) -> RelationalEnvironment {
    let mut env = RelationalEnvironment::new();
    for name in bounds.names() {
        let bound = bounds.get(name).expect("name came from bounds.names()");
        let is_var = relation_is_var(name, symbols);
        let states = if is_var {
            (0..length).map(|_| BoolMatrix::from_bounds(bound, universe.len(), builder)).collect()
        } else {
            vec![BoolMatrix::from_bounds(bound, universe.len(), builder)]
        };
        env.insert(name.clone(), states);
    }
    env
}

fn relation_is_var(name: &str, symbols: &SymbolTable) -> bool {
    if let Some((sig_name, field_name)) = name.split_once('.') {
        symbols
            .sig_named(sig_name)
            .map(|id| symbols.sig(id).fields.iter().any(|f| f.name == field_name && f.var))
            .unwrap_or(false)
    } else {
        symbols.sig_named(name).map(|id| symbols.sig(id).var).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundsBuilder;
    use alloy_sat::config::Config;
    use alloy_sat::context::Context;

    #[test]
    fn loop_literals_are_mutually_exclusive_and_at_least_one_holds() {
        let mut builder = CnfBuilder::new(Context::from_config(Config::default()));
        let skeleton = TraceSkeleton::build(3, &mut builder).unwrap();
        assert_eq!(skeleton.loop_lits.len(), 3);
        let mut ctx = builder.into_context();
        assert_eq!(ctx.solve().unwrap(), alloy_sat::reports::Report::Satisfiable);
        let true_count = skeleton
            .loop_lits
            .iter()
            .filter(|l| ctx.atom_db.value_of(l.atom()) == Some(true))
            .count();
        assert_eq!(true_count, 1);
    }

    #[test]
    fn non_var_relation_shares_one_matrix_across_every_state() {
        let mut builder = CnfBuilder::new(Context::from_config(Config::default()));
        let universe = Universe::synthetic("A", 2);
        let bounds = BoundsBuilder::new().unary_upper("A", universe.atoms().collect()).build();
        let symbols = SymbolTable::default();
        let env = build_trace_environment(&bounds, &symbols, &universe, 4, &mut builder);
        let m0 = env.get("A", 0).unwrap();
        let m3 = env.get("A", 3).unwrap();
        assert_eq!(m0.get(&[0]), m3.get(&[0]));
    }
}
