//! Instance extraction (C13): reads a solved [`alloy_sat::context::Context`]
//! back through a [`RelationalEnvironment`] and [`Universe`] to produce the
//! human-facing tuple sets a model reports on success.

use std::collections::BTreeMap;

use alloy_sat::context::Context;

use crate::encoder::RelationalEnvironment;
use crate::formula::BoolTerm;
use crate::tuples::{Tuple, TupleSet};
use crate::universe::Universe;

/// One signature or field's extracted membership, named the way the
/// environment keys it (`"Sig"`, `"Sig.field"`).
#[derive(Clone, Debug, Default)]
pub struct Instance {
    pub universe: Vec<String>,
    pub relations: BTreeMap<String, TupleSet>,
}

/// A length-`L` sequence of [`Instance`]s plus the back-loop target a
/// temporal model's trace repeats into.
#[derive(Clone, Debug)]
pub struct TemporalInstance {
    pub states: Vec<Instance>,
    pub loop_state: usize,
}

fn term_is_true(ctx: &Context, term: &BoolTerm) -> bool {
    match term {
        BoolTerm::Const(b) => *b,
        BoolTerm::Lit(lit) => {
            let value = ctx.atom_db.value_of(lit.atom()).unwrap_or(false);
            value == lit.polarity()
        }
        BoolTerm::Not(inner) => !term_is_true(ctx, inner),
        BoolTerm::And(terms) => terms.iter().all(|t| term_is_true(ctx, t)),
        BoolTerm::Or(terms) => terms.iter().any(|t| term_is_true(ctx, t)),
    }
}

fn extract_relation(ctx: &Context, env: &RelationalEnvironment, names: &[String], state: usize) -> BTreeMap<String, TupleSet> {
    let mut relations = BTreeMap::new();
    for name in names {
        if let Some(matrix) = env.get(name, state) {
            let mut members: Vec<Tuple> = Vec::new();
            for (tuple, term) in matrix.tuples() {
                if term_is_true(ctx, term) {
                    members.push(tuple.clone());
                }
            }
            let arity = matrix.arity();
            relations.insert(name.clone(), TupleSet::from_iter(arity, members.into_iter()));
        }
    }
    relations
}

/// Extracts a single, non-temporal instance from a satisfied solve.
pub fn extract_instance(ctx: &Context, env: &RelationalEnvironment, universe: &Universe, relation_names: &[String]) -> Instance {
    Instance {
        universe: universe.atoms().map(|a| universe.name(a).to_string()).collect(),
        relations: extract_relation(ctx, env, relation_names, 0),
    }
}

/// Extracts a temporal trace: one [`Instance`] per state, plus the loop-back
/// target identified by which `loop_lits[k]` the solver set true.
pub fn extract_trace(
    ctx: &Context,
    env: &RelationalEnvironment,
    universe: &Universe,
    relation_names: &[String],
    loop_lits: &[alloy_sat::structures::literal::Literal],
    state_count: usize,
) -> TemporalInstance {
    let states = (0..state_count)
        .map(|s| Instance {
            universe: universe.atoms().map(|a| universe.name(a).to_string()).collect(),
            relations: extract_relation(ctx, env, relation_names, s),
        })
        .collect();
    let loop_state = loop_lits
        .iter()
        .position(|lit| ctx.atom_db.value_of(lit.atom()).unwrap_or(false) == lit.polarity())
        .unwrap_or(0);
    TemporalInstance { states, loop_state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::CnfBuilder;
    use crate::matrix::BoolMatrix;
    use alloy_sat::config::Config;
    use alloy_sat::structures::literal::Literal;

    #[test]
    fn extracted_instance_reports_only_atoms_the_solver_set_true() {
        let universe = Universe::synthetic("A", 2);
        let mut builder = CnfBuilder::new(Context::from_config(Config::default()));
        let tuples = TupleSet::from_iter(1, vec![vec![0], vec![1]].into_iter());
        let bound = crate::bounds::RelBound::ranged(TupleSet::empty(1), tuples);
        let matrix = BoolMatrix::from_bounds(&bound, universe.len(), &mut builder);
        let term0 = matrix.get(&[0]);
        builder.assert_formula(&term0).unwrap();
        let term1 = matrix.get(&[1]);
        builder.assert_formula(&BoolTerm::not(term1)).unwrap();

        let mut env = RelationalEnvironment::new();
        env.insert("A", vec![matrix]);

        let mut ctx = builder.into_context();
        ctx.solve().unwrap();

        let instance = extract_instance(&ctx, &env, &universe, &["A".to_string()]);
        let a = instance.relations.get("A").unwrap();
        assert!(a.contains(&[0]));
        assert!(!a.contains(&[1]));
    }

    #[test]
    fn loop_state_matches_whichever_loop_literal_the_solver_set() {
        let mut builder = CnfBuilder::new(Context::from_config(Config::default()));
        let loop_lits: Vec<Literal> = (0..3).map(|_| Literal::new(builder.fresh_var(), true)).collect();
        builder.exactly_one(&loop_lits).unwrap();
        builder.assert_formula(&BoolTerm::lit(loop_lits[1])).unwrap();
        let mut ctx = builder.into_context();
        ctx.solve().unwrap();

        let universe = Universe::synthetic("A", 1);
        let env = RelationalEnvironment::new();
        let trace = extract_trace(&ctx, &env, &universe, &[], &loop_lits, 3);
        assert_eq!(trace.loop_state, 1);
        assert_eq!(trace.states.len(), 3);
    }
}
