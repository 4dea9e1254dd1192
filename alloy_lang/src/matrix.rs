//! Boolean matrices (C8): the bridge between the set-theoretic [`tuples`]
//! layer and the boolean-formula layer a [`crate::formula::CnfBuilder`]
//! understands. A matrix maps each tuple it knows about to a
//! [`BoolTerm`](crate::formula::BoolTerm); a tuple absent from the map is
//! implicitly `bottom` (never a member).

use std::collections::{HashMap, HashSet};

use alloy_sat::structures::literal::Literal;

use crate::bounds::RelBound;
use crate::formula::{BoolTerm, CnfBuilder};
use crate::tuples::{Tuple, TupleSet};
use crate::universe::{AtomId, Universe};

#[derive(Clone, Debug)]
pub struct BoolMatrix {
    arity: usize,
    universe_size: usize,
    entries: HashMap<Tuple, BoolTerm>,
}

impl BoolMatrix {
    pub fn empty(arity: usize, universe_size: usize) -> Self {
        BoolMatrix {
            arity,
            universe_size,
            entries: HashMap::new(),
        }
    }

    /// A matrix whose membership is fixed: every tuple in `tuples` is
    /// unconditionally a member, nothing else is.
    pub fn constant(tuples: &TupleSet, universe_size: usize) -> Self {
        let entries = tuples
            .iter()
            .map(|t| (t.clone(), BoolTerm::top()))
            .collect();
        BoolMatrix {
            arity: tuples.arity(),
            universe_size,
            entries,
        }
    }

    /// A matrix for a relation bounded by `bound`: tuples in the lower
    /// bound are fixed members, tuples in `upper \ lower` each get a fresh
    /// SAT variable, and everything outside `upper` is fixed non-members.
    pub fn from_bounds(bound: &RelBound, universe_size: usize, builder: &mut CnfBuilder) -> Self {
        let mut entries = HashMap::new();
        for t in bound.lower.iter() {
            entries.insert(t.clone(), BoolTerm::top());
        }
        for t in bound.upper.iter() {
            if !bound.lower.contains(t) {
                let var = builder.fresh_var();
                entries.insert(t.clone(), BoolTerm::lit(Literal::new(var, true)));
            }
        }
        BoolMatrix {
            arity: bound.arity(),
            universe_size,
            entries,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    pub fn get(&self, tuple: &[AtomId]) -> BoolTerm {
        self.entries.get(tuple).cloned().unwrap_or_else(BoolTerm::bottom)
    }

    pub fn set(&mut self, tuple: Tuple, term: BoolTerm) {
        debug_assert_eq!(tuple.len(), self.arity);
        if term == BoolTerm::bottom() {
            self.entries.remove(&tuple);
        } else {
            self.entries.insert(tuple, term);
        }
    }

    pub fn tuples(&self) -> impl Iterator<Item = (&Tuple, &BoolTerm)> {
        self.entries.iter()
    }

    fn pointwise(&self, other: &BoolMatrix, combine: impl Fn(BoolTerm, BoolTerm) -> BoolTerm) -> BoolMatrix {
        debug_assert_eq!(self.arity, other.arity);
        let mut keys: HashSet<&Tuple> = self.entries.keys().collect();
        keys.extend(other.entries.keys());
        let mut entries = HashMap::new();
        for key in keys {
            let term = combine(self.get(key), other.get(key));
            if term != BoolTerm::bottom() {
                entries.insert(key.clone(), term);
            }
        }
        BoolMatrix {
            arity: self.arity,
            universe_size: self.universe_size,
            entries,
        }
    }

    pub fn union(&self, other: &BoolMatrix) -> BoolMatrix {
        self.pointwise(other, |a, b| BoolTerm::disj([a, b]))
    }

    pub fn intersection(&self, other: &BoolMatrix) -> BoolMatrix {
        self.pointwise(other, |a, b| BoolTerm::conj([a, b]))
    }

    pub fn difference(&self, other: &BoolMatrix) -> BoolMatrix {
        self.pointwise(other, |a, b| BoolTerm::conj([a, BoolTerm::not(b)]))
    }

    /// For each `(u, v)` where `u` ends with atom `a` and `v` starts with
    /// `a`, the output membership at `u[..-1] ++ v[1..]` is the disjunction
    /// over all matching `a` of `M_l(u) ∧ M_r(v)`.
    pub fn join(&self, other: &BoolMatrix) -> BoolMatrix {
        assert!(self.arity >= 1 && other.arity >= 1, "join requires non-nullary arguments");
        let mut entries: HashMap<Tuple, BoolTerm> = HashMap::new();
        for (u, tu) in &self.entries {
            let pivot = u[u.len() - 1];
            for (v, tv) in &other.entries {
                if v[0] != pivot {
                    continue;
                }
                let mut combined = u[..u.len() - 1].to_vec();
                combined.extend_from_slice(&v[1..]);
                let term = BoolTerm::conj([tu.clone(), tv.clone()]);
                entries
                    .entry(combined)
                    .and_modify(|existing| *existing = BoolTerm::disj([existing.clone(), term.clone()]))
                    .or_insert(term);
            }
        }
        entries.retain(|_, t| *t != BoolTerm::bottom());
        BoolMatrix {
            arity: self.arity + other.arity - 2,
            universe_size: self.universe_size,
            entries,
        }
    }

    pub fn product(&self, other: &BoolMatrix) -> BoolMatrix {
        let mut entries = HashMap::new();
        for (u, tu) in &self.entries {
            for (v, tv) in &other.entries {
                let mut combined = u.clone();
                combined.extend_from_slice(v);
                entries.insert(combined, BoolTerm::conj([tu.clone(), tv.clone()]));
            }
        }
        BoolMatrix {
            arity: self.arity + other.arity,
            universe_size: self.universe_size,
            entries,
        }
    }

    pub fn transpose(&self) -> BoolMatrix {
        assert_eq!(self.arity, 2, "transpose is only defined on binary relations");
        let entries = self
            .entries
            .iter()
            .map(|(t, term)| (vec![t[1], t[0]], term.clone()))
            .collect();
        BoolMatrix {
            arity: 2,
            universe_size: self.universe_size,
            entries,
        }
    }

    /// `domain <: self`: restricts a binary relation to pairs whose first
    /// atom is a (possible) member of the unary `domain` matrix.
    pub fn domain_restrict(&self, domain: &BoolMatrix) -> BoolMatrix {
        assert_eq!(self.arity, 2);
        assert_eq!(domain.arity, 1);
        let mut entries = HashMap::new();
        for (t, term) in &self.entries {
            let restricted = BoolTerm::conj([domain.get(&[t[0]]), term.clone()]);
            if restricted != BoolTerm::bottom() {
                entries.insert(t.clone(), restricted);
            }
        }
        BoolMatrix {
            arity: 2,
            universe_size: self.universe_size,
            entries,
        }
    }

    /// `self :> range`, symmetric to [`BoolMatrix::domain_restrict`] on the
    /// second coordinate.
    pub fn range_restrict(&self, range: &BoolMatrix) -> BoolMatrix {
        assert_eq!(self.arity, 2);
        assert_eq!(range.arity, 1);
        let mut entries = HashMap::new();
        for (t, term) in &self.entries {
            let restricted = BoolTerm::conj([range.get(&[t[1]]), term.clone()]);
            if restricted != BoolTerm::bottom() {
                entries.insert(t.clone(), restricted);
            }
        }
        BoolMatrix {
            arity: 2,
            universe_size: self.universe_size,
            entries,
        }
    }

    fn domain_membership(&self, a: AtomId) -> BoolTerm {
        let terms: Vec<BoolTerm> = self
            .entries
            .iter()
            .filter(|(t, _)| t[0] == a)
            .map(|(_, term)| term.clone())
            .collect();
        BoolTerm::disj(terms)
    }

    /// `self ++ other`: `(a,b) ↦ M_other(a,b) ∨ (M_self(a,b) ∧ ¬∃b'. M_other(a,b'))`.
    pub fn override_with(&self, other: &BoolMatrix) -> BoolMatrix {
        assert_eq!(self.arity, 2);
        assert_eq!(other.arity, 2);
        let mut keys: HashSet<&Tuple> = self.entries.keys().collect();
        keys.extend(other.entries.keys());
        let mut entries = HashMap::new();
        for key in keys {
            let overridden = other.get(key);
            let kept = BoolTerm::conj([self.get(key), BoolTerm::not(other.domain_membership(key[0]))]);
            let term = BoolTerm::disj([overridden, kept]);
            if term != BoolTerm::bottom() {
                entries.insert(key.clone(), term);
            }
        }
        BoolMatrix {
            arity: 2,
            universe_size: self.universe_size,
            entries,
        }
    }

    /// Transitive closure of a binary relation by repeated squaring, capped
    /// at `⌈log₂ n⌉` doublings as the iterated join on a universe of `n`
    /// atoms is guaranteed to reach its fixed point by then.
    pub fn transitive_closure(&self) -> BoolMatrix {
        assert_eq!(self.arity, 2);
        let cap = iteration_cap(self.universe_size);
        let mut acc = self.clone();
        for _ in 0..cap {
            let squared = acc.join(&acc);
            let next = acc.union(&squared);
            if next.entries == acc.entries {
                break;
            }
            acc = next;
        }
        acc
    }

    pub fn reflexive_transitive_closure(&self, universe: &Universe) -> BoolMatrix {
        let identity = BoolMatrix::constant(&universe.identity(), self.universe_size);
        self.transitive_closure().union(&identity)
    }
}

fn iteration_cap(universe_size: usize) -> u32 {
    if universe_size <= 1 {
        1
    } else {
        (universe_size as f64).log2().ceil() as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sat::config::Config;
    use alloy_sat::context::Context;

    fn builder() -> CnfBuilder {
        CnfBuilder::new(Context::from_config(Config::default()))
    }

    #[test]
    fn constant_matrix_has_exactly_its_tuples_as_members() {
        let tuples = TupleSet::from_iter(1, vec![vec![0], vec![2]].into_iter());
        let m = BoolMatrix::constant(&tuples, 4);
        assert_eq!(m.get(&[0]), BoolTerm::top());
        assert_eq!(m.get(&[1]), BoolTerm::bottom());
    }

    #[test]
    fn join_combines_matching_pivots() {
        let a = TupleSet::from_iter(2, vec![vec![0, 1]].into_iter());
        let b = TupleSet::from_iter(2, vec![vec![1, 2]].into_iter());
        let ma = BoolMatrix::constant(&a, 3);
        let mb = BoolMatrix::constant(&b, 3);
        let joined = ma.join(&mb);
        assert_eq!(joined.get(&[0, 2]), BoolTerm::top());
        assert_eq!(joined.get(&[0, 1]), BoolTerm::bottom());
    }

    #[test]
    fn from_bounds_fixes_lower_and_frees_upper_minus_lower() {
        let mut builder = builder();
        let lower = TupleSet::from_iter(1, vec![vec![0]].into_iter());
        let upper = TupleSet::from_iter(1, vec![vec![0], vec![1]].into_iter());
        let bound = RelBound::ranged(lower, upper);
        let m = BoolMatrix::from_bounds(&bound, 2, &mut builder);
        assert_eq!(m.get(&[0]), BoolTerm::top());
        assert!(matches!(m.get(&[1]), BoolTerm::Lit(_)));
    }

    #[test]
    fn transitive_closure_matches_tuple_set_semantics() {
        let edges = TupleSet::from_iter(2, vec![vec![0, 1], vec![1, 2]].into_iter());
        let m = BoolMatrix::constant(&edges, 3);
        let closure = m.transitive_closure();
        assert_eq!(closure.get(&[0, 2]), BoolTerm::top());
        assert_eq!(closure.get(&[2, 0]), BoolTerm::bottom());
    }
}
