//! Tuples and tuple sets (C5): the set-theoretic layer bounds and instance
//! extraction both work in terms of, before anything becomes a boolean
//! matrix.

use std::collections::BTreeSet;

use crate::universe::AtomId;

pub type Tuple = Vec<AtomId>;

/// A set of same-arity tuples, kept in a `BTreeSet` so union/intersection/
/// difference are linear in the combined size rather than quadratic.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TupleSet {
    arity: usize,
    tuples: BTreeSet<Tuple>,
}

impl TupleSet {
    pub fn empty(arity: usize) -> Self {
        TupleSet {
            arity,
            tuples: BTreeSet::new(),
        }
    }

    pub fn from_iter(arity: usize, tuples: impl Iterator<Item = Tuple>) -> Self {
        let tuples: BTreeSet<Tuple> = tuples
            .inspect(|t| debug_assert_eq!(t.len(), arity, "tuple arity mismatch"))
            .collect();
        TupleSet { arity, tuples }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn contains(&self, tuple: &[AtomId]) -> bool {
        self.tuples.contains(tuple)
    }

    pub fn insert(&mut self, tuple: Tuple) {
        debug_assert_eq!(tuple.len(), self.arity);
        self.tuples.insert(tuple);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    fn same_arity(&self, other: &TupleSet) {
        debug_assert_eq!(self.arity, other.arity, "tuple set arity mismatch");
    }

    pub fn union(&self, other: &TupleSet) -> TupleSet {
        self.same_arity(other);
        TupleSet {
            arity: self.arity,
            tuples: self.tuples.union(&other.tuples).cloned().collect(),
        }
    }

    pub fn intersection(&self, other: &TupleSet) -> TupleSet {
        self.same_arity(other);
        TupleSet {
            arity: self.arity,
            tuples: self.tuples.intersection(&other.tuples).cloned().collect(),
        }
    }

    pub fn difference(&self, other: &TupleSet) -> TupleSet {
        self.same_arity(other);
        TupleSet {
            arity: self.arity,
            tuples: self.tuples.difference(&other.tuples).cloned().collect(),
        }
    }

    /// Arity `a+b-2` relational join: for every `u` in `self` and `v` in
    /// `other` where `u`'s last atom equals `v`'s first, the output contains
    /// `u[..-1] ++ v[1..]`.
    pub fn join(&self, other: &TupleSet) -> TupleSet {
        assert!(self.arity >= 1 && other.arity >= 1, "join requires non-nullary arguments");
        let out_arity = self.arity + other.arity - 2;
        let mut out = TupleSet::empty(out_arity);
        for u in &self.tuples {
            let pivot = u[u.len() - 1];
            for v in &other.tuples {
                if v[0] == pivot {
                    let mut combined = u[..u.len() - 1].to_vec();
                    combined.extend_from_slice(&v[1..]);
                    out.tuples.insert(combined);
                }
            }
        }
        out
    }

    /// Cartesian product: arity `a+b`.
    pub fn product(&self, other: &TupleSet) -> TupleSet {
        let mut out = TupleSet::empty(self.arity + other.arity);
        for u in &self.tuples {
            for v in &other.tuples {
                let mut combined = u.clone();
                combined.extend_from_slice(v);
                out.tuples.insert(combined);
            }
        }
        out
    }

    /// Swaps the two coordinates of a binary relation.
    pub fn transpose(&self) -> TupleSet {
        assert_eq!(self.arity, 2, "transpose is only defined on binary relations");
        TupleSet::from_iter(2, self.tuples.iter().map(|t| vec![t[1], t[0]]))
    }

    /// Restricts `self` (a binary relation) to pairs whose first atom is in
    /// `domain` (a unary relation): `domain <: self`.
    pub fn domain_restrict(&self, domain: &TupleSet) -> TupleSet {
        assert_eq!(self.arity, 2);
        assert_eq!(domain.arity, 1);
        TupleSet::from_iter(
            2,
            self.tuples
                .iter()
                .filter(|t| domain.contains(&[t[0]]))
                .cloned(),
        )
    }

    /// Restricts `self` (a binary relation) to pairs whose second atom is in
    /// `range` (a unary relation): `self :> range`.
    pub fn range_restrict(&self, range: &TupleSet) -> TupleSet {
        assert_eq!(self.arity, 2);
        assert_eq!(range.arity, 1);
        TupleSet::from_iter(
            2,
            self.tuples
                .iter()
                .filter(|t| range.contains(&[t[1]]))
                .cloned(),
        )
    }

    /// `self ++ other`: pairs from `other` win outright; a pair from `self`
    /// survives only if `other` has no pair at all sharing its first atom.
    pub fn override_with(&self, other: &TupleSet) -> TupleSet {
        assert_eq!(self.arity, 2);
        assert_eq!(other.arity, 2);
        let overridden_domain: BTreeSet<AtomId> = other.tuples.iter().map(|t| t[0]).collect();
        let mut out = other.tuples.clone();
        for t in &self.tuples {
            if !overridden_domain.contains(&t[0]) {
                out.insert(t.clone());
            }
        }
        TupleSet { arity: 2, tuples: out }
    }

    /// Transitive closure of a binary relation: repeated squaring up to
    /// `ceil(log2(universe_size))` rounds, per the doubling bound spec.md
    /// gives for this operator.
    pub fn transitive_closure(&self, universe_size: usize) -> TupleSet {
        assert_eq!(self.arity, 2);
        let cap = iteration_cap(universe_size);
        let mut acc = self.clone();
        for _ in 0..cap {
            let squared = acc.join(&acc);
            let next = acc.union(&squared);
            if next == acc {
                break;
            }
            acc = next;
        }
        acc
    }

    pub fn reflexive_transitive_closure(&self, universe: &crate::universe::Universe) -> TupleSet {
        self.transitive_closure(universe.len()).union(&universe.identity())
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
    use crate::universe::Universe;

    fn t(atoms: &[AtomId]) -> Tuple {
        atoms.to_vec()
    }

    #[test]
    fn join_matches_pivot_on_inner_atom() {
        let left = TupleSet::from_iter(2, vec![t(&[0, 1]), t(&[1, 2])].into_iter());
        let right = TupleSet::from_iter(2, vec![t(&[1, 3]), t(&[2, 4])].into_iter());
        let joined = left.join(&right);
        assert_eq!(joined.arity(), 2);
        assert!(joined.contains(&[0, 3]));
        assert!(joined.contains(&[1, 4]));
        assert_eq!(joined.len(), 2);
    }

    #[test]
    fn transpose_swaps_coordinates() {
        let r = TupleSet::from_iter(2, vec![t(&[0, 1])].into_iter());
        assert!(r.transpose().contains(&[1, 0]));
    }

    #[test]
    fn transitive_closure_reaches_fixed_point() {
        let universe = Universe::synthetic("A", 4);
        let chain = TupleSet::from_iter(2, vec![t(&[0, 1]), t(&[1, 2]), t(&[2, 3])].into_iter());
        let closure = chain.transitive_closure(universe.len());
        assert!(closure.contains(&[0, 3]));
        assert!(!closure.contains(&[3, 0]));
    }

    #[test]
    fn override_prefers_the_right_hand_domain() {
        let base = TupleSet::from_iter(2, vec![t(&[0, 1]), t(&[2, 3])].into_iter());
        let patch = TupleSet::from_iter(2, vec![t(&[0, 9])].into_iter());
        let result = base.override_with(&patch);
        assert!(result.contains(&[0, 9]));
        assert!(!result.contains(&[0, 1]));
        assert!(result.contains(&[2, 3]));
    }
}
