/*!
The atom database: the current valuation, saved phases, and the VSIDS activity heap.
*/

use crate::config::AtomDBConfig;
use crate::generic::index_heap::IndexHeap;
use crate::structures::valuation::Valuation;
use crate::structures::Atom;

/// Bookkeeping for every atom the context knows about.
pub struct AtomDB {
    valuation: Valuation,
    /// VSIDS activity, keyed by atom; atoms currently assigned are off the heap.
    activity: IndexHeap<f64>,
    /// The last polarity an atom held, consulted for phase-saving decisions.
    saved_phase: Vec<bool>,
    /// The decision level an atom was assigned at, valid only while assigned.
    level: Vec<u32>,
    /// The amount by which a bumped atom's activity increases; grows every
    /// conflict by `1.0 / variable_decay` and is rescaled if it gets too large.
    bump: f64,
    config: AtomDBConfig,
    fresh_atom_limit: Atom,
}

impl AtomDB {
    pub fn new(config: AtomDBConfig) -> Self {
        AtomDB {
            valuation: Valuation::default(),
            activity: IndexHeap::default(),
            saved_phase: vec![false],
            level: vec![0],
            bump: 1.0,
            config,
            fresh_atom_limit: 0,
        }
    }

    /// Registers a fresh atom, giving it zero activity and putting it on the
    /// decision heap. Returns the new atom.
    pub fn fresh_atom(&mut self) -> Atom {
        self.fresh_atom_limit += 1;
        let atom = self.fresh_atom_limit;
        self.valuation.ensure_capacity(atom);
        self.activity.add(atom as usize, 0.0);
        self.activity.activate(atom as usize);
        if self.saved_phase.len() <= atom as usize {
            self.saved_phase.resize(atom as usize + 1, false);
            self.level.resize(atom as usize + 1, 0);
        }
        atom
    }

    pub fn atom_count(&self) -> Atom {
        self.fresh_atom_limit
    }

    pub fn valuation(&self) -> &Valuation {
        &self.valuation
    }

    pub fn value_of(&self, atom: Atom) -> Option<bool> {
        self.valuation.value_of(atom)
    }

    /// Assigns `atom` to `value` at `level`, removing it from the decision
    /// heap and saving its phase.
    pub fn assign(&mut self, atom: Atom, value: bool, level: u32) {
        self.valuation.set(atom, value);
        self.activity.remove(atom as usize);
        self.saved_phase[atom as usize] = value;
        self.level[atom as usize] = level;
    }

    /// The decision level `atom` was assigned at. Meaningless (stale) once
    /// the atom is unassigned again.
    pub fn level_of(&self, atom: Atom) -> u32 {
        self.level.get(atom as usize).copied().unwrap_or(0)
    }

    /// Unassigns `atom`, returning it to the decision heap so it may be
    /// chosen again. The saved phase is left untouched (phase saving).
    pub fn unassign(&mut self, atom: Atom) {
        self.valuation.clear(atom);
        self.activity.activate(atom as usize);
    }

    pub fn saved_phase(&self, atom: Atom) -> bool {
        self.saved_phase.get(atom as usize).copied().unwrap_or(false)
    }

    /// Picks the unassigned atom of greatest VSIDS activity, if any remain.
    pub fn peek_decision_atom(&self) -> Option<Atom> {
        self.activity.peek_max().map(|a| a as Atom)
    }

    /// Bumps `atom`'s activity by the current bump amount, rescaling the
    /// whole heap if the bump amount has grown too large.
    pub fn bump_activity(&mut self, atom: Atom) {
        self.activity
            .apply_to_value_at_value_index(atom as usize, |v| v + self.bump);
        self.activity.heapify_if_active(atom as usize);

        if *self.activity.value_at(atom as usize) > 1e100 {
            self.activity.apply_to_all(|v| v * 1e-100);
            self.bump *= 1e-100;
        }
    }

    /// Decays activity by increasing the bump amount applied to future bumps
    /// (the standard "increase the increment" trick, equivalent to scaling
    /// every existing activity down).
    pub fn decay_activity(&mut self) {
        self.bump /= self.config.variable_decay;
    }

    pub fn phase_saving(&self) -> bool {
        self.config.phase_saving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_atoms_are_contiguous_from_one() {
        let mut db = AtomDB::new(AtomDBConfig::default());
        let a = db.fresh_atom();
        let b = db.fresh_atom();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(db.atom_count(), 2);
    }

    #[test]
    fn assign_removes_from_decision_heap() {
        let mut db = AtomDB::new(AtomDBConfig::default());
        let a = db.fresh_atom();
        db.bump_activity(a);
        assert_eq!(db.peek_decision_atom(), Some(a));
        db.assign(a, true, 1);
        assert_eq!(db.peek_decision_atom(), None);
        assert_eq!(db.value_of(a), Some(true));
        assert_eq!(db.level_of(a), 1);
    }

    #[test]
    fn unassign_returns_atom_to_heap_and_keeps_phase() {
        let mut db = AtomDB::new(AtomDBConfig::default());
        let a = db.fresh_atom();
        db.assign(a, true, 1);
        db.unassign(a);
        assert_eq!(db.value_of(a), None);
        assert_eq!(db.peek_decision_atom(), Some(a));
        assert!(db.saved_phase(a));
    }

    #[test]
    fn higher_activity_atom_is_chosen_first() {
        let mut db = AtomDB::new(AtomDBConfig::default());
        let a = db.fresh_atom();
        let b = db.fresh_atom();
        db.bump_activity(a);
        db.bump_activity(b);
        db.bump_activity(b);
        assert_eq!(db.peek_decision_atom(), Some(b));
    }
}
