/*!
Decision making: choosing the next atom to branch on.

The atom of greatest VSIDS activity among those still unassigned is chosen
(see [crate::db::atom::AtomDB::peek_decision_atom]); its polarity comes from
the atom's saved phase when phase saving is enabled, and otherwise from the
context's random source.
*/

use rand::Rng;

use crate::context::Context;
use crate::db::trail::Reason;
use crate::structures::literal::Literal;

impl Context {
    /// Makes a single decision, enqueuing it on the trail at a new decision
    /// level. Returns `false` if every atom is already assigned (the formula
    /// is satisfiable on the current valuation).
    pub fn make_decision(&mut self) -> bool {
        let Some(atom) = self.atom_db.peek_decision_atom() else {
            return false;
        };

        let polarity = if self.atom_db.phase_saving() {
            self.atom_db.saved_phase(atom)
        } else {
            self.rng.gen_bool(0.5)
        };

        self.enqueue(Literal::new(atom, polarity), Reason::Decision);
        self.counters.decisions += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn decision_assigns_highest_activity_atom() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom();
        let b = ctx.fresh_atom();
        ctx.atom_db.bump_activity(b);

        assert!(ctx.make_decision());
        // Phase saving defaults to on and no atom has been assigned before,
        // so the saved (default) phase of false is what gets asserted.
        assert_eq!(ctx.atom_db.value_of(b), Some(false));
        assert!(ctx.atom_db.value_of(a).is_none());
        assert_eq!(ctx.trail.current_level(), 1);
    }

    #[test]
    fn no_decision_possible_once_every_atom_is_assigned() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom();
        ctx.atom_db.assign(a, true, 1);
        assert!(!ctx.make_decision());
    }
}
