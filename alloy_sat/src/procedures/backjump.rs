/*!
Non-chronological backtracking: undoing the trail down to a target decision
level after a clause has been learned from a conflict.
*/

use crate::context::Context;

impl Context {
    /// Undoes every assignment made above `level`, returning the affected
    /// atoms to the decision heap with their phase preserved.
    pub fn backjump(&mut self, level: u32) {
        let removed = self.trail.backtrack_to(level);
        for assignment in removed {
            self.atom_db.unassign(assignment.literal.atom());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::trail::Reason;
    use crate::structures::literal::Literal;

    #[test]
    fn backjump_unassigns_and_reopens_decision_heap() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom();
        let b = ctx.fresh_atom();

        ctx.enqueue(Literal::new(a, true), Reason::Decision);
        ctx.enqueue(Literal::new(b, true), Reason::Decision);
        assert_eq!(ctx.trail.current_level(), 2);

        ctx.backjump(0);

        assert_eq!(ctx.trail.current_level(), 0);
        assert!(ctx.atom_db.value_of(a).is_none());
        assert!(ctx.atom_db.value_of(b).is_none());
        assert!(ctx.atom_db.peek_decision_atom().is_some());
    }
}
