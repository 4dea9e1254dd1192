/*!
First-UIP conflict analysis.

When [crate::procedures::bcp] reports a conflicting clause, the clause is
resolved backwards against the trail, one propagation at a time, until
exactly one literal assigned at the current decision level remains
unresolved: the first unique implication point (first UIP). The negation of
that literal becomes the asserting literal of a freshly learned clause, and
the clause's remaining literals (all from earlier decision levels) determine
where to backtrack to.

This mirrors the resolution buffer the specification this library implements
describes, simplified from the teacher library's dense per-atom cell array
down to a `HashSet` of atoms currently touched by the clause being built ---
learned clauses are typically a small fraction of the atom count, so a set is
the more direct fit here than an array sized to the whole problem.
*/

use std::collections::HashSet;

use crate::context::Context;
use crate::db::trail::Reason;
use crate::db::ClauseKey;
use crate::structures::literal::Literal;
use crate::structures::Atom;
use crate::types::err::{AnalysisError, ErrorKind};

/// The result of analysing a conflict.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// The learned clause, with the asserting (first-UIP) literal first.
    pub learned: Vec<Literal>,
    /// The decision level to backtrack to before asserting `learned[0]`.
    pub backtrack_level: u32,
    /// The literal-block distance of the learned clause, used to schedule
    /// clause database reduction.
    pub lbd: u32,
}

impl Context {
    /// Resolves the clause named by `conflict` against the trail, producing
    /// a first-UIP learned clause and the level to backtrack to.
    pub fn analyse_conflict(&mut self, conflict: ClauseKey) -> Result<Analysis, ErrorKind> {
        let current_level = self.trail.current_level();

        let mut seen: HashSet<Atom> = HashSet::new();
        let mut learned: Vec<Literal> = Vec::new();
        let mut current_level_count: usize = 0;

        self.merge_into_analysis(
            conflict,
            current_level,
            &mut seen,
            &mut learned,
            &mut current_level_count,
        )?;

        let mut trail_cursor = self.trail.len();
        let mut uip_literal;

        loop {
            loop {
                if trail_cursor == 0 {
                    return Err(AnalysisError::NoAssertion.into());
                }
                trail_cursor -= 1;
                let entry = self.trail.entries()[trail_cursor];
                if seen.contains(&entry.literal.atom()) {
                    uip_literal = entry.literal;
                    break;
                }
            }

            seen.remove(&uip_literal.atom());

            if current_level_count == 1 {
                current_level_count = 0;
                break;
            }
            current_level_count -= 1;

            let reason = self.trail.entries()[trail_cursor].reason;
            let key = match reason {
                Reason::Propagation(key) => key,
                Reason::Decision => return Err(AnalysisError::NoAssertion.into()),
            };

            self.merge_into_analysis(
                key,
                current_level,
                &mut seen,
                &mut learned,
                &mut current_level_count,
            )?;
        }

        learned.insert(0, uip_literal.negate());

        let backtrack_level = learned[1..]
            .iter()
            .map(|lit| self.atom_db.level_of(lit.atom()))
            .max()
            .unwrap_or(0);

        let lbd = self.literal_block_distance(&learned);

        Ok(Analysis {
            learned,
            backtrack_level,
            lbd,
        })
    }

    /// Merges `key`'s clause into the analysis in progress: every literal not
    /// already seen is either counted towards the current-level tally (if
    /// assigned at the conflict's decision level) or pushed directly into the
    /// learned clause (if from an earlier level). Level-zero literals are
    /// dropped, since they hold unconditionally and needn't be recorded.
    fn merge_into_analysis(
        &mut self,
        key: ClauseKey,
        current_level: u32,
        seen: &mut HashSet<Atom>,
        learned: &mut Vec<Literal>,
        current_level_count: &mut usize,
    ) -> Result<(), ErrorKind> {
        self.clause_db.bump_learned_activity(key);
        let clause = self.clause_db.get(&key)?;
        for &lit in clause.literals() {
            if !seen.insert(lit.atom()) {
                continue;
            }
            let level = self.atom_db.level_of(lit.atom());
            if level == current_level {
                *current_level_count += 1;
            } else if level > 0 {
                learned.push(lit);
            }
        }
        Ok(())
    }

    fn literal_block_distance(&self, literals: &[Literal]) -> u32 {
        let mut levels: Vec<u32> = literals
            .iter()
            .map(|lit| self.atom_db.level_of(lit.atom()))
            .collect();
        levels.sort_unstable();
        levels.dedup();
        levels.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::trail::Reason;
    use crate::structures::literal::Literal;

    /// Builds a tiny conflict by hand: two decisions at levels 1 and 2, a
    /// propagation implied by each, and a binary clause that conflicts with
    /// both propagated literals. First-UIP analysis should learn a clause
    /// asserting at level 2 and backtracking to level 1.
    #[test]
    fn learns_asserting_clause_and_backtrack_level() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom();
        let b = ctx.fresh_atom();
        let c = ctx.fresh_atom();
        let d = ctx.fresh_atom();

        // a -> c (clause: -a c), b -> d (clause: -b d), conflict: -c -d
        let reason_c = ctx
            .add_clause(vec![Literal::new(a, false), Literal::new(c, true)])
            .unwrap();
        let reason_d = ctx
            .add_clause(vec![Literal::new(b, false), Literal::new(d, true)])
            .unwrap();
        let conflict_clause = ctx
            .add_clause(vec![Literal::new(c, false), Literal::new(d, false)])
            .unwrap();

        ctx.enqueue(Literal::new(a, true), Reason::Decision);
        ctx.enqueue(Literal::new(c, true), Reason::Propagation(reason_c));
        ctx.enqueue(Literal::new(b, true), Reason::Decision);
        ctx.enqueue(Literal::new(d, true), Reason::Propagation(reason_d));

        let analysis = ctx.analyse_conflict(conflict_clause).unwrap();

        // The asserting literal should be the negation of the most recent
        // decision's consequence, i.e. -d, since b and d sit at the current
        // (highest) level and c's level is lower. The clause also carries
        // -c (c's level), so backtracking lands one level below the
        // conflict, at c's level.
        assert_eq!(analysis.learned[0], Literal::new(d, false));
        assert_eq!(analysis.learned.len(), 2);
        assert_eq!(analysis.backtrack_level, 1);
    }
}
