/*!
The main CDCL loop: propagate, decide, analyse conflicts, backjump, learn,
restart, and reduce, until the formula is shown satisfiable, unsatisfiable,
or the caller gives up waiting.

Roughly:

```text
loop {
    propagate()
    match conflict {
        None => if no decision remains { Satisfiable } else { make_decision() }
        Some(key) => {
            if at level 0 { Unsatisfiable }
            analyse_conflict(key) -> learned clause + backtrack level
            backjump(level); assert the learned clause's unit literal
            decay activities, maybe restart, maybe reduce the clause database
        }
    }
}
```
*/

use std::time::Instant;

use crate::context::{Context, ContextState};
use crate::db::trail::Reason;
use crate::reports::Report;
use crate::types::err::{BCPError, ErrorKind};

impl Context {
    /// Determines the satisfiability of the context's clauses.
    pub fn solve(&mut self) -> Result<Report, ErrorKind> {
        self.solve_given()
    }

    /// Runs the CDCL loop. Idempotent once a verdict has been reached: a
    /// second call simply returns the stored report.
    pub fn solve_given(&mut self) -> Result<Report, ErrorKind> {
        match self.state {
            ContextState::Satisfiable | ContextState::Unsatisfiable(_) => {
                return Ok(self.report());
            }

            ContextState::Solving => {}

            ContextState::Configuration => {
                match self.propagate_queue() {
                    Ok(()) => {}
                    Err(ErrorKind::FundamentalConflict) => return Ok(self.report()),
                    Err(e) => return Err(e),
                }
                self.state = ContextState::Solving;
            }
        }

        let start = Instant::now();
        let time_limit = self.config.time_limit.value;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(Report::Unknown);
            }
            if !time_limit.is_zero() && start.elapsed() > time_limit {
                return Ok(Report::Unknown);
            }

            match self.propagate() {
                Ok(()) => {
                    if self.make_decision() {
                        continue;
                    }
                    self.state = ContextState::Satisfiable;
                    return Ok(Report::Satisfiable);
                }

                Err(BCPError::Conflict(key)) => {
                    if self.trail.current_level() == 0 {
                        self.note_conflict(key);
                        return Ok(Report::Unsatisfiable);
                    }

                    self.counters.conflicts += 1;
                    self.counters.total_conflicts_since_reduction += 1;

                    let analysis = self.analyse_conflict(key)?;

                    self.atom_db.decay_activity();
                    self.clause_db.decay_clause_activity();
                    for lit in &analysis.learned {
                        self.atom_db.bump_activity(lit.atom());
                    }

                    self.backjump(analysis.backtrack_level);

                    let asserted = analysis.learned[0];
                    let learned_key = self.clause_db.add_learned(analysis.learned, analysis.lbd);
                    self.enqueue(asserted, Reason::Propagation(learned_key));

                    self.maybe_restart();
                    self.maybe_reduce();
                    self.maybe_report_progress();
                }
            }
        }
    }

    /// Triggers a restart (backjump to level 0) once the number of
    /// conflicts since the last restart reaches the current Luby-scheduled
    /// bound, then draws the next term from the sequence.
    fn maybe_restart(&mut self) {
        if !self.config.restart.value {
            return;
        }
        self.counters.fresh_conflicts_since_restart += 1;
        let bound = self.luby_term * self.config.luby_base.value as u64;
        if self.counters.fresh_conflicts_since_restart >= bound {
            self.backjump(0);
            self.counters.restarts += 1;
            self.counters.fresh_conflicts_since_restart = 0;
            self.luby_term = self.luby.next().unwrap_or(self.luby_term as u32) as u64;
        }
    }

    /// Reduces the learned-clause database once enough conflicts have
    /// accumulated since the last reduction. Clauses currently serving as a
    /// propagation reason are protected from deletion.
    fn maybe_reduce(&mut self) {
        if self.counters.total_conflicts_since_reduction < self.clause_db.config().max_learned as u64
        {
            return;
        }
        let protected = self.trail.reasons_in_use();
        let deleted = self.clause_db.reduce(&protected);
        self.counters.deleted_clauses += deleted as u64;
        self.counters.total_conflicts_since_reduction = 0;
    }

    fn maybe_report_progress(&self) {
        let Some(callback) = &self.progress_callback else {
            return;
        };
        let interval = self.config.progress_interval.value.max(1);
        if self.counters.conflicts % interval == 0 {
            callback(&self.statistics());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::structures::literal::Literal;

    #[test]
    fn solves_a_satisfiable_formula() {
        let mut ctx = Context::from_config(Config::default());
        let p = ctx.fresh_atom();
        let q = ctx.fresh_atom();

        ctx.add_clause(vec![Literal::new(p, false), Literal::new(q, true)])
            .unwrap();
        ctx.add_clause(vec![Literal::new(p, true), Literal::new(q, false)])
            .unwrap();

        assert_eq!(ctx.solve().unwrap(), Report::Satisfiable);
        assert_eq!(ctx.atom_db.value_of(p), ctx.atom_db.value_of(q));
    }

    #[test]
    fn detects_an_unsatisfiable_formula() {
        let mut ctx = Context::from_config(Config::default());
        let p = ctx.fresh_atom();

        ctx.add_clause(vec![Literal::new(p, true)]).unwrap();
        ctx.add_clause(vec![Literal::new(p, false)]).unwrap();

        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }

    #[test]
    fn pigeonhole_two_into_one_is_unsatisfiable() {
        // p1 v p2 (pigeon goes somewhere), -p1 v -p2 (not both in the one hole)
        // together with forcing both pigeons into consideration is trivially
        // solvable as stated; use the classic tiny unsat instance instead:
        // (p) and (-p v q) and (-q) is unsat.
        let mut ctx = Context::from_config(Config::default());
        let p = ctx.fresh_atom();
        let q = ctx.fresh_atom();

        ctx.add_clause(vec![Literal::new(p, true)]).unwrap();
        ctx.add_clause(vec![Literal::new(p, false), Literal::new(q, true)])
            .unwrap();
        ctx.add_clause(vec![Literal::new(q, false)]).unwrap();

        assert_eq!(ctx.solve().unwrap(), Report::Unsatisfiable);
    }
}
