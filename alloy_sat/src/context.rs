/*!
The context: the structure a solve is built around.

Ties together the clause database, the atom database, the trail, and the
solving heuristics (VSIDS decay, Luby restarts) behind a small state
machine. A [Context] is built once via [Context::from_config] and then
driven by repeated calls to [crate::procedures::solve::solve] (or the
[Context::solve] convenience wrapper).
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::db::atom::AtomDB;
use crate::db::clause::ClauseDB;
use crate::db::trail::Trail;
use crate::db::ClauseKey;
use crate::generic::luby::Luby;
use crate::reports::{Report, Statistics};
use crate::structures::literal::Literal;
use crate::structures::Atom;
use crate::types::err::ErrorKind;

/// The phase of a context's lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContextState {
    /// Clauses may still be added; no propagation has happened yet.
    Configuration,
    /// A solve is in progress (or has been interrupted mid-solve).
    Solving,
    /// A solve completed and found the formula satisfiable.
    Satisfiable,
    /// A solve completed and found the formula unsatisfiable, with the key
    /// of the clause (or the literal) the final conflict was recorded against.
    Unsatisfiable(ClauseKey),
}

/// Statistics accumulated during a solve (see [Statistics] for the externally
/// reported form).
#[derive(Default)]
pub struct Counters {
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub restarts: u64,
    pub deleted_clauses: u64,
    pub fresh_conflicts_since_restart: u64,
    pub total_conflicts_since_reduction: u64,
}

/// A cooperative cancellation flag: writable from any thread, checked at the
/// top of the solve loop. See the crate's concurrency notes.
#[derive(Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The solving context.
pub struct Context {
    pub config: Config,
    pub clause_db: ClauseDB,
    pub atom_db: AtomDB,
    pub trail: Trail,
    pub counters: Counters,
    pub(crate) luby: Luby,
    /// The most recent term drawn from the Luby sequence, giving the
    /// current restart interval once scaled by `config.luby_base`.
    pub(crate) luby_term: u64,
    pub(crate) rng: StdRng,
    pub(crate) state: ContextState,
    pub(crate) cancel: CancelHandle,
    /// Invoked every `config.progress_interval` conflicts with a read-only
    /// snapshot of the statistics so far. Must not mutate solver state --
    /// enforced by the `&Statistics` signature, which owns no solver handle.
    pub(crate) progress_callback: Option<Box<dyn Fn(&Statistics)>>,
}

impl Context {
    pub fn from_config(config: Config) -> Self {
        let mut luby = Luby::default();
        let luby_term = luby.next().unwrap_or(1) as u64;
        Context {
            clause_db: ClauseDB::new(config.clause_db),
            atom_db: AtomDB::new(config.atom_db),
            trail: Trail::default(),
            counters: Counters::default(),
            luby,
            luby_term,
            rng: StdRng::seed_from_u64(0),
            state: ContextState::Configuration,
            cancel: CancelHandle::default(),
            progress_callback: None,
            config,
        }
    }

    /// A handle that may be used from another thread to request that an
    /// in-progress solve stop at the next opportunity.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn set_progress_callback(&mut self, callback: impl Fn(&Statistics) + 'static) {
        self.progress_callback = Some(Box::new(callback));
    }

    /// Allocates a fresh atom and returns it.
    pub fn fresh_atom(&mut self) -> Atom {
        self.atom_db.fresh_atom()
    }

    /// Adds a clause to the formula. Fails only if the clause is empty (an
    /// immediate, fundamental contradiction) -- callers should check for
    /// this ahead of time if they want to avoid the error path.
    pub fn add_clause(&mut self, literals: Vec<Literal>) -> Result<ClauseKey, ErrorKind> {
        for lit in &literals {
            self.atom_db_ensure(lit.atom());
        }
        self.clause_db.add_original(literals)
    }

    fn atom_db_ensure(&mut self, atom: Atom) {
        while self.atom_db.atom_count() < atom {
            self.atom_db.fresh_atom();
        }
    }

    /// Records that `key` conflicts with the current (empty, at level 0)
    /// valuation: the formula is unsatisfiable.
    pub fn note_conflict(&mut self, key: ClauseKey) {
        self.state = ContextState::Unsatisfiable(key);
    }

    /// The externally-visible verdict of the most recent solve.
    pub fn report(&self) -> Report {
        match self.state {
            ContextState::Satisfiable => Report::Satisfiable,
            ContextState::Unsatisfiable(_) => Report::Unsatisfiable,
            ContextState::Configuration | ContextState::Solving => Report::Unknown,
        }
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            decisions: self.counters.decisions,
            propagations: self.counters.propagations,
            conflicts: self.counters.conflicts,
            learned_clauses: self.clause_db.learned_count() as u64,
            restarts: self.counters.restarts,
            deleted_clauses: self.clause_db.deleted_count,
            solve_time_ms: 0,
        }
    }

    /// Clears any decisions made (but keeps learned clauses), returning the
    /// context to a state where further clauses may be asserted. Mirrors
    /// `refresh` in the teacher library.
    pub fn clear_decisions(&mut self) {
        let removed = self.trail.backtrack_to(0);
        for assignment in removed {
            self.atom_db.unassign(assignment.literal.atom());
        }
        if !matches!(self.state, ContextState::Unsatisfiable(_)) {
            self.state = ContextState::Configuration;
        }
    }
}
