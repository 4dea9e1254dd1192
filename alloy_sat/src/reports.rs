//! The externally-visible outcomes and statistics of a solve.

/// The verdict of a solve.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Report {
    /// A satisfying valuation was found.
    Satisfiable,
    /// No valuation exists.
    Unsatisfiable,
    /// The solve was interrupted (cancellation or time limit) before a
    /// verdict was reached.
    Unknown,
}

/// Statistics accumulated during a solve, matching the external statistics
/// surface: decisions, propagations, conflicts, learned clauses, restarts,
/// deleted clauses, and wall-clock solve time.
#[derive(Clone, Copy, Debug, Default)]
pub struct Statistics {
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub learned_clauses: u64,
    pub restarts: u64,
    pub deleted_clauses: u64,
    pub solve_time_ms: u64,
}
