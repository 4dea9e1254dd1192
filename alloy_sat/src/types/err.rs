/*!
Error types used in the library.

Most of these are unlikely to occur on well-formed input --- they are
programmer errors (an invariant broken inside the solver), not user errors.
A handful are used internally to route control flow (a BCP conflict is
expected and is how the solver learns).

Following the library's own conventions, these are plain enums with manual
`From` impls rather than `thiserror`-derived types: the errors here never
reach a user, only a caller of the library, and the library has no need of
`Display` formatting for them.
*/

use crate::db::ClauseKey;
use crate::structures::literal::Literal;

/// A union of the varied error kinds the solver can produce.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// An error during conflict analysis.
    Analysis(AnalysisError),

    /// An error in the clause database.
    ClauseDB(ClauseDBError),

    /// An error in the atom database.
    AtomDB(AtomDBError),

    /// An error related to parsing DIMACS input.
    Parse(ParseError),

    /// An error related to boolean constraint propagation.
    BCP(BCPError),

    /// A fundamental conflict has been observed: the formula is unsatisfiable
    /// at decision level zero.
    FundamentalConflict,

    /// The attempted action could not be completed given the valuation.
    ValuationConflict,

    /// An internal invariant was violated. Never expected on well-formed input.
    Internal(SolverInternalError),
}

/// An error during conflict analysis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnalysisError {
    /// Resolution somehow produced an empty clause.
    EmptyResolution,
    /// Resolution failed to terminate with an asserting (first-UIP) clause.
    NoAssertion,
}

impl From<AnalysisError> for ErrorKind {
    fn from(e: AnalysisError) -> Self {
        ErrorKind::Analysis(e)
    }
}

/// Errors in the clause database.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClauseDBError {
    /// All possible keys for some clause kind have been used.
    StorageExhausted,
    /// An empty clause was about to be stored.
    EmptyClause,
    /// A key did not resolve to a stored clause.
    Missing,
}

impl From<ClauseDBError> for ErrorKind {
    fn from(e: ClauseDBError) -> Self {
        ErrorKind::ClauseDB(e)
    }
}

/// Errors from the atom database.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AtomDBError {
    /// There are no more fresh atoms: the atom limit (`u32::MAX / 2`) has been hit.
    AtomsExhausted,
}

impl From<AtomDBError> for ErrorKind {
    fn from(e: AtomDBError) -> Self {
        ErrorKind::AtomDB(e)
    }
}

/// Errors during parsing of DIMACS input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The `p cnf V C` problem line was missing or malformed.
    ProblemSpecification,
    /// A specific line failed to parse.
    Line(usize),
}

impl From<ParseError> for ErrorKind {
    fn from(e: ParseError) -> Self {
        ErrorKind::Parse(e)
    }
}

/// Errors noted during boolean constraint propagation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BCPError {
    /// A conflict was found: expected, and the trigger for conflict analysis.
    Conflict(ClauseKey),
}

impl From<BCPError> for ErrorKind {
    fn from(e: BCPError) -> Self {
        ErrorKind::BCP(e)
    }
}

/// Programmer errors: invariant violations that should never occur on
/// well-formed input. Distinguished from the above so a caller can tell
/// "the formula is unsatisfiable" apart from "the solver is broken."
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SolverInternalError {
    /// A watched-literal invariant was violated.
    CorruptWatch,
    /// A literal was queued for a value that conflicts with its current one.
    SpecificValuationConflict(Literal),
}

impl From<SolverInternalError> for ErrorKind {
    fn from(e: SolverInternalError) -> Self {
        ErrorKind::Internal(e)
    }
}
