//! The databases a solve reads from and writes to: clauses, atoms, and the trail.

pub mod atom;
pub mod clause;
pub mod trail;

/// A key identifying a stored clause, distinguishing original clauses (part
/// of the input formula) from clauses the solver has learned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ClauseKey {
    Original(u32),
    Learned(u32),
}

impl std::fmt::Display for ClauseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClauseKey::Original(i) => write!(f, "O{i}"),
            ClauseKey::Learned(i) => write!(f, "L{i}"),
        }
    }
}
