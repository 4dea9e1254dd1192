//! The abstract elements of a solve: atoms, literals, clauses, and valuations.

pub mod clause;
pub mod literal;
pub mod valuation;

/// An atom is a positive integer naming a propositional variable.
///
/// Atoms are 1-indexed: atom `0` never denotes a variable, which leaves index
/// `0` of a valuation array free to mean "unused" rather than "atom zero."
pub type Atom = u32;
