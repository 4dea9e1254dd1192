//! Literals: an atom paired with a polarity.

use std::fmt;

use super::Atom;

/// A literal: an atom together with the polarity it is asserted under.
///
/// Encoded internally as `atom * 2 + (negated as u32)`, per the convention
/// that negation is a bit flip on the low bit of the packed code --- this is
/// the representation the watcher lists and the clause database key off of.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Literal {
    code: u32,
}

impl Literal {
    /// Builds a literal from an atom and a polarity (`true` = positive).
    pub fn new(atom: Atom, polarity: bool) -> Self {
        Literal {
            code: (atom << 1) | (!polarity as u32),
        }
    }

    /// The atom underlying this literal.
    pub fn atom(&self) -> Atom {
        self.code >> 1
    }

    /// The polarity of this literal (`true` = positive, unnegated).
    pub fn polarity(&self) -> bool {
        self.code & 1 == 0
    }

    /// The negation of this literal.
    pub fn negate(&self) -> Self {
        Literal {
            code: self.code ^ 1,
        }
    }

    /// The packed `var * 2 + negated` code, used to index watcher lists.
    pub fn code(&self) -> usize {
        self.code as usize
    }

    /// Builds a literal back from a packed code.
    pub fn from_code(code: usize) -> Self {
        Literal { code: code as u32 }
    }

    /// The signed-integer (DIMACS) form of this literal.
    pub fn as_dimacs(&self) -> i64 {
        let atom = self.atom() as i64;
        if self.polarity() {
            atom
        } else {
            -atom
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.polarity() {
            write!(f, "-")?;
        }
        write!(f, "{}", self.atom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_code() {
        let lit = Literal::new(79, true);
        assert!(lit.polarity());
        assert_eq!(lit.atom(), 79);
        assert_eq!(lit.negate().polarity(), false);
        assert_eq!(Literal::from_code(lit.code()), lit);
    }

    #[test]
    fn negation_flips_low_bit() {
        let lit = Literal::new(3, false);
        assert_eq!(lit.code() ^ 1, lit.negate().code());
        assert_eq!(lit.negate().negate(), lit);
    }

    #[test]
    fn dimacs_sign_matches_polarity() {
        assert_eq!(Literal::new(5, true).as_dimacs(), 5);
        assert_eq!(Literal::new(5, false).as_dimacs(), -5);
    }
}
