//! Source positions and spans (C1): the coordinate system every later phase
//! attaches diagnostics and AST nodes to.

use std::fmt;

/// A single point in a source file: 1-based line, 1-based column, 0-based
/// byte offset. All three are kept together so a caller can pick whichever
/// is convenient (offset for slicing, line/column for display).
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    pub const fn start() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An ordered pair of positions delimiting a range of source text.
/// `end` is exclusive. A span never spans backwards: `start <= end`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start.offset <= end.offset, "span ends before it starts");
        Span { start, end }
    }

    /// A zero-length span at a single position, used for the end-of-file
    /// token and for diagnostics with no natural extent.
    pub fn point(at: Position) -> Self {
        Span { start: at, end: at }
    }

    pub fn len(&self) -> u32 {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest span covering both `self` and `other`. Order-preserving:
    /// the result's start is the earlier of the two starts and its end the
    /// later of the two ends, regardless of argument order.
    pub fn merge(&self, other: &Span) -> Span {
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };
        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, column: u32, offset: u32) -> Position {
        Position { line, column, offset }
    }

    #[test]
    fn merge_is_order_preserving() {
        let a = Span::new(pos(1, 1, 0), pos(1, 4, 3));
        let b = Span::new(pos(2, 1, 10), pos(2, 5, 14));
        assert_eq!(a.merge(&b), b.merge(&a));
        assert_eq!(a.merge(&b).start, a.start);
        assert_eq!(a.merge(&b).end, b.end);
    }

    #[test]
    fn point_span_is_empty() {
        let p = pos(3, 1, 20);
        assert!(Span::point(p).is_empty());
    }
}
