//! Source locations and ranges for diagnostics.

use std::cmp;

/// A point in the source text. Lines and columns count from zero; the
/// diagnostic printer renders lines 1-based for humans.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone)]
pub struct Position {
    #[allow(missing_docs)]
    pub line: u32,
    #[allow(missing_docs)]
    pub column: u32,
}

impl Position {
    /// The position at the given line and column.
    pub fn new(line: u32, column: u32) -> Position {
        Position { line, column }
    }

    /// The range running from `self` up to (not including) `end`. Equal
    /// endpoints give an empty range.
    ///
    /// # Panics
    ///
    /// Panics if `end` comes before `self`.
    pub fn to(self, end: Position) -> Span {
        assert!(self <= end, "span endpoints are out of order");
        Span { start: self, end }
    }
}

/// A contiguous stretch of source text, described by its two endpoints.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone)]
pub struct Span {
    #[allow(missing_docs)]
    pub start: Position,
    #[allow(missing_docs)]
    pub end: Position,
}

impl Span {
    /// A zero-width range sitting at one position. Useful for pointing at
    /// the end of the input, where there is no token to cover.
    pub fn empty_at(position: Position) -> Span {
        Span {
            start: position,
            end: position,
        }
    }

    /// The smallest range covering both `self` and `other`, including any
    /// gap between them.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: cmp::min(self.start, other.start),
            end: cmp::max(self.end, other.end),
        }
    }
}
