//! Source position tracking for error reporting.
//!
//! A [`Pos`] is a 1-indexed line / 0-indexed column pair. A [`Span`] is a
//! contiguous region between two positions. Every token, expression, and
//! diagnostic in the Act toolchain carries a span so that error messages can
//! point at the exact place in source text where something went wrong.

use std::fmt;

/// A single point in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Pos {
    /// 1-indexed line number.
    pub line: u32,
    /// 0-indexed column, counted in bytes from the start of the line.
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// The position one column before this one, saturating at the start of
    /// the line. Used when a caller only has "the position after the last
    /// token" and needs a fallback for an EOF diagnostic.
    pub fn before(self) -> Self {
        Pos {
            line: self.line,
            col: self.col.saturating_sub(1),
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A contiguous region of source text, delimited by start (inclusive) and
/// end (exclusive) positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// A zero-width span at a single position, used for EOF diagnostics and
    /// synthesized nodes that have no real source location.
    pub fn point(pos: Pos) -> Self {
        Span { start: pos, end: pos }
    }

    /// The smallest span covering both `self` and `other`. Used when
    /// building compound expressions: the span of `a + b` is
    /// `a.span.merge(b.span)`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_display_is_line_colon_col() {
        assert_eq!(Pos::new(3, 7).to_string(), "3:7");
    }

    #[test]
    fn span_merge_takes_outer_bounds() {
        let a = Span::new(Pos::new(1, 0), Pos::new(1, 5));
        let b = Span::new(Pos::new(1, 3), Pos::new(2, 1));
        let merged = a.merge(b);
        assert_eq!(merged.start, Pos::new(1, 0));
        assert_eq!(merged.end, Pos::new(2, 1));
    }

    #[test]
    fn pos_before_saturates_at_line_start() {
        assert_eq!(Pos::new(1, 0).before(), Pos::new(1, 0));
        assert_eq!(Pos::new(1, 5).before(), Pos::new(1, 4));
    }
}
