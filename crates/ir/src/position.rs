// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Source positions
//!
//! Lines and columns are 1-indexed. Columns count characters, not bytes, so a
//! cursor at `col` sits immediately before the `col`-th character of its line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cursor or token boundary in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed character column
    pub col: u32,
}

impl Position {
    /// Create a new position
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Start of a buffer
    pub const fn start() -> Self {
        Self { line: 1, col: 1 }
    }

    /// Convert a byte offset into a position by walking `text`
    ///
    /// Offsets past the end clamp to the position after the last character.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut pos = Self::start();
        for (idx, ch) in text.char_indices() {
            if idx >= offset {
                break;
            }
            pos = pos.advance(ch);
        }
        pos
    }

    /// Convert this position into a byte offset into `text`
    ///
    /// Positions past the end of a line clamp to the line's end; positions
    /// past the last line clamp to the end of the text.
    pub fn to_offset(self, text: &str) -> usize {
        let mut pos = Self::start();
        for (idx, ch) in text.char_indices() {
            if pos >= self || (pos.line == self.line && ch == '\n') {
                return idx;
            }
            pos = pos.advance(ch);
        }
        text.len()
    }

    /// Position after consuming `ch`
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self::new(self.line + 1, 1)
        } else {
            Self::new(self.line, self.col + 1)
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Half-open range `[start, end)` between two positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Create a new span
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Whether a cursor at `pos` touches this span
    ///
    /// The end is inclusive for cursors: a cursor placed right after the last
    /// character of a clause is still typing into that clause.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether `pos` lies strictly inside the span
    pub fn strictly_contains(&self, pos: Position) -> bool {
        self.start < pos && pos < self.end
    }

    /// Smallest span covering both
    pub fn cover(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_round_trip_multiline() {
        let text = "SELECT a\nFROM t\nWHERE b = 1";
        let pos = Position::from_offset(text, 9);
        assert_eq!(pos, Position::new(2, 1));
        assert_eq!(pos.to_offset(text), 9);
    }

    #[test]
    fn test_to_offset_clamps_past_line_end() {
        let text = "ab\ncd";
        assert_eq!(Position::new(1, 40).to_offset(text), 2);
        assert_eq!(Position::new(9, 1).to_offset(text), text.len());
    }

    #[test]
    fn test_span_contains_end_for_cursor() {
        let span = Span::new(Position::new(1, 1), Position::new(1, 7));
        assert!(span.contains(Position::new(1, 7)));
        assert!(!span.strictly_contains(Position::new(1, 7)));
        assert!(!span.contains(Position::new(1, 8)));
    }

    #[test]
    fn test_columns_count_characters() {
        let text = "é.x";
        assert_eq!(Position::from_offset(text, 2), Position::new(1, 2));
    }
}
