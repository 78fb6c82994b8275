// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Cursor marker helpers

use sqlctx_ir::Position;

/// Marker placed in fixture SQL where the cursor sits
pub const CURSOR: char = '█';

/// Remove the cursor marker and return the text with the marker's position
///
/// # Panics
///
/// Panics when the text has no marker.
pub fn split_cursor(input: &str) -> (String, Position) {
    let offset = input
        .find(CURSOR)
        .unwrap_or_else(|| panic!("no cursor marker in {:?}", input));
    let position = Position::from_offset(input, offset);
    (input.replacen(CURSOR, "", 1), position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cursor_single_line() {
        let (sql, pos) = split_cursor("SELECT █ FROM t");
        assert_eq!(sql, "SELECT  FROM t");
        assert_eq!(pos, Position::new(1, 8));
    }

    #[test]
    fn test_split_cursor_multi_line() {
        let (sql, pos) = split_cursor("SELECT *\nFROM █");
        assert_eq!(sql, "SELECT *\nFROM ");
        assert_eq!(pos, Position::new(2, 6));
    }

    #[test]
    #[should_panic(expected = "no cursor marker")]
    fn test_split_cursor_requires_marker() {
        split_cursor("SELECT 1");
    }
}
