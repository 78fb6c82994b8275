// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use proptest::prelude::*;
use sqlctx_segmenter::{parse, reconstruct, remove_comments};

const PIECES: &[&str] = &[
    "SELECT 1",
    "GO",
    "go 2",
    "",
    "-- note /* not a block",
    "/* a */ SELECT 2",
    "/* multi\nline /* nested */ */",
    "USE [Sales];",
    "use Hr",
    "SELECT 'it''s', [a]]b] FROM t",
    "FROM Employees e",
];

proptest! {
    #[test]
    fn segmenting_never_panics(text in "(\\PC|\\n){0,200}") {
        let chunks = parse(&text, None);
        let lines = text.split('\n').count() as u32;
        for chunk in &chunks {
            prop_assert!(chunk.start_line >= 1);
            prop_assert!(chunk.end_line() <= lines);
        }
    }

    #[test]
    fn reconstruction_keeps_line_count(
        picks in proptest::collection::vec(0..PIECES.len(), 0..12),
    ) {
        let mut lines: Vec<&str> = picks.iter().map(|i| PIECES[*i]).collect();
        lines.push("SELECT 9");
        let text = lines.join("\n");

        let chunks = parse(&text, None);
        prop_assert_eq!(reconstruct(&chunks).split('\n').count(), text.split('\n').count());
    }

    #[test]
    fn comment_free_text_is_unchanged(text in "[A-Za-z0-9 ,.()=\n]{0,120}") {
        let (clean, stats) = remove_comments(&text);
        prop_assert_eq!(clean, text);
        prop_assert_eq!(stats.removed_chars, 0);
    }
}
