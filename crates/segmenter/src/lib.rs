// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlctx segmenter
//!
//! Splits a SQL script into executable chunks:
//!
//! 1. comments are removed, keeping every newline
//! 2. the clean text is split into batches on `GO` lines
//! 3. each batch is split around `USE <database>` directives
//!
//! Each chunk records the database in effect and the absolute line its first
//! non-whitespace character sits on. The segmenter never fails: unterminated
//! strings, brackets and comments consume the rest of the input.
//!
//! ## Usage
//!
//! ```rust
//! use sqlctx_segmenter::parse;
//!
//! let chunks = parse("USE [Sales]; SELECT 1", None);
//! assert_eq!(chunks.len(), 2);
//! assert!(chunks[0].has_use_directive);
//! assert_eq!(chunks[1].sql, "SELECT 1");
//! assert_eq!(chunks[1].database.as_deref(), Some("Sales"));
//! ```

pub mod batch;
pub mod comments;
pub mod directive;

pub use batch::{Batch, split_by_batch_separator};
pub use comments::{CommentStats, ScanState, remove_comments};
pub use directive::{parse_use_directives, parse_use_name};

use directive::{count_newlines, parse_batch};
use sqlctx_ir::ExecutionChunk;
use tracing::debug;

/// Segment `text` into execution chunks
///
/// `ambient_database` is in effect until the first `USE`.
pub fn parse(text: &str, ambient_database: Option<&str>) -> Vec<ExecutionChunk> {
    let (clean, stats) = remove_comments(text);
    let batches = split_by_batch_separator(&clean);
    debug!(
        line_comments = stats.line_comments,
        block_comments = stats.block_comments,
        batches = batches.len(),
        "segmenting script"
    );

    let mut database = ambient_database.map(str::to_string);
    let mut chunks = Vec::new();
    for (index, batch) in batches.iter().enumerate() {
        chunks.extend(parse_batch(&batch.sql, index as u32 + 1, batch.start_line, &mut database));
    }
    chunks
}

/// Database in effect on `line`, going by the chunks that start on or before it
///
/// Resolution is per line: a `USE` applies to the whole line it starts on.
pub fn database_at(chunks: &[ExecutionChunk], line: u32) -> Option<&str> {
    chunks
        .iter()
        .rev()
        .find(|c| c.start_line <= line)
        .and_then(|c| c.database.as_deref())
}

/// Lay chunks back out on their start lines
///
/// `USE` chunks occupy no text. Lines that only held comments, separators or
/// directives come back blank; trailing blank lines after the last chunk are
/// not reproduced.
pub fn reconstruct(chunks: &[ExecutionChunk]) -> String {
    let mut out = String::new();
    let mut line = 1u32;
    for chunk in chunks.iter().filter(|c| !c.has_use_directive) {
        while line < chunk.start_line {
            out.push('\n');
            line += 1;
        }
        out.push_str(&chunk.sql);
        line += count_newlines(&chunk.sql);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_carries_across_batches() {
        let chunks = parse("USE Hr\nGO\nSELECT 1\nGO\nUSE Sales\nSELECT 2", Some("master"));
        let summary: Vec<(u32, Option<&str>, bool)> = chunks
            .iter()
            .map(|c| (c.batch_number, c.database.as_deref(), c.has_use_directive))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, Some("Hr"), true),
                (2, Some("Hr"), false),
                (3, Some("Sales"), true),
                (3, Some("Sales"), false),
            ]
        );
        assert_eq!(chunks[1].start_line, 3);
        assert_eq!(chunks[3].start_line, 6);
    }

    #[test]
    fn test_ambient_database_until_first_use() {
        let chunks = parse("SELECT 1;\nUSE Sales;\nSELECT 2", Some("master"));
        assert_eq!(chunks[0].database.as_deref(), Some("master"));
        assert_eq!(chunks[2].database.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_comment_lines_keep_numbering() {
        let text = "/* header\n   block */\n-- note\nSELECT *\nFROM t";
        let chunks = parse(text, None);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 4);
        assert_eq!(reconstruct(&chunks).lines().count(), text.lines().count());
    }

    #[test]
    fn test_use_in_comment_is_ignored() {
        let chunks = parse("-- USE Sales\nSELECT 1", None);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].database, None);
    }

    #[test]
    fn test_database_at_follows_use() {
        let chunks = parse("SELECT 1;\n\nUSE Sales;\nSELECT *\nFROM Orders", Some("Hr"));
        assert_eq!(database_at(&chunks, 1), Some("Hr"));
        assert_eq!(database_at(&chunks, 2), Some("Hr"));
        assert_eq!(database_at(&chunks, 3), Some("Sales"));
        assert_eq!(database_at(&chunks, 5), Some("Sales"));
        assert_eq!(database_at(&[], 1), None);
    }

    #[test]
    fn test_nested_comment_round_trips_to_nothing() {
        assert!(parse("/* /* x */ */", None).is_empty());
    }
}
