// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Batch splitting on `GO` lines

use crate::comments::LiteralTracker;

/// Text between two batch separators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub sql: String,
    /// Absolute 1-indexed line of the batch's first line
    pub start_line: u32,
    /// Count given to the `GO` that closed this batch (`GO 3`), 1 otherwise
    pub repeat: u32,
}

/// Split comment-free text into batches on lines holding only `GO [count]`
///
/// A `GO` line inside a multi-line string or bracketed identifier is text.
/// Separator lines belong to no batch.
pub fn split_by_batch_separator(text: &str) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut tracker = LiteralTracker::default();
    let mut start = 0usize;
    let mut start_line = 1u32;
    let mut offset = 0usize;
    let mut line_no = 1u32;

    for line in text.split_inclusive('\n') {
        let separator = if tracker.inside() { None } else { go_count(line) };
        match separator {
            Some(repeat) => {
                batches.push(Batch {
                    sql: text[start..offset].to_string(),
                    start_line,
                    repeat,
                });
                start = offset + line.len();
                start_line = line_no + 1;
            }
            None => {
                let chars: Vec<char> = line.chars().collect();
                for (i, ch) in chars.iter().enumerate() {
                    tracker.step(*ch, chars.get(i + 1).copied());
                }
            }
        }
        offset += line.len();
        line_no += 1;
    }

    if start < text.len() || batches.is_empty() {
        batches.push(Batch {
            sql: text[start..].to_string(),
            start_line,
            repeat: 1,
        });
    }
    batches
}

/// Repeat count if `line` is a batch separator
fn go_count(line: &str) -> Option<u32> {
    let mut words = line.split_whitespace();
    if !words.next()?.eq_ignore_ascii_case("GO") {
        return None;
    }
    match (words.next(), words.next()) {
        (None, _) => Some(1),
        (Some(n), None) => n.parse().ok().filter(|n| *n > 0),
        _ => None,
    }
}
