// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `USE <database>` detection
//!
//! A `USE` at the start of a statement becomes a zero-length chunk that
//! switches the database for every following chunk, across batches, until the
//! next `USE`. A `USE` without a readable name is ordinary text.

use crate::comments::LiteralTracker;
use sqlctx_ir::ExecutionChunk;

/// Chunks of a single comment-free batch starting on line 1
pub fn parse_use_directives(text: &str) -> Vec<ExecutionChunk> {
    let mut database = None;
    parse_batch(text, 1, 1, &mut database)
}

/// Chunks of one batch; `database` carries the database in effect in and out
pub(crate) fn parse_batch(
    sql: &str,
    batch_number: u32,
    first_line: u32,
    database: &mut Option<String>,
) -> Vec<ExecutionChunk> {
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let mut tracker = LiteralTracker::default();
    let mut chunks = Vec::new();
    let mut seg_start = 0usize;
    let mut k = 0;

    while k < chars.len() {
        let (offset, ch) = chars[k];
        let outside = tracker.step(ch, chars.get(k + 1).map(|(_, c)| *c));
        if outside
            && !tracker.inside()
            && matches!(ch, 'u' | 'U')
            && is_word_start(sql, offset)
            && at_statement_start(sql, seg_start, offset)
        {
            if let Some((name, end)) = parse_use_name(sql, offset) {
                push_sql(&mut chunks, sql, seg_start..offset, database, batch_number, first_line);
                let line = first_line + count_newlines(&sql[..offset]);
                chunks.push(ExecutionChunk::use_database(name.clone(), batch_number, line));
                *database = Some(name);
                seg_start = end;
                while k < chars.len() && chars[k].0 < end {
                    k += 1;
                }
                continue;
            }
        }
        k += 1;
    }
    push_sql(&mut chunks, sql, seg_start..sql.len(), database, batch_number, first_line);
    chunks
}

/// Read the database name after a `USE` at `offset`
///
/// Returns the unescaped name and the offset just past it, including one
/// trailing `;` if present.
pub fn parse_use_name(sql: &str, offset: usize) -> Option<(String, usize)> {
    let rest = &sql[offset..];
    if !rest.get(..3)?.eq_ignore_ascii_case("use") {
        return None;
    }
    let after = &rest[3..];
    let first = after.chars().next()?;
    if !(first.is_whitespace() || matches!(first, '[' | '"' | '`')) {
        return None;
    }

    let body = after.trim_start();
    let body_start = offset + 3 + (after.len() - body.len());
    let (name, consumed) = match body.chars().next()? {
        open @ ('[' | '"' | '`') => {
            let close = if open == '[' { ']' } else { open };
            read_delimited(&body[1..], close).map(|(name, len)| (name, len + 1))?
        }
        c if c.is_alphanumeric() || c == '_' => {
            let len = body
                .char_indices()
                .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '#' | '@')))
                .map_or(body.len(), |(i, _)| i);
            (body[..len].to_string(), len)
        }
        _ => return None,
    };
    if name.is_empty() {
        return None;
    }

    let mut end = body_start + consumed;
    match sql[end..].chars().next() {
        None => {}
        Some(c) if c.is_whitespace() || c == ';' => {}
        Some(_) => return None,
    }
    let trailing = &sql[end..];
    let spaces = trailing.len() - trailing.trim_start_matches([' ', '\t']).len();
    if trailing[spaces..].starts_with(';') {
        end += spaces + 1;
    }
    Some((name, end))
}

/// Contents of a delimited name with doubled closers unescaped, and the
/// byte length consumed including the closer
fn read_delimited(s: &str, close: char) -> Option<(String, usize)> {
    let mut name = String::new();
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\n' {
            return None;
        }
        if c == close {
            if chars.peek().is_some_and(|(_, n)| *n == close) {
                chars.next();
                name.push(close);
                continue;
            }
            return Some((name, i + c.len_utf8()));
        }
        name.push(c);
    }
    None
}

fn is_word_start(sql: &str, offset: usize) -> bool {
    sql[..offset]
        .chars()
        .next_back()
        .is_none_or(|c| !(c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '.' | '$')))
}

/// Whether `offset` begins a statement: first in its segment, after `;`, or first on its line
fn at_statement_start(sql: &str, seg_start: usize, offset: usize) -> bool {
    let before = sql[seg_start..offset].trim_end();
    if before.is_empty() || before.ends_with(';') {
        return true;
    }
    let line_start = sql[..offset].rfind('\n').map_or(0, |i| i + 1);
    sql[line_start..offset].trim().is_empty()
}

fn push_sql(
    chunks: &mut Vec<ExecutionChunk>,
    sql: &str,
    range: std::ops::Range<usize>,
    database: &Option<String>,
    batch_number: u32,
    first_line: u32,
) {
    let segment = &sql[range.clone()];
    let body = segment.trim_start();
    if body.trim().is_empty() {
        return;
    }
    let lead = segment.len() - body.len();
    let line = first_line + count_newlines(&sql[..range.start + lead]);
    chunks.push(ExecutionChunk::statement(body, database.clone(), batch_number, line));
}

pub(crate) fn count_newlines(s: &str) -> u32 {
    s.bytes().filter(|b| *b == b'\n').count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_bracketed_with_semicolon() {
        let chunks = parse_use_directives("USE [Sales]; SELECT 1");
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].has_use_directive);
        assert_eq!(chunks[0].sql, "");
        assert_eq!(chunks[0].database.as_deref(), Some("Sales"));
        assert_eq!(chunks[1].sql, "SELECT 1");
        assert_eq!(chunks[1].database.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_use_name_forms() {
        assert_eq!(parse_use_name("USE Sales", 0), Some(("Sales".to_string(), 9)));
        assert_eq!(parse_use_name("use [My]]Db] ;", 0), Some(("My]Db".to_string(), 14)));
        assert_eq!(parse_use_name("USE \"Hr\"", 0).map(|(n, _)| n), Some("Hr".to_string()));
        assert_eq!(parse_use_name("USE ", 0), None);
        assert_eq!(parse_use_name("USER_NAME()", 0), None);
        assert_eq!(parse_use_name("USE [Open", 0), None);
    }

    #[test]
    fn test_use_inside_string_or_mid_statement_is_text() {
        let chunks = parse_use_directives("SELECT 'USE Sales' AS x, 1 AS use_count");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].database, None);
    }

    #[test]
    fn test_chunk_lines() {
        let chunks = parse_use_directives("\n  USE Hr\n\nSELECT *\nFROM Employees\nUSE Sales\nSELECT 2");
        let lines: Vec<u32> = chunks.iter().map(|c| c.start_line).collect();
        assert_eq!(lines, vec![2, 4, 6, 7]);
        assert_eq!(chunks[1].database.as_deref(), Some("Hr"));
        assert_eq!(chunks[3].database.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_use_without_name_is_ordinary_text() {
        let chunks = parse_use_directives("USE ");
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].has_use_directive);
        assert_eq!(chunks[0].sql, "USE ");
    }
}
