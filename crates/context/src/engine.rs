// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Context engine
//!
//! Classifies a cursor position in a [`ParsedBuffer`]. Detection is
//! clause-first with token and text fallbacks:
//!
//! 1. Statement boundaries: nothing before the cursor, or a `;`/`GO` right
//!    before it, is a statement start.
//! 2. Positions the clause spans do not distinguish are found by a backward
//!    token scan and take priority: join/merge predicates (`ON`), `OUTPUT`
//!    and `OUTPUT ... INTO`, `EXEC` arguments and the INSERT branch of a MERGE.
//! 3. The clause containing the last token before the cursor decides the
//!    context.
//! 4. A cursor trailing a FROM/JOIN clause is re-read from the raw text.
//! 5. Without a statement model the token scan decides, then the text
//!    classifier; anything left over is a general keyword position.
//!
//! Detection never fails: malformed input degrades to `Keyword`/`General`.

use crate::anchor::{Anchor, Reading, resolve};
use crate::positional::{list_names, row_position};
use crate::result::{ContextHints, ContextMode, ContextResult, ContextType, DetectedContext};
use crate::scan::{anchor_before, read_cursor, read_exec};
use crate::text::classify_text;
use crate::tokens::{CursorTokens, is_in_string_or_comment};
use sqlctx_grammar::{ParsedBuffer, StatementContext};
use sqlctx_ir::{ClauseKind, Position, Punct, StatementChunk, StatementType};
use tracing::{debug, trace};

/// Cursor classifier over one parsed buffer generation
#[derive(Debug, Clone, Copy)]
pub struct ContextEngine<'a> {
    buffer: &'a ParsedBuffer,
}

impl<'a> ContextEngine<'a> {
    pub fn new(buffer: &'a ParsedBuffer) -> Self {
        Self { buffer }
    }

    /// Classification plus whether completion should be offered
    ///
    /// Inside string literals and comments the result is `Unknown` and
    /// `should_complete` is false.
    pub fn detect_full(&self, pos: Position) -> DetectedContext {
        if is_in_string_or_comment(self.buffer.tokens(), pos) {
            trace!(line = pos.line, col = pos.col, "cursor inside string or comment");
            return DetectedContext {
                result: ContextResult::default(),
                should_complete: false,
            };
        }
        let result = self.detect(pos);
        let should_complete = result.kind != ContextType::Unknown;
        DetectedContext {
            result,
            should_complete,
        }
    }

    /// Classify the cursor at `pos`
    pub fn detect(&self, pos: Position) -> ContextResult {
        let cursor = CursorTokens::new(self.buffer.tokens(), pos);
        let result = self.classify(&cursor);
        debug!(
            line = pos.line,
            col = pos.col,
            kind = result.kind.as_str(),
            mode = result.mode.as_str(),
            prefix = %result.prefix,
            "detected context"
        );
        result
    }

    fn classify(&self, cursor: &CursorTokens<'_>) -> ContextResult {
        let Some(prev) = cursor.previous_token() else {
            return statement_start(cursor);
        };
        if prev.is_terminator() {
            return statement_start(cursor);
        }

        let anchor_pos = cursor.anchor_pos();
        let ctx = self.buffer.context_at(anchor_pos);
        let Some(chunk) = ctx.chunk() else {
            return self.classify_without_statement(cursor);
        };
        let tokens = cursor.tokens();
        let floor = tokens.partition_point(|t| t.start < chunk.span.start);

        if chunk.statement_type == StatementType::Merge && prev.is_any_keyword(&["THEN", "MATCHED"]) {
            return ContextResult::new(ContextType::Keyword, ContextMode::General).with_prefix(cursor.prefix(), cursor.trigger());
        }

        let scanned = anchor_before(tokens, floor, cursor.reference_start());
        if let Some((anchor, at)) = scanned {
            if is_special(anchor, chunk) {
                trace!(?anchor, "special anchor");
                return self.dispatch(anchor, at, cursor, &ctx, floor);
            }
        }

        if let Some(kind) = ParsedBuffer::clause_at(chunk, anchor_pos) {
            let at = chunk
                .clauses
                .iter()
                .rev()
                .find(|c| c.kind == kind && c.span.contains(anchor_pos))
                .and_then(|c| cursor.index_at(c.span.start))
                .unwrap_or(floor);
            trace!(clause = kind.as_str(), "clause dispatch");
            return self.dispatch(Anchor::Clause(kind), at, cursor, &ctx, floor);
        }

        if let Some(clause) = ParsedBuffer::trailing_clause(chunk, anchor_pos) {
            let near = cursor.pos().line <= clause.span.end.line + 1;
            if near && matches!(clause.kind, ClauseKind::From | ClauseKind::Join) {
                if let Some(result) = self.classify_statement_text(chunk, cursor.pos()) {
                    trace!("trailing table clause re-read from text");
                    return result;
                }
            }
        }

        if let Some((anchor, at)) = scanned {
            return self.dispatch(anchor, at, cursor, &ctx, floor);
        }

        self.classify_statement_text(chunk, cursor.pos())
            .unwrap_or_else(|| general(cursor))
    }

    /// Token scan over the whole buffer, then the text classifier
    fn classify_without_statement(&self, cursor: &CursorTokens<'_>) -> ContextResult {
        if let Some((anchor, at)) = anchor_before(cursor.tokens(), 0, cursor.reference_start()) {
            trace!(?anchor, "token scan without statement");
            return self.dispatch(anchor, at, cursor, &StatementContext::default(), 0);
        }
        let text = self.buffer.text();
        let end = cursor.pos().to_offset(text);
        classify_text(&text[..end]).unwrap_or_else(|| general(cursor))
    }

    fn classify_statement_text(&self, chunk: &StatementChunk, pos: Position) -> Option<ContextResult> {
        let text = self.buffer.text();
        let start = chunk.span.start.to_offset(text);
        let end = pos.to_offset(text);
        (start <= end).then(|| classify_text(&text[start..end])).flatten()
    }

    /// Resolve `anchor` at token index `at`, gathering statement-specific hints
    fn dispatch(
        &self,
        anchor: Anchor,
        at: usize,
        cursor: &CursorTokens<'_>,
        ctx: &StatementContext<'_>,
        floor: usize,
    ) -> ContextResult {
        let tokens = cursor.tokens();
        let chunk = ctx.chunk();
        let in_merge = chunk.is_some_and(|c| c.statement_type == StatementType::Merge);
        let target = chunk.and_then(dml_target);
        let mut reading = read_cursor(cursor, floor);

        match anchor {
            Anchor::Clause(ClauseKind::Values) => {
                let row = tokens.get(at + 1..cursor.reference_start()).unwrap_or_default();
                let Some(position) = row_position(row) else {
                    return general(cursor);
                };
                reading.extra = ContextHints {
                    value_position: Some(position),
                    insert_table: target.clone(),
                    insert_columns: chunk.map(|c| self.insert_columns(c, cursor)).unwrap_or_default(),
                    ..Default::default()
                };
                let mut result = resolve(anchor, reading);
                if in_merge {
                    result.mode = ContextMode::MergeValues;
                }
                result
            }
            Anchor::Clause(ClauseKind::InsertColumns) => {
                let list = tokens.get(at..cursor.reference_start()).unwrap_or_default();
                let Some(position) = row_position(list) else {
                    return general(cursor);
                };
                reading.extra = ContextHints {
                    filter_table: target,
                    value_position: Some(position),
                    ..Default::default()
                };
                let mut result = resolve(anchor, reading);
                if in_merge {
                    result.mode = ContextMode::MergeInsert;
                }
                result
            }
            Anchor::Clause(ClauseKind::Set) => {
                let assigning = reading.left_side_column.is_none()
                    && cursor
                        .previous_token()
                        .is_some_and(|t| t.is_keyword("SET") || t.is_punct(Punct::Comma));
                if assigning {
                    reading.extra.filter_table = target;
                }
                resolve(anchor, reading)
            }
            Anchor::Clause(ClauseKind::Output) => {
                reading.extra.filter_table = target;
                resolve(anchor, reading)
            }
            Anchor::Clause(ClauseKind::Exec) => detect_exec(cursor, at, reading),
            _ => resolve(anchor, reading),
        }
    }

    /// Column list of the INSERT (or MERGE INSERT) the cursor belongs to
    fn insert_columns(&self, chunk: &StatementChunk, cursor: &CursorTokens<'_>) -> Vec<String> {
        chunk
            .clause_range(ClauseKind::InsertColumns)
            .and_then(|span| cursor.index_at(span.start))
            .map(|open| list_names(&cursor.tokens()[open..]))
            .unwrap_or_default()
    }
}

/// Positions the clause spans cannot tell apart from their enclosing clause
fn is_special(anchor: Anchor, chunk: &StatementChunk) -> bool {
    match anchor {
        Anchor::On | Anchor::OutputInto => true,
        Anchor::Clause(ClauseKind::Output | ClauseKind::Exec) => true,
        Anchor::Clause(ClauseKind::InsertColumns | ClauseKind::Values) => {
            chunk.statement_type == StatementType::Merge
        }
        _ => false,
    }
}

/// Exposed name of the table an INSERT, UPDATE, DELETE or MERGE writes to
fn dml_target(chunk: &StatementChunk) -> Option<String> {
    if !matches!(
        chunk.statement_type,
        StatementType::Insert | StatementType::Update | StatementType::Delete | StatementType::Merge
    ) {
        return None;
    }
    let first = chunk.tables.first()?;
    // UPDATE e SET ... FROM Employees e
    let target = first.name().and_then(|n| chunk.lookup_alias(n)).unwrap_or(first);
    target.exposed_name().map(str::to_string)
}

fn detect_exec(cursor: &CursorTokens<'_>, exec: usize, mut reading: Reading) -> ContextResult {
    let Some(call) = read_exec(cursor, exec) else {
        reading.follows_reference = false;
        reading.completed = None;
        return resolve(Anchor::Clause(ClauseKind::Exec), reading);
    };
    reading.follows_reference = true;
    reading.completed = Some(call.routine);
    reading.extra = ContextHints {
        value_position: Some(call.argument_position),
        used_parameters: call.used_parameters,
        ..Default::default()
    };
    let mut result = resolve(Anchor::Clause(ClauseKind::Exec), reading);
    if call.in_value {
        result.kind = ContextType::Unknown;
    }
    result
}

fn statement_start(cursor: &CursorTokens<'_>) -> ContextResult {
    ContextResult::statement_start().with_prefix(cursor.prefix(), cursor.trigger())
}

fn general(cursor: &CursorTokens<'_>) -> ContextResult {
    ContextResult::new(ContextType::Keyword, ContextMode::General).with_prefix(cursor.prefix(), cursor.trigger())
}
