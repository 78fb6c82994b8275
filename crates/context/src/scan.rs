// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Token scanning
//!
//! Backward scan from the cursor to the nearest anchor keyword, plus the
//! [`Reading`] of the tokens between the anchor and the cursor. Used when the
//! parsed clauses cannot place the cursor and for positions the clause spans
//! do not distinguish (join predicates, OUTPUT targets, EXEC arguments).

use crate::anchor::{Anchor, Reading};
use crate::positional::{argument_position, named_arguments};
use crate::tokens::{CursorTokens, chain_end, chain_start, concat};
use sqlctx_ir::{ClauseKind, Punct, QualifiedName, Token, TokenKind};

/// Nearest anchor in `tokens[floor..end]`, with its index
///
/// Parenthesised groups are skipped, except that an open `(` after an INSERT
/// target starts a column list. Reaching the start of the buffer, or a
/// statement terminator, anchors the cursor at a statement start.
pub fn anchor_before(tokens: &[&Token], floor: usize, end: usize) -> Option<(Anchor, usize)> {
    let end = end.min(tokens.len());
    let mut depth = 0usize;
    for i in (floor..end).rev() {
        let tok = tokens[i];
        if tok.is_terminator() {
            return Some((Anchor::StatementStart, i));
        }
        match tok.kind {
            TokenKind::Punct(Punct::RParen) => depth += 1,
            TokenKind::Punct(Punct::LParen) if depth > 0 => depth -= 1,
            TokenKind::Punct(Punct::LParen) => {
                if opens_column_list(tokens, floor, i) {
                    return Some((Anchor::Clause(ClauseKind::InsertColumns), i));
                }
            }
            TokenKind::Keyword if depth == 0 => {
                if let Some(anchor) = Anchor::from_keyword(tokens, i) {
                    return Some((anchor, i));
                }
            }
            _ => {}
        }
    }
    (floor == 0).then_some((Anchor::StatementStart, floor))
}

/// Whether the `(` at `tokens[paren]` opens the column list of an INSERT
fn opens_column_list(tokens: &[&Token], floor: usize, paren: usize) -> bool {
    let Some(prev) = paren.checked_sub(1).filter(|p| *p >= floor) else {
        return false;
    };
    if tokens[prev].is_keyword("INSERT") {
        return true;
    }
    if !tokens[prev].is_identifier() {
        return false;
    }
    chain_start(tokens, prev)
        .checked_sub(1)
        .filter(|p| *p >= floor)
        .is_some_and(|p| tokens[p].is_any_keyword(&["INTO", "INSERT"]))
}

/// Describe the reference between the anchor and the cursor
///
/// Tokens below `floor` belong to an enclosing statement and are ignored.
pub fn read_cursor(cursor: &CursorTokens<'_>, floor: usize) -> Reading {
    let mut reading = Reading {
        prefix: cursor.prefix().to_string(),
        trigger: cursor.trigger(),
        qualifier: cursor.qualifier().cloned(),
        left_side_column: cursor.left_side_column(),
        ..Default::default()
    };
    let Some(prev) = cursor.previous().filter(|p| *p >= floor) else {
        return reading;
    };
    let tok = cursor.tokens()[prev];
    if tok.is_keyword("AS") {
        reading.alias_position = true;
        reading.completed = prev
            .checked_sub(1)
            .filter(|p| *p >= floor)
            .and_then(|p| cursor.name_ending_at(p))
            .map(|(_, name)| name);
    } else if tok.is_identifier() {
        if let Some((start, name)) = cursor.name_ending_at(prev) {
            reading.follows_reference = true;
            // `Employees e █`: report the object, not its alias
            let object = start
                .checked_sub(1)
                .filter(|p| *p >= floor)
                .and_then(|p| cursor.name_ending_at(p))
                .map(|(_, object)| object);
            reading.completed = Some(object.unwrap_or(name));
        }
    } else if tok.is_punct(Punct::RParen) {
        reading.follows_reference = true;
    }
    reading
}

/// An EXEC call: the routine and the arguments typed so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub routine: QualifiedName,
    pub argument_position: usize,
    pub used_parameters: Vec<String>,
    /// The cursor is on the value side of `@name =`
    pub in_value: bool,
}

/// Read the EXEC call anchored at `tokens[exec]`
///
/// Returns `None` while the routine name itself is being typed.
pub fn read_exec(cursor: &CursorTokens<'_>, exec: usize) -> Option<ExecCall> {
    let tokens = cursor.tokens();
    let mut first = exec + 1;
    // EXEC @rc = dbo.proc ...
    if tokens.get(first).is_some_and(|t| t.text.starts_with('@'))
        && tokens.get(first + 1).is_some_and(|t| t.kind == TokenKind::Operator && t.text == "=")
    {
        first += 2;
    }
    if first >= cursor.reference_start() || !tokens[first].is_identifier() {
        return None;
    }
    let last = chain_end(tokens, first);
    if last >= cursor.reference_start() {
        return None;
    }
    let routine = QualifiedName::parse(&concat(&tokens[first..=last]))?;
    let args = &tokens[last + 1..cursor.reference_start()];
    let in_value = cursor
        .previous_token()
        .is_some_and(|t| t.kind == TokenKind::Operator && t.text == "=");
    Some(ExecCall {
        routine,
        argument_position: argument_position(args),
        used_parameters: named_arguments(args),
        in_value,
    })
}
