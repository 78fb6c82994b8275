// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Text classifier
//!
//! Last-resort classification from the raw text before the cursor, used when
//! neither the parsed clauses nor the token scan place the cursor. String
//! literals and comments are masked out first so keywords inside them do not
//! count; the nearest clause keyword at the cursor's nesting depth wins.

use crate::anchor::{Anchor, Reading, resolve};
use crate::result::{ContextHints, ContextMode, ContextResult, ContextType, LeftSideColumn};
use regex::{Captures, Match, Regex};
use sqlctx_ir::{ClauseKind, QualifiedName, strip_delimiters};
use std::sync::LazyLock;

static MASKED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)'(?:[^']|'')*'?|--[^\n]*|/\*.*?(?:\*/|\z)").expect("valid regex"));

static BATCH_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*GO(?:[ \t]+\d+)?[ \t]*$").expect("valid regex"));

static REFERENCE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\[[^\]\n]*\]?|[\w@#$.])*$").expect("valid regex"));

static CLAUSE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:SELECT|FROM|(?:CROSS|OUTER)\s+APPLY|JOIN|ON|WHERE|HAVING|GROUP\s+BY|ORDER\s+BY|SET|INSERT|INTO|UPDATE|DELETE|MERGE|USING|VALUES|OUTPUT|EXECUTE|EXEC|USE|WITH)\b",
    )
    .expect("valid regex")
});

static LEFT_SIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:\[[^\]\n]*\]|[\w#$]+)(?:\.(?:\[[^\]\n]*\]|[\w#$]+))*)\s*(?:<>|!=|<=|>=|!<|!>|=|<|>)\s*$")
        .expect("valid regex")
});

static ALIAS_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\w@#$.\[\]]+)\s+AS\s*$").expect("valid regex"));

static INSERT_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\w#$.\[\]]+)").expect("valid regex"));

static INSERT_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bINTO\s+([\w#$.\[\]]+)\s*\(([^()]*)\)\s*$").expect("valid regex")
});

static EXEC_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:@\w+\s*=\s*)?([\w#$.\[\]]+)(\s[\s\S]*)?$").expect("valid regex"));

static NAMED_ARGUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(@\w+)\s*=").expect("valid regex"));

/// Classify the cursor at the end of `text`
///
/// Returns `None` when no clause keyword governs the cursor.
pub fn classify_text(text: &str) -> Option<ContextResult> {
    let masked = mask_literals(text);
    let statement = &masked[statement_start(&masked)..];

    let tail = REFERENCE_TAIL
        .find(statement)
        .map_or(statement.len(), |m| m.start());
    let before = &statement[..tail];
    let mut reading = read_reference(&statement[tail..]);

    if before.trim().is_empty() {
        return Some(resolve(Anchor::StatementStart, reading));
    }

    let found = last_clause_keyword(before)?;
    let anchor = anchor_for(found, before)?;
    let rest = &before[found.end()..];
    reading.left_side_column = detect_left_side(before);

    match anchor {
        Anchor::Clause(ClauseKind::Exec) => detect_exec_context(rest, reading),
        Anchor::Clause(ClauseKind::Into) if open_depth(rest) > 0 => {
            detect_insert_columns_context(rest, reading)
        }
        Anchor::Clause(ClauseKind::Values) => detect_values_context(&before[..found.start()], rest, reading),
        a if a.is_table_position() => detect_table_context(a, rest, reading),
        a => Some(resolve(a, reading)),
    }
}

/// Replace string literals and comments with spaces of the same byte length
fn mask_literals(text: &str) -> String {
    MASKED
        .replace_all(text, |caps: &Captures| " ".repeat(caps[0].len()))
        .into_owned()
}

/// Byte offset where the statement holding the end of `text` starts
fn statement_start(text: &str) -> usize {
    let semicolon = text.rfind(';').map_or(0, |i| i + 1);
    let batch = BATCH_SEPARATOR
        .find_iter(text)
        .last()
        .map_or(0, |m| m.end());
    semicolon.max(batch)
}

/// Split the reference at the cursor into qualifier and prefix
fn read_reference(tail: &str) -> Reading {
    let split = last_dot_outside_brackets(tail).map_or(0, |i| i + 1);
    let (head, raw) = tail.split_at(split);
    let qualifier = QualifiedName::parse(head);

    let first = raw.chars().next();
    let (prefix, trigger) = match first {
        Some('[') => (strip_delimiters(raw), Some('[')),
        Some('@' | '#') => (raw.to_string(), first),
        _ => (raw.to_string(), qualifier.as_ref().map(|_| '.')),
    };

    Reading {
        prefix,
        trigger,
        qualifier,
        ..Default::default()
    }
}

fn last_dot_outside_brackets(text: &str) -> Option<usize> {
    let mut in_bracket = false;
    let mut last = None;
    for (i, ch) in text.char_indices() {
        match ch {
            '[' if !in_bracket => in_bracket = true,
            ']' if in_bracket => in_bracket = false,
            '.' if !in_bracket => last = Some(i),
            _ => {}
        }
    }
    last
}

/// Nearest clause keyword that is not inside a group closed before the end
fn last_clause_keyword(text: &str) -> Option<Match<'_>> {
    let found: Vec<Match<'_>> = CLAUSE_KEYWORD.find_iter(text).collect();
    found
        .into_iter()
        .rev()
        .find(|m| never_below_zero(&text[m.end()..]))
}

fn never_below_zero(text: &str) -> bool {
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

fn open_depth(text: &str) -> i32 {
    text.chars().fold(0, |depth, ch| match ch {
        '(' => depth + 1,
        ')' => (depth - 1).max(0),
        _ => depth,
    })
}

fn anchor_for(found: Match<'_>, before: &str) -> Option<Anchor> {
    let word = found.as_str().to_ascii_uppercase();
    let first = word.split_whitespace().next().unwrap_or_default();
    let clause = match first {
        "SELECT" => ClauseKind::Select,
        "FROM" => ClauseKind::From,
        "JOIN" | "CROSS" | "OUTER" => ClauseKind::Join,
        "ON" => return Some(Anchor::On),
        "WHERE" => ClauseKind::Where,
        "HAVING" => ClauseKind::Having,
        "GROUP" => ClauseKind::GroupBy,
        "ORDER" => ClauseKind::OrderBy,
        "SET" => ClauseKind::Set,
        "INTO" => {
            let earlier = &before[..found.start()];
            let after_output = last_clause_keyword(earlier).is_some_and(|m| m.as_str().eq_ignore_ascii_case("OUTPUT"));
            if after_output {
                return Some(Anchor::OutputInto);
            }
            ClauseKind::Into
        }
        "INSERT" => ClauseKind::Into,
        "UPDATE" => ClauseKind::Update,
        "DELETE" => ClauseKind::Delete,
        "MERGE" => ClauseKind::Merge,
        "USING" => ClauseKind::Using,
        "VALUES" => ClauseKind::Values,
        "OUTPUT" => ClauseKind::Output,
        "EXEC" | "EXECUTE" => ClauseKind::Exec,
        "USE" => ClauseKind::Use,
        // only a leading WITH opens a CTE; elsewhere it introduces table hints
        "WITH" if before[..found.start()].trim().is_empty() => ClauseKind::With,
        _ => return None,
    };
    Some(Anchor::Clause(clause))
}

fn detect_left_side(before: &str) -> Option<LeftSideColumn> {
    let caps = LEFT_SIDE.captures(before)?;
    let whole = caps.get(1)?;
    if before[..whole.start()].ends_with('@') {
        return None;
    }
    let name = QualifiedName::parse(whole.as_str())?;
    let n = name.len();
    let part = |back: usize| n.checked_sub(back).map(|i| name.parts[i].clone()).filter(|p| !p.is_empty());
    Some(LeftSideColumn {
        qualified: name.joined(),
        table_ref: part(2),
        column_name: name.last()?.to_string(),
        schema: part(3),
    })
}

fn detect_table_context(anchor: Anchor, rest: &str, mut reading: Reading) -> Option<ContextResult> {
    let trimmed = rest.trim();
    if trimmed.ends_with('(') {
        // derived table or function arguments: a new query starts here
        return Some(ContextResult::new(ContextType::Keyword, ContextMode::General));
    }
    if !trimmed.is_empty() && !trimmed.ends_with(',') {
        if let Some(caps) = ALIAS_TAIL.captures(rest) {
            reading.alias_position = true;
            reading.completed = QualifiedName::parse(&caps[1]);
        } else {
            reading.follows_reference = true;
            let segment = trimmed.rsplit(',').next().unwrap_or(trimmed);
            reading.completed = segment.split_whitespace().next().and_then(QualifiedName::parse);
        }
    }
    Some(resolve(anchor, reading))
}

fn detect_insert_columns_context(rest: &str, mut reading: Reading) -> Option<ContextResult> {
    let Some(position) = row_position(rest) else {
        return Some(ContextResult::new(ContextType::Keyword, ContextMode::General));
    };
    let target = INSERT_TARGET
        .captures(rest)
        .and_then(|caps| QualifiedName::parse(&caps[1]));
    reading.extra = ContextHints {
        filter_table: target.as_ref().and_then(|t| t.last()).map(str::to_string),
        value_position: Some(position),
        ..Default::default()
    };
    Some(resolve(Anchor::Clause(ClauseKind::InsertColumns), reading))
}

fn detect_values_context(earlier: &str, rest: &str, mut reading: Reading) -> Option<ContextResult> {
    let Some(position) = row_position(rest) else {
        return Some(ContextResult::new(ContextType::Keyword, ContextMode::General));
    };
    let mut extra = ContextHints {
        value_position: Some(position),
        ..Default::default()
    };
    if let Some(caps) = INSERT_COLUMNS.captures(earlier) {
        extra.insert_table = QualifiedName::parse(&caps[1]).and_then(|t| t.last().map(str::to_string));
        extra.insert_columns = caps[2]
            .split(',')
            .map(strip_delimiters)
            .filter(|c| !c.is_empty())
            .collect();
    }
    reading.extra = extra;
    Some(resolve(Anchor::Clause(ClauseKind::Values), reading))
}

fn detect_exec_context(rest: &str, mut reading: Reading) -> Option<ContextResult> {
    let Some(caps) = EXEC_CALL.captures(rest) else {
        return Some(resolve(Anchor::Clause(ClauseKind::Exec), reading));
    };
    let Some(args) = caps.get(2) else {
        return Some(resolve(Anchor::Clause(ClauseKind::Exec), reading));
    };
    let args = args.as_str();
    reading.follows_reference = true;
    reading.completed = QualifiedName::parse(&caps[1]);
    reading.extra = ContextHints {
        value_position: Some(argument_position(args)),
        used_parameters: NAMED_ARGUMENT
            .captures_iter(args)
            .map(|c| c[1].to_string())
            .collect(),
        ..Default::default()
    };
    let mut result = resolve(Anchor::Clause(ClauseKind::Exec), reading);
    if args.trim_end().ends_with('=') {
        result.kind = ContextType::Unknown;
    }
    Some(result)
}

/// Index inside the open row group, `None` between groups
fn row_position(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut index = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => {
                depth += 1;
                if depth == 1 {
                    index = 0;
                }
            }
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 1 => index += 1,
            _ => {}
        }
    }
    (depth >= 1).then_some(index)
}

fn argument_position(text: &str) -> usize {
    let mut depth = 0usize;
    let mut index = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => index += 1,
            _ => {}
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ContextResult {
        classify_text(text).unwrap()
    }

    #[test]
    fn test_masks_literals_and_comments() {
        let masked = mask_literals("SELECT 'FROM x' -- WHERE\n/* JOIN */ a");
        assert!(!masked.contains("FROM"));
        assert!(!masked.contains("WHERE"));
        assert!(!masked.contains("JOIN"));
        assert_eq!(masked.len(), "SELECT 'FROM x' -- WHERE\n/* JOIN */ a".len());
    }

    #[test]
    fn test_statement_start_after_terminators() {
        assert_eq!(classify("SELECT 1; ").kind, ContextType::Keyword);
        assert_eq!(classify("SELECT 1\nGO\n").mode, ContextMode::StatementStart);
        assert_eq!(classify("").mode, ContextMode::StatementStart);
    }

    #[test]
    fn test_keyword_in_string_ignored() {
        let result = classify("SELECT 'x FROM y', ");
        assert_eq!((result.kind, result.mode), (ContextType::Column, ContextMode::Select));
    }

    #[test]
    fn test_table_positions() {
        let result = classify("SELECT * FROM ");
        assert_eq!((result.kind, result.mode), (ContextType::Table, ContextMode::From));

        let result = classify("SELECT * FROM audit.");
        assert_eq!((result.kind, result.mode), (ContextType::Table, ContextMode::FromQualified));
        assert_eq!(result.hints.filter_schema.as_deref(), Some("audit"));
        assert_eq!(result.trigger, Some('.'));

        let result = classify("SELECT * FROM Employees e ");
        assert_eq!((result.kind, result.mode), (ContextType::Keyword, ContextMode::AfterTable));
        assert_eq!(result.hints.table_ref.as_deref(), Some("Employees"));

        let result = classify("SELECT * FROM Employees AS ");
        assert_eq!(result.kind, ContextType::Alias);
    }

    #[test]
    fn test_bracketed_prefix() {
        let result = classify("SELECT * FROM [Order De");
        assert_eq!(result.prefix, "Order De");
        assert_eq!(result.trigger, Some('['));
        assert_eq!(result.kind, ContextType::Table);
    }

    #[test]
    fn test_nested_subquery_anchor() {
        let result = classify("SELECT * FROM t WHERE a IN (SELECT b FROM u WHERE ");
        assert_eq!(result.mode, ContextMode::Where);
        let result = classify("SELECT * FROM t WHERE a IN (SELECT b FROM u) AND x = ");
        assert_eq!(result.mode, ContextMode::Where);
        assert_eq!(result.hints.left_side_column.unwrap().column_name, "x");
    }

    #[test]
    fn test_qualified_column() {
        let result = classify("SELECT e.Fi");
        assert_eq!((result.kind, result.mode), (ContextType::Column, ContextMode::Qualified));
        assert_eq!(result.hints.table_ref.as_deref(), Some("e"));
        assert_eq!(result.prefix, "Fi");
    }

    #[test]
    fn test_insert_positions() {
        let result = classify("INSERT INTO dbo.Employees (EmployeeID, ");
        assert_eq!(result.mode, ContextMode::InsertColumns);
        assert_eq!(result.hints.value_position, Some(1));
        assert_eq!(result.hints.filter_table.as_deref(), Some("Employees"));

        let result = classify("INSERT INTO dbo.Employees (EmployeeID, FirstName, LastName) VALUES (1, 'A', ");
        assert_eq!(result.mode, ContextMode::Values);
        assert_eq!(result.hints.positional_column(), Some("LastName"));
        assert_eq!(result.hints.insert_table.as_deref(), Some("Employees"));

        let result = classify("INSERT INTO t VALUES (1, 2), ");
        assert_eq!((result.kind, result.mode), (ContextType::Keyword, ContextMode::General));
    }

    #[test]
    fn test_exec() {
        let result = classify("EXEC ");
        assert_eq!(result.kind, ContextType::Procedure);

        let result = classify("EXEC dbo.usp_UpdateSalary @EmployeeID = 1, @");
        assert_eq!((result.kind, result.mode), (ContextType::Parameter, ContextMode::ExecParams));
        assert_eq!(result.hints.routine.as_deref(), Some("dbo.usp_UpdateSalary"));
        assert_eq!(result.hints.value_position, Some(1));
        assert_eq!(result.hints.used_parameters, vec!["@EmployeeID"]);
        assert_eq!(result.trigger, Some('@'));

        let result = classify("EXEC dbo.usp_UpdateSalary @EmployeeID = ");
        assert_eq!(result.kind, ContextType::Unknown);
    }

    #[test]
    fn test_output_into() {
        let result = classify("DELETE FROM Employees OUTPUT deleted.EmployeeID INTO ");
        assert_eq!((result.kind, result.mode), (ContextType::Table, ContextMode::OutputInto));
    }

    #[test]
    fn test_use_database() {
        let result = classify("USE ");
        assert_eq!((result.kind, result.mode), (ContextType::Database, ContextMode::Use));
    }
}
