// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Anchors
//!
//! An anchor is the keyword (or clause) that decides what the cursor expects.
//! The clause dispatcher, the token scanner and the text classifier each find
//! an anchor their own way and describe the reference around the cursor as a
//! [`Reading`]; [`resolve`] turns the pair into a [`ContextResult`].

use crate::qualified::{ObjectReference, column_hints, interpret, object_hints};
use crate::result::{ContextHints, ContextMode, ContextResult, ContextType, LeftSideColumn};
use sqlctx_ir::{ClauseKind, Punct, QualifiedName, Token, TokenKind};

/// What a cursor position is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Clause(ClauseKind),
    /// Join or MERGE predicate
    On,
    /// `OUTPUT ... INTO` target
    OutputInto,
    StatementStart,
}

impl Anchor {
    /// Anchor named by the keyword at `tokens[i]`, if it is one
    pub fn from_keyword(tokens: &[&Token], i: usize) -> Option<Anchor> {
        let tok = tokens[i];
        if tok.kind != TokenKind::Keyword {
            return None;
        }
        let clause = match tok.text.to_ascii_uppercase().as_str() {
            "SELECT" => ClauseKind::Select,
            "FROM" => ClauseKind::From,
            "JOIN" | "APPLY" => ClauseKind::Join,
            "ON" => return Some(Anchor::On),
            "WHERE" => ClauseKind::Where,
            "HAVING" => ClauseKind::Having,
            "BY" => {
                let prev = i.checked_sub(1).map(|p| tokens[p])?;
                if prev.is_keyword("GROUP") {
                    ClauseKind::GroupBy
                } else if prev.is_keyword("ORDER") {
                    ClauseKind::OrderBy
                } else {
                    return None;
                }
            }
            "SET" => ClauseKind::Set,
            "INTO" if follows_output(tokens, i) => return Some(Anchor::OutputInto),
            "INTO" | "INSERT" => ClauseKind::Into,
            "UPDATE" => ClauseKind::Update,
            "DELETE" => ClauseKind::Delete,
            "MERGE" => ClauseKind::Merge,
            "USING" => ClauseKind::Using,
            "VALUES" => ClauseKind::Values,
            "OUTPUT" => ClauseKind::Output,
            "EXEC" | "EXECUTE" => ClauseKind::Exec,
            "USE" => ClauseKind::Use,
            "WITH" if i == 0 || tokens[i - 1].is_terminator() => ClauseKind::With,
            _ => return None,
        };
        Some(Anchor::Clause(clause))
    }

    /// Whether the anchor expects an object name
    pub fn is_table_position(&self) -> bool {
        matches!(
            self,
            Anchor::OutputInto
                | Anchor::Clause(
                    ClauseKind::From
                        | ClauseKind::Join
                        | ClauseKind::Into
                        | ClauseKind::Update
                        | ClauseKind::Delete
                        | ClauseKind::Merge
                        | ClauseKind::Using
                )
        )
    }

    fn table_mode(&self) -> ContextMode {
        match self {
            Anchor::OutputInto => ContextMode::OutputInto,
            Anchor::Clause(ClauseKind::Join) => ContextMode::Join,
            Anchor::Clause(ClauseKind::Into) => ContextMode::Into,
            Anchor::Clause(ClauseKind::Update) => ContextMode::Update,
            Anchor::Clause(ClauseKind::Delete) => ContextMode::Delete,
            Anchor::Clause(ClauseKind::Merge) => ContextMode::Merge,
            Anchor::Clause(ClauseKind::Using) => ContextMode::Using,
            _ => ContextMode::From,
        }
    }

    fn column_mode(&self) -> ContextMode {
        match self {
            Anchor::On => ContextMode::On,
            Anchor::Clause(ClauseKind::Where) => ContextMode::Where,
            Anchor::Clause(ClauseKind::Having) => ContextMode::Having,
            Anchor::Clause(ClauseKind::GroupBy) => ContextMode::GroupBy,
            Anchor::Clause(ClauseKind::OrderBy) => ContextMode::OrderBy,
            Anchor::Clause(ClauseKind::Set) => ContextMode::Set,
            Anchor::Clause(ClauseKind::Values) => ContextMode::Values,
            Anchor::Clause(ClauseKind::InsertColumns) => ContextMode::InsertColumns,
            Anchor::Clause(ClauseKind::Output) => ContextMode::Output,
            _ => ContextMode::Select,
        }
    }
}

/// Whether the INTO at `tokens[i]` belongs to an OUTPUT clause
fn follows_output(tokens: &[&Token], i: usize) -> bool {
    let mut depth = 0i32;
    for tok in tokens[..i].iter().rev() {
        if tok.is_terminator() {
            return false;
        }
        if tok.is_punct(Punct::RParen) {
            depth += 1;
        } else if tok.is_punct(Punct::LParen) {
            depth -= 1;
        } else if depth == 0 && tok.kind == TokenKind::Keyword {
            if tok.is_keyword("OUTPUT") {
                return true;
            }
            if tok.is_any_keyword(&["SELECT", "FROM", "WHERE", "VALUES", "SET", "INSERT", "UPDATE", "DELETE", "MERGE"]) {
                return false;
            }
        }
    }
    false
}

/// What a classifier read around the cursor
#[derive(Debug, Clone, Default)]
pub struct Reading {
    pub prefix: String,
    pub trigger: Option<char>,
    /// Qualifier before the prefix (always has a trailing dot)
    pub qualifier: Option<QualifiedName>,
    /// A complete object reference sits between the anchor and the cursor
    pub follows_reference: bool,
    /// That reference, when it is a plain name
    pub completed: Option<QualifiedName>,
    /// The cursor follows `AS` after an object reference
    pub alias_position: bool,
    pub left_side_column: Option<LeftSideColumn>,
    /// Statement-specific hints gathered by the caller
    pub extra: ContextHints,
}

/// Turn an anchor and a reading into a context result
pub fn resolve(anchor: Anchor, reading: Reading) -> ContextResult {
    let Reading {
        prefix,
        trigger,
        qualifier,
        follows_reference,
        completed,
        alias_position,
        left_side_column,
        extra,
    } = reading;

    let (kind, mode, mut hints) = match anchor {
        Anchor::StatementStart => (ContextType::Keyword, ContextMode::StatementStart, ContextHints::default()),
        Anchor::Clause(ClauseKind::Use) => (ContextType::Database, ContextMode::Use, ContextHints::default()),
        Anchor::Clause(ClauseKind::With) => (ContextType::Keyword, ContextMode::General, ContextHints::default()),
        Anchor::Clause(ClauseKind::Exec) => match (&qualifier, follows_reference) {
            (Some(q), _) => match object_hints(q) {
                Some(h) => (ContextType::Procedure, ContextMode::Exec, h),
                None => (ContextType::Unknown, ContextMode::Exec, ContextHints::default()),
            },
            (None, true) => {
                let hints = ContextHints {
                    routine: completed.as_ref().map(QualifiedName::joined),
                    ..Default::default()
                };
                (ContextType::Parameter, ContextMode::ExecParams, hints)
            }
            (None, false) => (ContextType::Procedure, ContextMode::Exec, ContextHints::default()),
        },
        a if a.is_table_position() => match &qualifier {
            Some(q) => match object_hints(q) {
                Some(h) => (ContextType::Table, ContextMode::FromQualified, h),
                None => (ContextType::Column, ContextMode::Qualified, column_hints(q)),
            },
            None if alias_position => {
                let hints = ContextHints {
                    table_ref: completed.as_ref().and_then(|n| n.last()).map(str::to_string),
                    ..Default::default()
                };
                (ContextType::Alias, ContextMode::AfterTable, hints)
            }
            None if follows_reference => {
                (ContextType::Keyword, ContextMode::AfterTable, completed.as_ref().map(reference_hints).unwrap_or_default())
            }
            None => (ContextType::Table, a.table_mode(), ContextHints::default()),
        },
        a => {
            let mode = match (&qualifier, a) {
                (Some(_), Anchor::Clause(ClauseKind::Output)) => ContextMode::Output,
                (Some(_), _) => ContextMode::Qualified,
                (None, _) => a.column_mode(),
            };
            let mut hints = qualifier.as_ref().map(column_hints).unwrap_or_default();
            hints.left_side_column = left_side_column;
            (ContextType::Column, mode, hints)
        }
    };

    merge_extra(&mut hints, extra);
    ContextResult::new(kind, mode).with_hints(hints).with_prefix(prefix, trigger)
}

/// Hints describing a complete object reference
fn reference_hints(name: &QualifiedName) -> ContextHints {
    match interpret(name) {
        Some(ObjectReference::Alias { alias }) => ContextHints {
            table_ref: Some(alias),
            ..Default::default()
        },
        Some(ObjectReference::SchemaTable { schema, table }) => ContextHints {
            table_ref: Some(table),
            schema,
            ..Default::default()
        },
        Some(ObjectReference::DatabaseSchemaTable { database, schema, table }) => ContextHints {
            table_ref: Some(table),
            schema,
            database: Some(database),
            ..Default::default()
        },
        _ => ContextHints::default(),
    }
}

fn merge_extra(hints: &mut ContextHints, extra: ContextHints) {
    hints.filter_table = hints.filter_table.take().or(extra.filter_table);
    hints.value_position = hints.value_position.or(extra.value_position);
    hints.insert_table = hints.insert_table.take().or(extra.insert_table);
    if hints.insert_columns.is_empty() {
        hints.insert_columns = extra.insert_columns;
    }
    hints.routine = hints.routine.take().or(extra.routine);
    if hints.used_parameters.is_empty() {
        hints.used_parameters = extra.used_parameters;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_grammar::tokenize;
    use sqlctx_ir::Dialect;

    fn anchor_of(sql: &str, index: usize) -> Option<Anchor> {
        let tokens = tokenize(sql, Dialect::SqlServer);
        let refs: Vec<&Token> = tokens.iter().collect();
        Anchor::from_keyword(&refs, index)
    }

    #[test]
    fn test_from_keyword() {
        assert_eq!(anchor_of("SELECT", 0), Some(Anchor::Clause(ClauseKind::Select)));
        assert_eq!(anchor_of("ORDER BY", 1), Some(Anchor::Clause(ClauseKind::OrderBy)));
        assert_eq!(anchor_of("GROUP BY", 1), Some(Anchor::Clause(ClauseKind::GroupBy)));
        assert_eq!(anchor_of("PARTITION BY", 1), None);
        assert_eq!(anchor_of("a ON", 1), Some(Anchor::On));
        assert_eq!(anchor_of("AND", 0), None);
        assert_eq!(anchor_of("Employees", 0), None);
    }

    #[test]
    fn test_output_into() {
        assert_eq!(
            anchor_of("DELETE FROM t OUTPUT deleted.Id INTO", 7),
            Some(Anchor::OutputInto)
        );
        assert_eq!(anchor_of("INSERT INTO", 1), Some(Anchor::Clause(ClauseKind::Into)));
    }

    #[test]
    fn test_resolve_table_positions() {
        let result = resolve(Anchor::Clause(ClauseKind::From), Reading::default());
        assert_eq!((result.kind, result.mode), (ContextType::Table, ContextMode::From));

        let reading = Reading {
            qualifier: QualifiedName::parse("audit."),
            ..Default::default()
        };
        let result = resolve(Anchor::Clause(ClauseKind::Join), reading);
        assert_eq!((result.kind, result.mode), (ContextType::Table, ContextMode::FromQualified));
        assert_eq!(result.hints.filter_schema.as_deref(), Some("audit"));
        assert_eq!(result.hints.potential_database.as_deref(), Some("audit"));
        assert_eq!(result.trigger, None);

        let reading = Reading {
            follows_reference: true,
            completed: QualifiedName::parse("dbo.Employees"),
            ..Default::default()
        };
        let result = resolve(Anchor::Clause(ClauseKind::From), reading);
        assert_eq!((result.kind, result.mode), (ContextType::Keyword, ContextMode::AfterTable));
        assert_eq!(result.hints.table_ref.as_deref(), Some("Employees"));
        assert_eq!(result.hints.schema.as_deref(), Some("dbo"));
    }

    #[test]
    fn test_resolve_column_positions() {
        let reading = Reading {
            prefix: "Fi".into(),
            trigger: Some('.'),
            qualifier: QualifiedName::parse("e."),
            ..Default::default()
        };
        let result = resolve(Anchor::Clause(ClauseKind::Select), reading);
        assert_eq!((result.kind, result.mode), (ContextType::Column, ContextMode::Qualified));
        assert_eq!(result.hints.table_ref.as_deref(), Some("e"));
        assert_eq!(result.prefix, "Fi");

        let result = resolve(Anchor::On, Reading::default());
        assert_eq!((result.kind, result.mode), (ContextType::Column, ContextMode::On));
    }

    #[test]
    fn test_resolve_exec() {
        let result = resolve(Anchor::Clause(ClauseKind::Exec), Reading::default());
        assert_eq!(result.kind, ContextType::Procedure);

        let reading = Reading {
            follows_reference: true,
            completed: QualifiedName::parse("dbo.usp_GetEmployee"),
            ..Default::default()
        };
        let result = resolve(Anchor::Clause(ClauseKind::Exec), reading);
        assert_eq!((result.kind, result.mode), (ContextType::Parameter, ContextMode::ExecParams));
        assert_eq!(result.hints.routine.as_deref(), Some("dbo.usp_GetEmployee"));
    }
}
