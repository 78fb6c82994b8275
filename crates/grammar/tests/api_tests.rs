// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Grammar API integration tests
//!
//! Parses multi-statement scripts through the public `ParsedBuffer` API.

use sqlctx_grammar::{ParsedBuffer, tokenize};
use sqlctx_ir::{ClauseKind, Dialect, Position, StatementType, TableRef, TokenKind};

const SCRIPT: &str = "USE [Sales];
-- monthly report
WITH Recent AS (
    SELECT o.OrderID, o.CustomerID FROM dbo.Orders o WHERE o.OrderDate > '2024-01-01'
)
SELECT r.OrderID, c.Name
FROM Recent r
JOIN dbo.Customers c ON c.CustomerID = r.CustomerID
GO
EXEC dbo.usp_Report @Year = 2024
";

#[test]
fn test_script_statements() {
    let buffer = ParsedBuffer::parse(SCRIPT, Dialect::SqlServer);
    let types: Vec<StatementType> = buffer.statements().iter().map(|s| s.statement_type).collect();
    assert_eq!(types, vec![StatementType::Use, StatementType::Select, StatementType::Exec]);
}

#[test]
fn test_comments_are_kept_as_tokens() {
    let tokens = tokenize(SCRIPT, Dialect::SqlServer);
    let comment = tokens.iter().find(|t| t.kind == TokenKind::Comment).unwrap();
    assert_eq!(comment.start, Position::new(2, 1));
    assert_eq!(comment.text, "-- monthly report");
}

#[test]
fn test_cte_reference_and_alias_resolution() {
    let buffer = ParsedBuffer::parse(SCRIPT, Dialect::SqlServer);
    let ctx = buffer.context_at(Position::new(8, 30));
    assert!(matches!(ctx.find_table("r"), Some(TableRef::Cte { name, .. }) if name == "Recent"));
    assert_eq!(ctx.find_table("c").and_then(|t| t.schema()), Some("dbo"));
    assert_eq!(
        ctx.cte("recent").and_then(|c| c.columns.clone()),
        Some(vec!["OrderID".to_string(), "CustomerID".to_string()])
    );
}

#[test]
fn test_cursor_inside_cte_body() {
    let buffer = ParsedBuffer::parse(SCRIPT, Dialect::SqlServer);
    let pos = Position::new(4, 25);
    let ctx = buffer.context_at(pos);
    assert_eq!(ctx.scopes.len(), 2);
    let body = ctx.chunk().unwrap();
    assert_eq!(ParsedBuffer::clause_at(body, pos), Some(ClauseKind::Select));
    assert_eq!(ctx.find_table("o").and_then(|t| t.name()), Some("Orders"));
}

#[test]
fn test_exec_clause() {
    let buffer = ParsedBuffer::parse(SCRIPT, Dialect::SqlServer);
    let exec = buffer.statements().last().unwrap();
    assert!(exec.has_clause(ClauseKind::Exec));
    assert!(!exec.terminated);
}
