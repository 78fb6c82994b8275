// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Parsed buffers
//!
//! A [`ParsedBuffer`] is one edit generation of a buffer: its text, tokens and
//! statements. It answers "which statement, scope and clause is the cursor in".

use crate::parser::parse_statements;
use crate::tokenizer::tokenize;
use sqlctx_ir::{
    Clause, ClauseKind, CteDef, Dialect, Position, StatementChunk, TableRef, TempTableDef, Token,
    normalize_identifier,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Tokens and statement model for one buffer generation
#[derive(Debug, Clone)]
pub struct ParsedBuffer {
    text: String,
    dialect: Dialect,
    tokens: Vec<Token>,
    statements: Vec<StatementChunk>,
}

impl ParsedBuffer {
    /// Tokenize and parse `text`
    pub fn parse(text: impl Into<String>, dialect: Dialect) -> Self {
        let text = text.into();
        let tokens = tokenize(&text, dialect);
        let statements = parse_statements(&tokens);
        debug!(tokens = tokens.len(), statements = statements.len(), "parsed buffer");
        Self {
            text,
            dialect,
            tokens,
            statements,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn statements(&self) -> &[StatementChunk] {
        &self.statements
    }

    /// Top-level statement a cursor at `pos` belongs to
    ///
    /// A cursor past the last token of an unterminated statement still belongs
    /// to it; a cursor past a `;` or `GO` belongs to no statement.
    pub fn statement_at(&self, pos: Position) -> Option<&StatementChunk> {
        let mut trailing = None;
        for stmt in &self.statements {
            if stmt.span.start > pos {
                break;
            }
            if stmt.span.contains(pos) {
                return Some(stmt);
            }
            trailing = (!stmt.terminated).then_some(stmt);
        }
        trailing
    }

    /// Statement context at `pos`: the enclosing statement, its nested scopes
    /// down to the cursor, and the temp tables visible there
    pub fn context_at(&self, pos: Position) -> StatementContext<'_> {
        let Some(statement) = self.statement_at(pos) else {
            return StatementContext::default();
        };

        let mut scopes = vec![statement];
        let mut current = statement;
        while let Some(sub) = current.subqueries.iter().find(|s| s.span.contains(pos)) {
            scopes.push(sub);
            current = sub;
        }
        scopes.reverse();

        // temp tables outlive their statement within a buffer
        let mut temp_tables = BTreeMap::new();
        for stmt in self.statements.iter().take_while(|s| s.span.start <= pos) {
            temp_tables.extend(stmt.temp_tables.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        StatementContext {
            statement: Some(statement),
            scopes,
            temp_tables,
        }
    }

    /// Innermost clause containing `pos`; later clauses win at shared boundaries
    pub fn clause_at(chunk: &StatementChunk, pos: Position) -> Option<ClauseKind> {
        chunk.clauses.iter().rev().find(|c| c.span.contains(pos)).map(|c| c.kind)
    }

    /// Last clause that starts before `pos`, whether or not it still contains it
    pub fn trailing_clause(chunk: &StatementChunk, pos: Position) -> Option<&Clause> {
        chunk.clauses.iter().rev().find(|c| c.span.start < pos)
    }
}

/// What the statement model knows at a cursor position
#[derive(Debug, Clone, Default)]
pub struct StatementContext<'a> {
    /// Top-level statement containing the cursor
    pub statement: Option<&'a StatementChunk>,
    /// Enclosing scopes, innermost first
    pub scopes: Vec<&'a StatementChunk>,
    /// Temp tables defined up to and including the current statement
    pub temp_tables: BTreeMap<String, TempTableDef>,
}

impl<'a> StatementContext<'a> {
    /// Innermost scope
    pub fn chunk(&self) -> Option<&'a StatementChunk> {
        self.scopes.first().copied()
    }

    /// Table references of the innermost scope
    pub fn tables(&self) -> &'a [TableRef] {
        self.chunk().map_or(&[], |c| c.tables.as_slice())
    }

    /// Table reference a qualifier designates, searching outward
    pub fn find_table(&self, qualifier: &str) -> Option<&'a TableRef> {
        self.scopes.iter().find_map(|s| s.find_table(qualifier))
    }

    /// Whether `name` is an alias in any enclosing scope
    pub fn is_alias(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.lookup_alias(name).is_some())
    }

    /// CTE visible at the cursor
    pub fn cte(&self, name: &str) -> Option<&'a CteDef> {
        self.scopes.iter().find_map(|s| s.cte(name))
    }

    /// All CTEs visible at the cursor, innermost definitions first
    pub fn ctes(&self) -> Vec<&'a CteDef> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for scope in &self.scopes {
            for (key, cte) in &scope.ctes {
                if !seen.contains(key) {
                    seen.push(key.clone());
                    out.push(cte);
                }
            }
        }
        out
    }

    /// Temp table visible at the cursor
    pub fn temp_table(&self, name: &str) -> Option<&TempTableDef> {
        self.temp_tables.get(&normalize_identifier(name))
    }
}
