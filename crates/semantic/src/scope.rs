// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Statement-local scope
//!
//! Names a statement defines for itself: aliases, CTEs and temp tables. They
//! shadow the catalog, so the resolver looks here first.
//!
//! A [`LocalScope`] owns its data. It is built from a
//! [`StatementContext`] borrowed from a parsed buffer and can outlive it,
//! which lets a classification be retried after catalog loads finish.

use std::collections::BTreeMap;

use sqlctx_grammar::StatementContext;
use sqlctx_ir::{CteDef, StatementType, TableRef, TempTableDef, normalize_identifier};

/// Aliases, CTEs and temp tables visible at a cursor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalScope {
    /// Table references per enclosing scope, innermost first
    frames: Vec<Vec<TableRef>>,
    ctes: BTreeMap<String, CteDef>,
    temp_tables: BTreeMap<String, TempTableDef>,
    statement_type: StatementType,
}

impl LocalScope {
    /// Scope with no local names
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the local names visible in a statement context
    pub fn from_context(context: &StatementContext<'_>) -> Self {
        let frames = context.scopes.iter().map(|scope| scope.tables.clone()).collect();

        let ctes = context
            .ctes()
            .into_iter()
            .map(|cte| (normalize_identifier(&cte.name), cte.clone()))
            .collect();

        let mut temp_tables = context.temp_tables.clone();
        for scope in &context.scopes {
            for (key, def) in &scope.temp_tables {
                temp_tables.entry(key.clone()).or_insert_with(|| def.clone());
            }
        }

        Self {
            frames,
            ctes,
            temp_tables,
            statement_type: context
                .statement
                .map_or(StatementType::Other, |s| s.statement_type),
        }
    }

    /// Add a table reference to the innermost frame
    pub fn with_table(mut self, table: TableRef) -> Self {
        match self.frames.first_mut() {
            Some(frame) => frame.push(table),
            None => self.frames.push(vec![table]),
        }
        self
    }

    pub fn with_cte(mut self, cte: CteDef) -> Self {
        self.ctes.insert(normalize_identifier(&cte.name), cte);
        self
    }

    pub fn with_temp_table(mut self, table: TempTableDef) -> Self {
        self.temp_tables.insert(normalize_identifier(&table.name), table);
        self
    }

    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    /// Table references of the innermost frame
    pub fn tables(&self) -> &[TableRef] {
        self.frames.first().map_or(&[], Vec::as_slice)
    }

    /// Table references of every frame, innermost first
    pub fn all_tables(&self) -> impl Iterator<Item = &TableRef> {
        self.frames.iter().flatten()
    }

    /// Reference a qualifier designates, searching outward
    ///
    /// Aliases hide the name of the table they rename.
    pub fn find_table(&self, qualifier: &str) -> Option<&TableRef> {
        self.frames
            .iter()
            .find_map(|frame| frame.iter().find(|t| t.matches_qualifier(qualifier)))
    }

    /// Reference renamed to `alias`
    pub fn alias(&self, alias: &str) -> Option<&TableRef> {
        let key = normalize_identifier(alias);
        self.all_tables()
            .find(|t| t.alias().is_some_and(|a| normalize_identifier(a) == key))
    }

    /// Aliases in scope, innermost first
    pub fn aliases(&self) -> Vec<&str> {
        self.all_tables().filter_map(TableRef::alias).collect()
    }

    pub fn cte(&self, name: &str) -> Option<&CteDef> {
        self.ctes.get(&normalize_identifier(name))
    }

    pub fn ctes(&self) -> impl Iterator<Item = &CteDef> {
        self.ctes.values()
    }

    pub fn temp_table(&self, name: &str) -> Option<&TempTableDef> {
        self.temp_tables.get(&normalize_identifier(name))
    }

    pub fn temp_tables(&self) -> impl Iterator<Item = &TempTableDef> {
        self.temp_tables.values()
    }

    /// Column names a local reference exposes, when the statement says
    ///
    /// `None` for catalog tables, and for CTEs or temp tables whose columns
    /// the statement does not list.
    pub fn local_columns(&self, table: &TableRef) -> Option<Vec<String>> {
        match table {
            TableRef::Cte { name, .. } => self.cte(name).and_then(|c| c.columns.clone()),
            TableRef::TempTable { name, .. } => self.temp_table(name).and_then(|t| t.columns.clone()),
            TableRef::Derived { columns, .. } => Some(columns.clone()),
            TableRef::Table { .. } | TableRef::TableFunction { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_grammar::ParsedBuffer;
    use sqlctx_ir::Dialect;
    use sqlctx_test_utils::{SqlFixtures, split_cursor};

    fn scope_at(input: &str) -> LocalScope {
        let (sql, pos) = split_cursor(input);
        let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
        LocalScope::from_context(&buffer.context_at(pos))
    }

    #[test]
    fn test_alias_hides_table_name() {
        let scope = scope_at(SqlFixtures::select_qualified());
        assert_eq!(scope.find_table("e").and_then(|t| t.name()), Some("Employees"));
        assert!(scope.find_table("Employees").is_none());
        assert_eq!(scope.aliases(), vec!["e"]);
    }

    #[test]
    fn test_unaliased_table_matches_by_name() {
        let scope = scope_at("SELECT █ FROM dbo.Employees");
        assert!(scope.find_table("employees").is_some());
        assert!(scope.find_table("dbo.Employees").is_some());
    }

    #[test]
    fn test_outer_frame_is_searched() {
        let scope = scope_at("SELECT * FROM Employees e WHERE EXISTS (SELECT █ FROM Departments d)");
        assert_eq!(scope.tables().len(), 1);
        assert!(scope.find_table("e").is_some());
        assert!(scope.find_table("d").is_some());
    }

    #[test]
    fn test_cte_and_temp_table() {
        let scope = scope_at(SqlFixtures::cte_from());
        let cte = scope.cte("empcte").unwrap();
        assert_eq!(cte.columns.as_deref(), Some(&["EmployeeID".to_string()][..]));

        let scope = scope_at(SqlFixtures::temp_table_script());
        let raise = scope.temp_table("#Raise").unwrap();
        assert_eq!(raise.columns.as_ref().map(Vec::len), Some(2));
        let table = scope.find_table("r").unwrap();
        assert_eq!(scope.local_columns(table).map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_built_scope() {
        let scope = LocalScope::new().with_table(TableRef::Table {
            database: None,
            schema: None,
            name: "Employees".into(),
            alias: Some("x".into()),
        });
        assert!(scope.alias("X").is_some());
        assert_eq!(scope.local_columns(scope.alias("x").unwrap()), None);
        assert_eq!(scope.statement_type(), StatementType::Other);
    }
}
