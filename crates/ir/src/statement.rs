// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statement model
//!
//! The statement parser describes each statement with its clause ranges and
//! the inventory of tables it references. Consumers treat a [`StatementChunk`]
//! as read-only; it is rebuilt from scratch on every edit generation.

use crate::position::{Position, Span};
use crate::qualified::normalize_identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Syntactic region of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClauseKind {
    With,
    Select,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Set,
    Into,
    Update,
    Delete,
    Merge,
    Using,
    InsertColumns,
    Values,
    Output,
    Exec,
    Use,
}

impl ClauseKind {
    /// Snake-case clause name
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::With => "with",
            ClauseKind::Select => "select",
            ClauseKind::From => "from",
            ClauseKind::Join => "join",
            ClauseKind::Where => "where",
            ClauseKind::GroupBy => "group_by",
            ClauseKind::Having => "having",
            ClauseKind::OrderBy => "order_by",
            ClauseKind::Set => "set",
            ClauseKind::Into => "into",
            ClauseKind::Update => "update",
            ClauseKind::Delete => "delete",
            ClauseKind::Merge => "merge",
            ClauseKind::Using => "using",
            ClauseKind::InsertColumns => "insert_columns",
            ClauseKind::Values => "values",
            ClauseKind::Output => "output",
            ClauseKind::Exec => "exec",
            ClauseKind::Use => "use",
        }
    }
}

/// A clause and its source extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub kind: ClauseKind,
    /// From the first keyword of the clause to the end of its last token
    pub span: Span,
}

/// Kind of statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Exec,
    Create,
    Alter,
    Drop,
    Use,
    Declare,
    #[default]
    Other,
}

impl StatementType {
    /// Statement type from its leading keyword
    pub fn from_keyword(kw: &str) -> Self {
        match kw.to_ascii_uppercase().as_str() {
            "SELECT" | "WITH" => StatementType::Select,
            "INSERT" => StatementType::Insert,
            "UPDATE" => StatementType::Update,
            "DELETE" => StatementType::Delete,
            "MERGE" => StatementType::Merge,
            "EXEC" | "EXECUTE" => StatementType::Exec,
            "CREATE" => StatementType::Create,
            "ALTER" => StatementType::Alter,
            "DROP" => StatementType::Drop,
            "USE" => StatementType::Use,
            "DECLARE" => StatementType::Declare,
            _ => StatementType::Other,
        }
    }
}

/// A table-like reference found in a statement
///
/// One variant per kind of source; each carries only the fields that kind has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableRef {
    /// Catalog table, view or synonym
    Table {
        database: Option<String>,
        schema: Option<String>,
        name: String,
        alias: Option<String>,
    },
    /// Reference to a CTE defined in the same statement
    Cte { name: String, alias: Option<String> },
    /// `#local` or `##global` temp table
    TempTable {
        name: String,
        alias: Option<String>,
        is_global: bool,
    },
    /// Derived table `(SELECT ...) AS alias`
    Derived {
        alias: Option<String>,
        /// Projected column names, in order
        columns: Vec<String>,
    },
    /// Table-valued function in a FROM or JOIN clause
    TableFunction {
        database: Option<String>,
        schema: Option<String>,
        name: String,
        alias: Option<String>,
    },
}

impl TableRef {
    /// Alias, if any
    pub fn alias(&self) -> Option<&str> {
        match self {
            TableRef::Table { alias, .. }
            | TableRef::Cte { alias, .. }
            | TableRef::TempTable { alias, .. }
            | TableRef::Derived { alias, .. }
            | TableRef::TableFunction { alias, .. } => alias.as_deref(),
        }
    }

    /// Object name (`None` for derived tables)
    pub fn name(&self) -> Option<&str> {
        match self {
            TableRef::Table { name, .. }
            | TableRef::Cte { name, .. }
            | TableRef::TempTable { name, .. }
            | TableRef::TableFunction { name, .. } => Some(name),
            TableRef::Derived { .. } => None,
        }
    }

    /// Schema qualifier, if written
    pub fn schema(&self) -> Option<&str> {
        match self {
            TableRef::Table { schema, .. } | TableRef::TableFunction { schema, .. } => {
                schema.as_deref()
            }
            _ => None,
        }
    }

    /// Database qualifier, if written
    pub fn database(&self) -> Option<&str> {
        match self {
            TableRef::Table { database, .. } | TableRef::TableFunction { database, .. } => {
                database.as_deref()
            }
            _ => None,
        }
    }

    /// Name the statement uses to refer to this source: alias, else object name
    pub fn exposed_name(&self) -> Option<&str> {
        self.alias().or_else(|| self.name())
    }

    /// Whether `qualifier` designates this reference
    ///
    /// Matches the alias, or when there is no alias the bare name or its
    /// `schema.name` form. Comparison is case-insensitive.
    pub fn matches_qualifier(&self, qualifier: &str) -> bool {
        let wanted = normalize_identifier(qualifier);
        if let Some(alias) = self.alias() {
            return normalize_identifier(alias) == wanted;
        }
        let Some(name) = self.name() else {
            return false;
        };
        if normalize_identifier(name) == wanted {
            return true;
        }
        match self.schema() {
            Some(schema) => format!("{}.{}", normalize_identifier(schema), normalize_identifier(name)) == wanted,
            None => false,
        }
    }
}

/// CTE definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CteDef {
    pub name: String,
    /// Explicit column list, or the body's projection when that is known
    pub columns: Option<Vec<String>>,
}

/// Temp table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempTableDef {
    pub name: String,
    pub columns: Option<Vec<String>>,
    pub is_global: bool,
}

/// Statement model for one statement or nested subquery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementChunk {
    /// Extent of the statement's tokens
    pub span: Span,
    /// Clauses in source order
    pub clauses: Vec<Clause>,
    /// Table references in source order
    pub tables: Vec<TableRef>,
    /// Lower-cased alias to reference
    pub aliases: BTreeMap<String, TableRef>,
    /// Lower-cased CTE name to definition
    pub ctes: BTreeMap<String, CteDef>,
    /// Lower-cased temp table name to definition
    pub temp_tables: BTreeMap<String, TempTableDef>,
    /// Nested subqueries (derived tables, CTE bodies, predicates)
    pub subqueries: Vec<StatementChunk>,
    pub statement_type: StatementType,
    /// Whether a `;` or `GO` closes the statement
    pub terminated: bool,
}

impl StatementChunk {
    /// Span of the first clause of `kind`
    pub fn clause_range(&self, kind: ClauseKind) -> Option<Span> {
        self.clauses.iter().find(|c| c.kind == kind).map(|c| c.span)
    }

    /// Whether a clause of `kind` exists
    pub fn has_clause(&self, kind: ClauseKind) -> bool {
        self.clauses.iter().any(|c| c.kind == kind)
    }

    /// Look up an alias, ignoring map entries with no backing table reference
    pub fn lookup_alias(&self, alias: &str) -> Option<&TableRef> {
        let key = normalize_identifier(alias);
        let candidate = self.aliases.get(&key)?;
        self.tables
            .iter()
            .any(|t| t.alias().is_some_and(|a| normalize_identifier(a) == key))
            .then_some(candidate)
    }

    /// Find the table reference a qualifier designates
    pub fn find_table(&self, qualifier: &str) -> Option<&TableRef> {
        self.lookup_alias(qualifier)
            .or_else(|| self.tables.iter().find(|t| t.matches_qualifier(qualifier)))
    }

    /// CTE by name
    pub fn cte(&self, name: &str) -> Option<&CteDef> {
        self.ctes.get(&normalize_identifier(name))
    }

    /// Temp table by name
    pub fn temp_table(&self, name: &str) -> Option<&TempTableDef> {
        self.temp_tables.get(&normalize_identifier(name))
    }

    /// Innermost chunk (this one or a nested subquery) containing `pos`
    pub fn innermost_at(&self, pos: Position) -> &StatementChunk {
        self.subqueries
            .iter()
            .find(|sub| sub.span.contains(pos))
            .map(|sub| sub.innermost_at(pos))
            .unwrap_or(self)
    }

    /// Start position of the statement
    pub fn start(&self) -> Position {
        self.span.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employees(alias: Option<&str>) -> TableRef {
        TableRef::Table {
            database: None,
            schema: Some("dbo".to_string()),
            name: "Employees".to_string(),
            alias: alias.map(str::to_string),
        }
    }

    #[test]
    fn test_matches_qualifier_prefers_alias() {
        let aliased = employees(Some("e"));
        assert!(aliased.matches_qualifier("E"));
        assert!(!aliased.matches_qualifier("Employees"));

        let bare = employees(None);
        assert!(bare.matches_qualifier("employees"));
        assert!(bare.matches_qualifier("dbo.Employees"));
        assert!(bare.matches_qualifier("[Employees]"));
    }

    #[test]
    fn test_lookup_alias_ignores_dangling_entry() {
        let mut chunk = StatementChunk::default();
        chunk.aliases.insert("x".to_string(), employees(Some("x")));
        assert!(chunk.lookup_alias("x").is_none());

        chunk.tables.push(employees(Some("x")));
        assert!(chunk.lookup_alias("X").is_some());
    }

    #[test]
    fn test_innermost_at_descends() {
        let inner = StatementChunk {
            span: Span::new(Position::new(1, 10), Position::new(1, 20)),
            statement_type: StatementType::Select,
            ..Default::default()
        };
        let outer = StatementChunk {
            span: Span::new(Position::new(1, 1), Position::new(1, 30)),
            subqueries: vec![inner.clone()],
            ..Default::default()
        };
        assert_eq!(outer.innermost_at(Position::new(1, 12)), &inner);
        assert_eq!(outer.innermost_at(Position::new(1, 25)), &outer);
    }

    #[test]
    fn test_statement_type_from_keyword() {
        assert_eq!(StatementType::from_keyword("with"), StatementType::Select);
        assert_eq!(StatementType::from_keyword("EXECUTE"), StatementType::Exec);
        assert_eq!(StatementType::from_keyword("grant"), StatementType::Other);
    }
}
