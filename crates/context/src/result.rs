// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Context results
//!
//! What the engine reports for a cursor: the kind of identifier expected, a
//! sub-routing mode, the partially typed prefix and hints that narrow the
//! candidate set. Results are computed per request and never cached.

use serde::{Deserialize, Serialize};

/// Kind of identifier expected at the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    #[default]
    Unknown,
    Keyword,
    Database,
    Schema,
    Table,
    Column,
    Procedure,
    Parameter,
    Alias,
}

impl ContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Unknown => "unknown",
            ContextType::Keyword => "keyword",
            ContextType::Database => "database",
            ContextType::Schema => "schema",
            ContextType::Table => "table",
            ContextType::Column => "column",
            ContextType::Procedure => "procedure",
            ContextType::Parameter => "parameter",
            ContextType::Alias => "alias",
        }
    }
}

/// Sub-routing tag refining a [`ContextType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    Select,
    /// Column after an explicit `qualifier.`
    Qualified,
    From,
    /// Object after `schema.` or `database.schema.`
    FromQualified,
    Join,
    On,
    Where,
    Having,
    GroupBy,
    OrderBy,
    Set,
    Into,
    Update,
    Delete,
    Merge,
    Using,
    Values,
    InsertColumns,
    Output,
    OutputInto,
    Exec,
    ExecParams,
    MergeInsert,
    MergeValues,
    Use,
    /// Right after a complete table reference
    AfterTable,
    StatementStart,
    #[default]
    General,
}

impl ContextMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::Select => "select",
            ContextMode::Qualified => "qualified",
            ContextMode::From => "from",
            ContextMode::FromQualified => "from_qualified",
            ContextMode::Join => "join",
            ContextMode::On => "on",
            ContextMode::Where => "where",
            ContextMode::Having => "having",
            ContextMode::GroupBy => "group_by",
            ContextMode::OrderBy => "order_by",
            ContextMode::Set => "set",
            ContextMode::Into => "into",
            ContextMode::Update => "update",
            ContextMode::Delete => "delete",
            ContextMode::Merge => "merge",
            ContextMode::Using => "using",
            ContextMode::Values => "values",
            ContextMode::InsertColumns => "insert_columns",
            ContextMode::Output => "output",
            ContextMode::OutputInto => "output_into",
            ContextMode::Exec => "exec",
            ContextMode::ExecParams => "exec_params",
            ContextMode::MergeInsert => "merge_insert",
            ContextMode::MergeValues => "merge_values",
            ContextMode::Use => "use",
            ContextMode::AfterTable => "after_table",
            ContextMode::StatementStart => "statement_start",
            ContextMode::General => "general",
        }
    }
}

impl std::fmt::Display for ContextMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column on the other side of a comparison, e.g. `e.DepartmentID` in
/// `WHERE e.DepartmentID = █`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeftSideColumn {
    /// Reference as written, delimiters stripped
    pub qualified: String,
    pub table_ref: Option<String>,
    pub column_name: String,
    pub schema: Option<String>,
}

/// Narrowing information gathered around the cursor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextHints {
    /// Qualifier naming the table whose columns are completed (alias or name)
    pub table_ref: Option<String>,
    /// Schema written in front of `table_ref`
    pub schema: Option<String>,
    /// Database written in front of `schema`
    pub database: Option<String>,
    /// Restrict objects to this schema
    pub filter_schema: Option<String>,
    /// Restrict objects to this database
    pub filter_database: Option<String>,
    /// Restrict columns to this table (DML target)
    pub filter_table: Option<String>,
    /// The schema is already written; insert bare object names
    pub omit_schema: bool,
    /// The qualifier is already written; insert bare column names
    pub omit_table: bool,
    pub left_side_column: Option<LeftSideColumn>,
    /// Zero-based comma position inside a VALUES row, column list or EXEC call
    pub value_position: Option<usize>,
    /// Target of the enclosing INSERT or MERGE
    pub insert_table: Option<String>,
    /// Explicit column list of the enclosing INSERT or MERGE INSERT
    pub insert_columns: Vec<String>,
    /// Routine named by an EXEC
    pub routine: Option<String>,
    /// Parameters already assigned by name in an EXEC call
    pub used_parameters: Vec<String>,
    /// A trailing one-part qualifier that may name a database instead of a schema
    pub potential_database: Option<String>,
}

impl ContextHints {
    /// Insert column matching `value_position`, if the statement lists columns
    pub fn positional_column(&self) -> Option<&str> {
        self.value_position
            .and_then(|i| self.insert_columns.get(i))
            .map(String::as_str)
    }
}

/// Classification of a cursor position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextResult {
    pub kind: ContextType,
    pub mode: ContextMode,
    /// Identifier text typed so far, delimiters stripped
    pub prefix: String,
    /// Character that triggered the request (`.`, `@`, `[`), if any
    pub trigger: Option<char>,
    pub hints: ContextHints,
}

impl ContextResult {
    pub fn new(kind: ContextType, mode: ContextMode) -> Self {
        Self {
            kind,
            mode,
            ..Default::default()
        }
    }

    /// Keyword context at the start of a statement
    pub fn statement_start() -> Self {
        Self::new(ContextType::Keyword, ContextMode::StatementStart)
    }

    pub fn with_hints(mut self, hints: ContextHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, trigger: Option<char>) -> Self {
        self.prefix = prefix.into();
        self.trigger = trigger;
        self
    }
}

/// A [`ContextResult`] plus whether completion should be offered at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedContext {
    pub result: ContextResult,
    /// False inside strings and comments
    pub should_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serializes_snake_case() {
        let json = serde_json::to_string(&ContextMode::FromQualified).unwrap();
        assert_eq!(json, "\"from_qualified\"");
        assert_eq!(ContextMode::ExecParams.as_str(), "exec_params");
        assert_eq!(ContextMode::OutputInto.to_string(), "output_into");
    }

    #[test]
    fn test_type_serializes_snake_case() {
        let json = serde_json::to_string(&ContextType::Column).unwrap();
        assert_eq!(json, "\"column\"");
        assert_eq!(ContextType::default(), ContextType::Unknown);
    }

    #[test]
    fn test_positional_column() {
        let hints = ContextHints {
            value_position: Some(1),
            insert_columns: vec!["EmployeeID".into(), "FirstName".into()],
            ..Default::default()
        };
        assert_eq!(hints.positional_column(), Some("FirstName"));

        let past_end = ContextHints {
            value_position: Some(5),
            ..hints
        };
        assert_eq!(past_end.positional_column(), None);
    }
}
