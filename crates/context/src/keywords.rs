// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Keywords for Completion
//!
//! Keyword sets organized by context mode, statement type and dialect.

use crate::result::{ContextMode, ContextResult, ContextType};
use sqlctx_ir::{Dialect, StatementType};
use std::collections::HashSet;

/// SQL keyword with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SqlKeyword {
    /// The keyword text
    pub label: String,
    /// Optional description/documentation
    pub description: Option<String>,
    /// Sort order (lower = higher priority)
    pub sort_priority: i32,
}

impl SqlKeyword {
    pub fn new(label: &str, description: Option<&str>, sort_priority: i32) -> Self {
        Self {
            label: label.to_uppercase(),
            description: description.map(|d| d.to_string()),
            sort_priority,
        }
    }

    /// Keyword without description
    pub fn simple(label: &str, sort_priority: i32) -> Self {
        Self::new(label, None, sort_priority)
    }
}

/// Keyword set for a specific context
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    pub keywords: Vec<SqlKeyword>,
}

impl KeywordSet {
    pub fn new(keywords: Vec<SqlKeyword>) -> Self {
        Self { keywords }
    }

    /// Keyword labels for filtering
    pub fn labels(&self) -> HashSet<String> {
        self.keywords.iter().map(|k| k.label.clone()).collect()
    }

    /// Keywords not in `exclude`
    pub fn exclude(&self, exclude: &HashSet<String>) -> Vec<SqlKeyword> {
        self.keywords
            .iter()
            .filter(|k| !exclude.contains(&k.label))
            .cloned()
            .collect()
    }

    /// Keywords whose label starts with `prefix`, case-insensitively
    pub fn matching(&self, prefix: &str) -> Vec<&SqlKeyword> {
        let prefix = prefix.to_uppercase();
        self.keywords
            .iter()
            .filter(|k| k.label.starts_with(&prefix))
            .collect()
    }

    fn extend(&mut self, other: KeywordSet) {
        let offset = self.keywords.len() as i32;
        let seen = self.labels();
        self.keywords.extend(
            other
                .keywords
                .into_iter()
                .filter(|k| !seen.contains(&k.label))
                .map(|mut k| {
                    k.sort_priority += offset;
                    k
                }),
        );
    }
}

/// Keyword provider for different SQL contexts
#[derive(Debug, Clone, Copy)]
pub struct KeywordProvider {
    dialect: Dialect,
}

impl KeywordProvider {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Keywords for a classified cursor inside a statement of type `statement`
    pub fn keywords_for(&self, context: &ContextResult, statement: StatementType) -> KeywordSet {
        if context.kind != ContextType::Keyword {
            return KeywordSet::default();
        }
        match context.mode {
            ContextMode::StatementStart => self.statement_keywords(),
            ContextMode::AfterTable => self.after_table_keywords(statement),
            _ => self.statement_body_keywords(statement),
        }
    }

    /// Keywords that start a statement
    pub fn statement_keywords(&self) -> KeywordSet {
        let mut keywords = vec![
            SqlKeyword::new("SELECT", Some("Retrieve data from tables"), 1),
            SqlKeyword::new("INSERT", Some("Insert new rows into a table"), 2),
            SqlKeyword::new("UPDATE", Some("Modify existing rows in a table"), 3),
            SqlKeyword::new("DELETE", Some("Delete rows from a table"), 4),
            SqlKeyword::new("WITH", Some("Common Table Expression (CTE)"), 5),
            SqlKeyword::new("CREATE", Some("Create database objects"), 6),
            SqlKeyword::new("ALTER", Some("Modify database objects"), 7),
            SqlKeyword::new("DROP", Some("Remove database objects"), 8),
        ];

        match self.dialect {
            Dialect::SqlServer => {
                keywords.push(SqlKeyword::new("MERGE", Some("Insert, update or delete against a source"), 9));
                keywords.push(SqlKeyword::new("EXEC", Some("Execute a stored procedure"), 10));
                keywords.push(SqlKeyword::new("DECLARE", Some("Declare a variable"), 11));
                keywords.push(SqlKeyword::new("USE", Some("Change the current database"), 12));
                keywords.push(SqlKeyword::new("TRUNCATE TABLE", Some("Remove all rows from a table"), 13));
                keywords.push(SqlKeyword::new("BEGIN TRANSACTION", Some("Start a transaction"), 14));
            }
            Dialect::MySQL => {
                keywords.push(SqlKeyword::new("USE", Some("Change the current database"), 9));
                keywords.push(SqlKeyword::new("TRUNCATE", Some("Remove all rows from a table"), 10));
                keywords.push(SqlKeyword::new("CALL", Some("Call a stored procedure"), 11));
            }
            _ => {
                keywords.push(SqlKeyword::new("TRUNCATE", Some("Remove all rows from a table"), 9));
            }
        }

        KeywordSet::new(keywords)
    }

    /// Keywords inside a SELECT statement
    pub fn select_clause_keywords(&self) -> KeywordSet {
        let mut keywords = vec![
            SqlKeyword::new("CASE", Some("Conditional expression"), 1),
            SqlKeyword::new("FROM", Some("Specify tables to query"), 2),
            SqlKeyword::new("WHERE", Some("Filter rows"), 3),
            SqlKeyword::new("GROUP BY", Some("Group rows by values"), 4),
            SqlKeyword::new("HAVING", Some("Filter groups"), 5),
            SqlKeyword::new("ORDER BY", Some("Sort result rows"), 6),
            SqlKeyword::new("DISTINCT", Some("Remove duplicate rows"), 7),
            SqlKeyword::new("AS", Some("Alias for columns or tables"), 8),
            SqlKeyword::new("INTO", Some("Select into a new table"), 9),
            SqlKeyword::new("UNION", Some("Combine result sets"), 10),
            SqlKeyword::new("UNION ALL", Some("Combine result sets with duplicates"), 11),
            SqlKeyword::new("INTERSECT", Some("Intersection of result sets"), 12),
            SqlKeyword::new("EXCEPT", Some("Difference of result sets"), 13),
        ];

        match self.dialect {
            Dialect::SqlServer => {
                keywords.push(SqlKeyword::new("TOP", Some("Limit number of rows"), 14));
                keywords.push(SqlKeyword::new("OFFSET", Some("Skip rows before fetching"), 15));
                keywords.push(SqlKeyword::new("FETCH NEXT", Some("Fetch a number of rows"), 16));
            }
            Dialect::PostgreSQL => {
                keywords.push(SqlKeyword::new("LIMIT", Some("Limit number of rows"), 14));
                keywords.push(SqlKeyword::new("OFFSET", Some("Skip rows before limiting"), 15));
                keywords.push(SqlKeyword::new("FETCH", Some("Fetch specific rows"), 16));
                keywords.push(SqlKeyword::new("FOR UPDATE", Some("Lock selected rows"), 17));
            }
            Dialect::MySQL => {
                keywords.push(SqlKeyword::new("LIMIT", Some("Limit number of rows"), 14));
                keywords.push(SqlKeyword::new("OFFSET", Some("Skip rows before limiting"), 15));
                keywords.push(SqlKeyword::new("FOR UPDATE", Some("Lock selected rows"), 16));
            }
            _ => {
                keywords.push(SqlKeyword::new("LIMIT", Some("Limit number of rows"), 14));
                keywords.push(SqlKeyword::new("OFFSET", Some("Skip rows before limiting"), 15));
            }
        }

        KeywordSet::new(keywords)
    }

    /// JOIN keywords, including APPLY on SQL Server
    pub fn join_type_keywords(&self) -> KeywordSet {
        let mut keywords = vec![
            SqlKeyword::new("JOIN", Some("Join with another table"), 1),
            SqlKeyword::new("INNER JOIN", Some("Inner join with another table"), 2),
            SqlKeyword::new("LEFT JOIN", Some("Left outer join"), 3),
            SqlKeyword::new("RIGHT JOIN", Some("Right outer join"), 4),
            SqlKeyword::new("FULL JOIN", Some("Full outer join"), 5),
            SqlKeyword::new("CROSS JOIN", Some("Cross join"), 6),
        ];
        if self.dialect == Dialect::SqlServer {
            keywords.push(SqlKeyword::new("CROSS APPLY", Some("Apply a table function per row"), 7));
            keywords.push(SqlKeyword::new("OUTER APPLY", Some("Apply, keeping unmatched rows"), 8));
        }
        KeywordSet::new(keywords)
    }

    /// Expression and operator keywords
    pub fn expression_keywords(&self) -> KeywordSet {
        let keywords = vec![
            SqlKeyword::new("AND", Some("Logical AND"), 1),
            SqlKeyword::new("OR", Some("Logical OR"), 2),
            SqlKeyword::new("NOT", Some("Logical NOT"), 3),
            SqlKeyword::new("IN", Some("Value in list"), 4),
            SqlKeyword::new("EXISTS", Some("Subquery exists"), 5),
            SqlKeyword::new("BETWEEN", Some("Value between range"), 6),
            SqlKeyword::new("LIKE", Some("Pattern matching"), 7),
            SqlKeyword::new("IS NULL", Some("Check if value is NULL"), 8),
            SqlKeyword::new("IS NOT NULL", Some("Check if value is not NULL"), 9),
            SqlKeyword::new("CASE", Some("Conditional expression"), 10),
            SqlKeyword::new("WHEN", Some("CASE WHEN condition"), 11),
            SqlKeyword::new("THEN", Some("CASE THEN result"), 12),
            SqlKeyword::new("ELSE", Some("CASE ELSE default"), 13),
            SqlKeyword::new("END", Some("END CASE expression"), 14),
            SqlKeyword::new("NULL", Some("NULL value"), 15),
            SqlKeyword::new("CAST", Some("Cast to type"), 16),
            SqlKeyword::new("COALESCE", Some("First non-NULL value"), 17),
            SqlKeyword::new("NULLIF", Some("NULL if equal"), 18),
        ];

        KeywordSet::new(keywords)
    }

    /// Keywords that may follow a complete table reference
    pub fn after_table_keywords(&self, statement: StatementType) -> KeywordSet {
        let mut set = KeywordSet::new(vec![SqlKeyword::new("AS", Some("Alias the table"), 1)]);
        match statement {
            StatementType::Update => set.extend(self.update_keywords()),
            StatementType::Delete => set.extend(self.delete_keywords()),
            StatementType::Insert => set.extend(self.insert_keywords()),
            StatementType::Merge => set.extend(self.merge_keywords()),
            _ => {
                set.extend(self.join_type_keywords());
                set.extend(KeywordSet::new(vec![
                    SqlKeyword::new("ON", Some("Join condition"), 1),
                    SqlKeyword::new("WHERE", Some("Filter rows"), 2),
                    SqlKeyword::new("GROUP BY", Some("Group rows by values"), 3),
                    SqlKeyword::new("HAVING", Some("Filter groups"), 4),
                    SqlKeyword::new("ORDER BY", Some("Sort result rows"), 5),
                    SqlKeyword::new("UNION", Some("Combine result sets"), 6),
                ]));
            }
        }
        if self.dialect == Dialect::SqlServer && statement == StatementType::Select {
            set.extend(KeywordSet::new(vec![SqlKeyword::new("WITH (NOLOCK)", Some("Table hint"), 1)]));
        }
        set
    }

    /// General keywords inside a statement
    pub fn statement_body_keywords(&self, statement: StatementType) -> KeywordSet {
        let mut set = match statement {
            StatementType::Insert => self.insert_keywords(),
            StatementType::Update => self.update_keywords(),
            StatementType::Delete => self.delete_keywords(),
            StatementType::Merge => self.merge_keywords(),
            StatementType::Create => self.create_keywords(),
            StatementType::Alter => self.alter_keywords(),
            StatementType::Drop => self.drop_keywords(),
            _ => self.select_clause_keywords(),
        };
        set.extend(self.expression_keywords());
        set
    }

    /// INSERT statement keywords
    pub fn insert_keywords(&self) -> KeywordSet {
        let mut keywords = vec![
            SqlKeyword::new("INTO", Some("Insert into table"), 1),
            SqlKeyword::new("VALUES", Some("Insert values"), 2),
            SqlKeyword::new("SELECT", Some("Insert the rows of a query"), 3),
            SqlKeyword::new("DEFAULT VALUES", Some("Insert a row of defaults"), 4),
        ];
        match self.dialect {
            Dialect::SqlServer => keywords.push(SqlKeyword::new("OUTPUT", Some("Return inserted rows"), 5)),
            Dialect::MySQL => keywords.push(SqlKeyword::new("ON DUPLICATE KEY UPDATE", Some("MySQL upsert"), 5)),
            _ => keywords.push(SqlKeyword::new("RETURNING", Some("Return inserted rows"), 5)),
        }
        KeywordSet::new(keywords)
    }

    /// UPDATE statement keywords
    pub fn update_keywords(&self) -> KeywordSet {
        let mut keywords = vec![
            SqlKeyword::new("SET", Some("Set column values"), 1),
            SqlKeyword::new("WHERE", Some("Filter rows to update"), 2),
            SqlKeyword::new("FROM", Some("Additional source tables"), 3),
        ];
        if self.dialect == Dialect::SqlServer {
            keywords.push(SqlKeyword::new("OUTPUT", Some("Return updated rows"), 4));
        } else if self.dialect == Dialect::PostgreSQL {
            keywords.push(SqlKeyword::new("RETURNING", Some("Return updated rows"), 4));
        }
        KeywordSet::new(keywords)
    }

    /// DELETE statement keywords
    pub fn delete_keywords(&self) -> KeywordSet {
        let mut keywords = vec![
            SqlKeyword::new("FROM", Some("Delete from table"), 1),
            SqlKeyword::new("WHERE", Some("Filter rows to delete"), 2),
        ];
        if self.dialect == Dialect::SqlServer {
            keywords.push(SqlKeyword::new("OUTPUT", Some("Return deleted rows"), 3));
        } else if self.dialect == Dialect::PostgreSQL {
            keywords.push(SqlKeyword::new("RETURNING", Some("Return deleted rows"), 3));
        }
        KeywordSet::new(keywords)
    }

    /// MERGE statement keywords
    pub fn merge_keywords(&self) -> KeywordSet {
        let keywords = vec![
            SqlKeyword::new("INTO", Some("Target table"), 1),
            SqlKeyword::new("USING", Some("Source table or query"), 2),
            SqlKeyword::new("ON", Some("Match condition"), 3),
            SqlKeyword::new("WHEN MATCHED THEN", Some("Act on matching rows"), 4),
            SqlKeyword::new("WHEN NOT MATCHED THEN", Some("Act on source-only rows"), 5),
            SqlKeyword::new("WHEN NOT MATCHED BY SOURCE THEN", Some("Act on target-only rows"), 6),
            SqlKeyword::new("UPDATE SET", Some("Update matched rows"), 7),
            SqlKeyword::new("INSERT", Some("Insert unmatched rows"), 8),
            SqlKeyword::new("DELETE", Some("Delete matched rows"), 9),
            SqlKeyword::new("OUTPUT", Some("Return affected rows"), 10),
        ];
        KeywordSet::new(keywords)
    }

    /// CREATE statement keywords
    pub fn create_keywords(&self) -> KeywordSet {
        let mut keywords = vec![
            SqlKeyword::new("TABLE", Some("Create table"), 1),
            SqlKeyword::new("INDEX", Some("Create index"), 2),
            SqlKeyword::new("VIEW", Some("Create view"), 3),
            SqlKeyword::new("DATABASE", Some("Create database"), 4),
            SqlKeyword::new("SCHEMA", Some("Create schema"), 5),
            SqlKeyword::new("FUNCTION", Some("Create function"), 6),
            SqlKeyword::new("PROCEDURE", Some("Create procedure"), 7),
            SqlKeyword::new("TRIGGER", Some("Create trigger"), 8),
        ];
        if self.dialect == Dialect::SqlServer {
            keywords.push(SqlKeyword::new("SYNONYM", Some("Create synonym"), 9));
            keywords.push(SqlKeyword::new("OR ALTER", Some("Create or replace"), 10));
        } else {
            keywords.push(SqlKeyword::new("OR REPLACE", Some("Replace if exists"), 9));
        }
        KeywordSet::new(keywords)
    }

    /// ALTER statement keywords
    pub fn alter_keywords(&self) -> KeywordSet {
        let keywords = vec![
            SqlKeyword::new("TABLE", Some("Alter table"), 1),
            SqlKeyword::new("VIEW", Some("Alter view"), 2),
            SqlKeyword::new("DATABASE", Some("Alter database"), 3),
            SqlKeyword::new("SCHEMA", Some("Alter schema"), 4),
            SqlKeyword::new("FUNCTION", Some("Alter function"), 5),
            SqlKeyword::new("PROCEDURE", Some("Alter procedure"), 6),
            SqlKeyword::new("TRIGGER", Some("Alter trigger"), 7),
            SqlKeyword::new("INDEX", Some("Alter index"), 8),
        ];

        KeywordSet::new(keywords)
    }

    /// DROP statement keywords
    pub fn drop_keywords(&self) -> KeywordSet {
        let keywords = vec![
            SqlKeyword::new("TABLE", Some("Drop table"), 1),
            SqlKeyword::new("INDEX", Some("Drop index"), 2),
            SqlKeyword::new("VIEW", Some("Drop view"), 3),
            SqlKeyword::new("DATABASE", Some("Drop database"), 4),
            SqlKeyword::new("SCHEMA", Some("Drop schema"), 5),
            SqlKeyword::new("FUNCTION", Some("Drop function"), 6),
            SqlKeyword::new("PROCEDURE", Some("Drop procedure"), 7),
            SqlKeyword::new("TRIGGER", Some("Drop trigger"), 8),
            SqlKeyword::new("IF EXISTS", Some("Drop if exists"), 9),
        ];

        KeywordSet::new(keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(set: &KeywordSet) -> Vec<&str> {
        set.keywords.iter().map(|k| k.label.as_str()).collect()
    }

    #[test]
    fn test_sql_keyword_creation() {
        let kw = SqlKeyword::new("select", Some("Test description"), 1);
        assert_eq!(kw.label, "SELECT");
        assert_eq!(kw.description, Some("Test description".to_string()));
        assert_eq!(kw.sort_priority, 1);
    }

    #[test]
    fn test_keyword_set_exclude() {
        let set = KeywordSet::new(vec![
            SqlKeyword::simple("SELECT", 1),
            SqlKeyword::simple("FROM", 2),
            SqlKeyword::simple("WHERE", 3),
        ]);
        let exclude = HashSet::from(["FROM".to_string()]);
        let filtered = set.exclude(&exclude);
        assert_eq!(filtered.len(), 2);
        assert!(!filtered.iter().any(|k| k.label == "FROM"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let provider = KeywordProvider::new(Dialect::SqlServer);
        let set = provider.statement_keywords();
        let found: Vec<&str> = set.matching("se").iter().map(|k| k.label.as_str()).collect();
        assert_eq!(found, vec!["SELECT"]);
    }

    #[test]
    fn test_sql_server_statement_keywords() {
        let provider = KeywordProvider::new(Dialect::SqlServer);
        let set = provider.statement_keywords();
        let labels = labels(&set);
        assert!(labels.contains(&"MERGE"));
        assert!(labels.contains(&"EXEC"));
        assert!(labels.contains(&"USE"));

        let set = KeywordProvider::new(Dialect::PostgreSQL).statement_keywords();
        assert!(!labels_of(&set, "EXEC"));
    }

    fn labels_of(set: &KeywordSet, label: &str) -> bool {
        set.keywords.iter().any(|k| k.label == label)
    }

    #[test]
    fn test_row_limit_per_dialect() {
        let select = KeywordProvider::new(Dialect::SqlServer).select_clause_keywords();
        assert!(labels_of(&select, "TOP"));
        assert!(!labels_of(&select, "LIMIT"));

        let select = KeywordProvider::new(Dialect::MySQL).select_clause_keywords();
        assert!(labels_of(&select, "LIMIT"));
    }

    #[test]
    fn test_keywords_for_context() {
        let provider = KeywordProvider::new(Dialect::SqlServer);

        let start = provider.keywords_for(&ContextResult::statement_start(), StatementType::Other);
        assert!(labels_of(&start, "SELECT"));

        let after = ContextResult::new(ContextType::Keyword, ContextMode::AfterTable);
        let set = provider.keywords_for(&after, StatementType::Select);
        assert!(labels_of(&set, "WHERE"));
        assert!(labels_of(&set, "LEFT JOIN"));
        assert!(labels_of(&set, "CROSS APPLY"));

        let set = provider.keywords_for(&after, StatementType::Update);
        assert!(labels_of(&set, "SET"));
        assert!(!labels_of(&set, "LEFT JOIN"));

        let column = ContextResult::new(ContextType::Column, ContextMode::Select);
        assert!(provider.keywords_for(&column, StatementType::Select).keywords.is_empty());
    }

    #[test]
    fn test_extend_skips_duplicates() {
        let provider = KeywordProvider::new(Dialect::SqlServer);
        let set = provider.statement_body_keywords(StatementType::Select);
        let cases = set.keywords.iter().filter(|k| k.label == "CASE").count();
        assert_eq!(cases, 1);
    }
}
