// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect Support
//!
//! Dialects change two things for the context engine:
//!
//! - **Scanning**: which characters delimit identifiers and whether `GO`
//!   separates batches
//! - **Resolution**: whether the catalog has a schema level between databases
//!   and objects
//!
//! ## Dialect Families
//!
//! - **SQL Server family**: `[bracketed]` identifiers, `GO` batches, `#temp`
//!   tables, three-level `database.schema.object` names
//! - **MySQL family**: `` `backtick` `` identifiers, databases act as schemas
//! - **PostgreSQL family**: `"double-quoted"` identifiers, schemas per database

use serde::{Deserialize, Serialize};

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Dialect {
    /// Microsoft SQL Server / Azure SQL
    #[default]
    SqlServer,
    /// MySQL (5.7, 8.0)
    MySQL,
    /// PostgreSQL (12+)
    PostgreSQL,
    /// SQLite
    SQLite,
}

impl Dialect {
    /// Whether objects live under a schema level inside each database
    pub fn supports_schemas(&self) -> bool {
        matches!(self, Dialect::SqlServer | Dialect::PostgreSQL)
    }

    /// Whether `GO` on its own line separates batches
    pub fn supports_batch_separator(&self) -> bool {
        matches!(self, Dialect::SqlServer)
    }

    /// Whether `[name]` is an identifier (otherwise `[` is punctuation)
    pub fn bracket_identifiers(&self) -> bool {
        matches!(self, Dialect::SqlServer | Dialect::SQLite)
    }

    /// Whether `"name"` is an identifier rather than a string literal
    pub fn double_quote_identifiers(&self) -> bool {
        !matches!(self, Dialect::MySQL)
    }

    /// Whether `` `name` `` is an identifier
    pub fn backtick_identifiers(&self) -> bool {
        matches!(self, Dialect::MySQL | Dialect::SQLite)
    }

    /// Schema objects land in when none is written
    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            Dialect::SqlServer => Some("dbo"),
            Dialect::PostgreSQL => Some("public"),
            Dialect::MySQL | Dialect::SQLite => None,
        }
    }

    /// Parse a dialect name as used in configuration
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" | "tsql" => Some(Dialect::SqlServer),
            "mysql" | "mariadb" => Some(Dialect::MySQL),
            "postgresql" | "postgres" => Some(Dialect::PostgreSQL),
            "sqlite" => Some(Dialect::SQLite),
            _ => None,
        }
    }
}
