// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database catalog information
//!
//! This module defines the types loaders return when a catalog level is
//! populated: objects (tables, views, routines, synonyms), their columns and
//! their parameters.

use serde::{Deserialize, Serialize};

/// SQL data types (unified across dialects)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataType {
    // Numeric types
    Integer,
    BigInt,
    SmallInt,
    TinyInt,
    Decimal,
    Float,
    Money,

    // String types
    Varchar(Option<usize>),
    NVarchar(Option<usize>),
    Char(Option<usize>),
    Text,

    // Binary types
    VarBinary(Option<usize>),

    // Date/Time types
    Date,
    Time,
    DateTime,
    Timestamp,

    Boolean,
    Uuid,

    // Unknown/Other (with original type name)
    Other(String),
}

/// Coarse grouping used to decide whether two columns can be compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataTypeFamily {
    Numeric,
    String,
    Temporal,
    Binary,
    Boolean,
    Uuid,
    Other,
}

impl DataType {
    /// Parse a type name as reported by a catalog, e.g. `nvarchar(50)`
    pub fn from_sql_name(raw: &str) -> Self {
        let raw = raw.trim();
        let (base, length) = match raw.find('(') {
            Some(open) => {
                let inner = raw[open + 1..].trim_end_matches(')');
                (raw[..open].trim(), inner.split(',').next().and_then(|n| n.trim().parse().ok()))
            }
            None => (raw, None),
        };

        match base.to_ascii_lowercase().as_str() {
            "int" | "integer" | "int4" => DataType::Integer,
            "bigint" | "int8" => DataType::BigInt,
            "smallint" | "int2" => DataType::SmallInt,
            "tinyint" => DataType::TinyInt,
            "decimal" | "numeric" => DataType::Decimal,
            "float" | "real" | "double" | "double precision" => DataType::Float,
            "money" | "smallmoney" => DataType::Money,
            "varchar" | "character varying" => DataType::Varchar(length),
            "nvarchar" => DataType::NVarchar(length),
            "char" | "nchar" | "character" => DataType::Char(length),
            "text" | "ntext" => DataType::Text,
            "varbinary" | "binary" | "image" | "bytea" | "blob" => DataType::VarBinary(length),
            "date" => DataType::Date,
            "time" => DataType::Time,
            "datetime" | "datetime2" | "smalldatetime" => DataType::DateTime,
            "timestamp" | "datetimeoffset" | "timestamptz" => DataType::Timestamp,
            "bit" | "bool" | "boolean" => DataType::Boolean,
            "uniqueidentifier" | "uuid" => DataType::Uuid,
            _ => DataType::Other(raw.to_string()),
        }
    }

    /// Family this type belongs to
    pub fn family(&self) -> DataTypeFamily {
        match self {
            DataType::Integer
            | DataType::BigInt
            | DataType::SmallInt
            | DataType::TinyInt
            | DataType::Decimal
            | DataType::Float
            | DataType::Money => DataTypeFamily::Numeric,
            DataType::Varchar(_) | DataType::NVarchar(_) | DataType::Char(_) | DataType::Text => {
                DataTypeFamily::String
            }
            DataType::VarBinary(_) => DataTypeFamily::Binary,
            DataType::Date | DataType::Time | DataType::DateTime | DataType::Timestamp => {
                DataTypeFamily::Temporal
            }
            DataType::Boolean => DataTypeFamily::Boolean,
            DataType::Uuid => DataTypeFamily::Uuid,
            DataType::Other(_) => DataTypeFamily::Other,
        }
    }

    /// Best-effort comparability check; unknown types are compatible with anything
    pub fn is_compatible_with(&self, other: &DataType) -> bool {
        let (a, b) = (self.family(), other.family());
        a == b || a == DataTypeFamily::Other || b == DataTypeFamily::Other
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sized = |f: &mut std::fmt::Formatter<'_>, name: &str, len: &Option<usize>| match len {
            Some(n) => write!(f, "{}({})", name, n),
            None => f.write_str(name),
        };
        match self {
            DataType::Integer => f.write_str("int"),
            DataType::BigInt => f.write_str("bigint"),
            DataType::SmallInt => f.write_str("smallint"),
            DataType::TinyInt => f.write_str("tinyint"),
            DataType::Decimal => f.write_str("decimal"),
            DataType::Float => f.write_str("float"),
            DataType::Money => f.write_str("money"),
            DataType::Varchar(len) => sized(f, "varchar", len),
            DataType::NVarchar(len) => sized(f, "nvarchar", len),
            DataType::Char(len) => sized(f, "char", len),
            DataType::Text => f.write_str("text"),
            DataType::VarBinary(len) => sized(f, "varbinary", len),
            DataType::Date => f.write_str("date"),
            DataType::Time => f.write_str("time"),
            DataType::DateTime => f.write_str("datetime"),
            DataType::Timestamp => f.write_str("timestamp"),
            DataType::Boolean => f.write_str("bit"),
            DataType::Uuid => f.write_str("uniqueidentifier"),
            DataType::Other(raw) => f.write_str(raw),
        }
    }
}

/// Kind of schema-level catalog object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Function,
    Synonym,
}

impl ObjectKind {
    /// Whether columns can be selected from this kind of object
    pub fn has_columns(&self) -> bool {
        matches!(self, ObjectKind::Table | ObjectKind::View | ObjectKind::Synonym)
    }

    /// Whether this kind of object takes parameters
    pub fn has_parameters(&self) -> bool {
        matches!(self, ObjectKind::Procedure | ObjectKind::Function)
    }
}

/// Metadata for a schema-level object, as returned by a loader listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub name: String,
    pub kind: ObjectKind,
    /// Target of a synonym, as written in its definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ObjectMetadata {
    /// Create a new object with builder pattern
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            target: None,
        }
    }

    /// Builder method: set synonym target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Metadata for a database column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Whether the column is nullable
    #[serde(default)]
    pub nullable: bool,
    /// Whether this is a primary key column
    #[serde(default)]
    pub is_primary_key: bool,
    /// Referenced `table.column` when this is a foreign key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl ColumnMetadata {
    /// Create a new column metadata with builder pattern
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            is_primary_key: false,
            references: None,
        }
    }

    /// Builder method: set nullable
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Builder method: mark as primary key
    pub fn with_primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Builder method: set foreign key reference
    pub fn with_foreign_key(mut self, table: &str, column: &str) -> Self {
        self.references = Some(format!("{}.{}", table, column));
        self
    }
}

/// Procedure or function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    /// Parameter name, including a leading `@` where the engine uses one
    pub name: String,
    pub data_type: DataType,
    /// 1-indexed ordinal
    pub ordinal: u32,
    #[serde(default)]
    pub is_output: bool,
    #[serde(default)]
    pub has_default: bool,
}

impl ParameterMetadata {
    /// Create new parameter metadata with builder pattern
    pub fn new(name: impl Into<String>, data_type: DataType, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            data_type,
            ordinal,
            is_output: false,
            has_default: false,
        }
    }

    /// Builder method: mark as OUTPUT
    pub fn with_output(mut self) -> Self {
        self.is_output = true;
        self
    }

    /// Builder method: mark as having a default value
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}
