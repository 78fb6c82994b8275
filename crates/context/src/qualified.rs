// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Qualified-name interpretation
//!
//! Completion is requested for the *next* unwritten segment, so the same raw
//! text means different things depending on whether its trailing dot has been
//! typed yet:
//!
//! | text              | trailing dot                  | complete                 |
//! |-------------------|-------------------------------|--------------------------|
//! | `a`               | objects of schema `a`         | alias `a`                |
//! | `a.b`             | objects of `a`'s schema `b`   | table `b` in schema `a`  |
//! | `a.b.c`           | columns of `a.b.c`            | table `c` in `a.b`       |
//!
//! A trailing one-part qualifier may also name a database; that reading is
//! kept as a `potential_database` hint for the resolver to settle.

use crate::result::ContextHints;
use sqlctx_ir::QualifiedName;

/// What an object-position reference designates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectReference {
    /// `a.` : objects of schema `a`, or schemas of database `a`
    Schema { schema: String },
    /// `a.b.` : objects of schema `b` in database `a`
    DatabaseSchema { database: String, schema: Option<String> },
    /// `a.b.c.` : columns of an object
    Object {
        database: Option<String>,
        schema: Option<String>,
        object: String,
    },
    /// `a` : an alias
    Alias { alias: String },
    /// `a.b` : table in a schema
    SchemaTable { schema: Option<String>, table: String },
    /// `a.b.c` : table in a database's schema
    DatabaseSchemaTable {
        database: String,
        schema: Option<String>,
        table: String,
    },
}

fn non_empty(part: &str) -> Option<String> {
    (!part.is_empty()).then(|| part.to_string())
}

/// Interpret a reference in a table position (FROM, JOIN, INTO, EXEC, ...)
pub fn interpret(name: &QualifiedName) -> Option<ObjectReference> {
    let parts = name.as_strs();
    let reference = match (name.has_trailing_dot, parts.as_slice()) {
        (true, [schema]) => ObjectReference::Schema {
            schema: schema.to_string(),
        },
        (true, [database, schema]) => ObjectReference::DatabaseSchema {
            database: database.to_string(),
            schema: non_empty(schema),
        },
        (true, [.., database, schema, object]) => ObjectReference::Object {
            database: non_empty(database),
            schema: non_empty(schema),
            object: object.to_string(),
        },
        (false, [alias]) => ObjectReference::Alias {
            alias: alias.to_string(),
        },
        (false, [schema, table]) => ObjectReference::SchemaTable {
            schema: non_empty(schema),
            table: table.to_string(),
        },
        (false, [.., database, schema, table]) => ObjectReference::DatabaseSchemaTable {
            database: database.to_string(),
            schema: non_empty(schema),
            table: table.to_string(),
        },
        _ => return None,
    };
    Some(reference)
}

/// Hints for completing objects after a trailing-dot qualifier
///
/// Returns `None` when the qualifier already names an object, which makes the
/// position a column position instead.
pub fn object_hints(qualifier: &QualifiedName) -> Option<ContextHints> {
    let hints = match interpret(qualifier)? {
        ObjectReference::Schema { schema } => ContextHints {
            potential_database: Some(schema.clone()),
            filter_schema: Some(schema),
            omit_schema: true,
            ..Default::default()
        },
        ObjectReference::DatabaseSchema { database, schema } => ContextHints {
            filter_database: Some(database),
            filter_schema: schema,
            omit_schema: true,
            ..Default::default()
        },
        _ => return None,
    };
    Some(hints)
}

/// Hints for completing columns after a qualifier: `e.`, `dbo.Employees.`,
/// `Hr.dbo.Employees.`
pub fn column_hints(qualifier: &QualifiedName) -> ContextHints {
    let parts = qualifier.as_strs();
    let n = parts.len();
    let part = |back: usize| n.checked_sub(back).and_then(|i| non_empty(parts[i]));
    ContextHints {
        table_ref: part(1),
        schema: part(2),
        database: part(3),
        omit_table: true,
        ..Default::default()
    }
}
