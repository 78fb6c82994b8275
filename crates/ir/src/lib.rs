// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlctx - Shared Data Model
//!
//! This crate holds the types every other layer of the context engine agrees on:
//!
//! - **Positions**: 1-indexed line/column pairs and spans
//! - **Tokens**: the tokenizer's output contract
//! - **Statement model**: per-statement clause ranges and table inventory
//! - **Execution chunks**: the segmenter's output
//! - **Qualified names**: dotted references of 1 to 4 parts
//! - **Metadata**: catalog object and column descriptions
//! - **Dialects**: engine capabilities that change scanning and resolution
//!
//! Everything here is plain data. The types are rebuilt per edit generation and
//! never mutated in place by the layers that consume them.

pub mod chunk;
pub mod dialect;
pub mod metadata;
pub mod position;
pub mod qualified;
pub mod statement;
pub mod token;

// Re-export commonly used types
pub use chunk::ExecutionChunk;
pub use dialect::Dialect;
pub use metadata::{ColumnMetadata, DataType, DataTypeFamily, ObjectKind, ObjectMetadata, ParameterMetadata};
pub use position::{Position, Span};
pub use qualified::{QualifiedName, normalize_identifier, strip_delimiters};
pub use statement::{
    Clause, ClauseKind, CteDef, StatementChunk, StatementType, TableRef, TempTableDef,
};
pub use token::{Punct, Token, TokenKind};
