// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlctx context
//!
//! Decides what kind of identifier is expected at a cursor position.
//!
//! ## Overview
//!
//! [`ContextEngine`] classifies a cursor in a parsed buffer into a
//! [`ContextResult`]: a [`ContextType`] (table, column, schema, ...), a
//! [`ContextMode`] that refines it, the prefix typed so far and hints that
//! narrow the candidates (qualifiers, DML targets, positional INSERT columns,
//! EXEC parameters).
//!
//! Detection is clause-first. Positions the parsed clauses cannot place fall
//! back to a backward token scan ([`scan`]) and finally to a regex classifier
//! over the raw text ([`text`]).
//!
//! ## Examples
//!
//! ```rust
//! use sqlctx_context::{ContextEngine, ContextMode, ContextType};
//! use sqlctx_grammar::ParsedBuffer;
//! use sqlctx_ir::{Dialect, Position};
//!
//! let buffer = ParsedBuffer::parse("SELECT e. FROM Employees e", Dialect::SqlServer);
//! let result = ContextEngine::new(&buffer).detect(Position::new(1, 10));
//! assert_eq!(result.kind, ContextType::Column);
//! assert_eq!(result.mode, ContextMode::Qualified);
//! assert_eq!(result.hints.table_ref.as_deref(), Some("e"));
//! ```

pub mod anchor;
pub mod engine;
pub mod keywords;
pub mod positional;
pub mod qualified;
pub mod result;
pub mod scan;
pub mod text;
pub mod tokens;

// Re-export commonly used types
pub use anchor::Anchor;
pub use engine::ContextEngine;
pub use keywords::{KeywordProvider, KeywordSet, SqlKeyword};
pub use qualified::{ObjectReference, interpret};
pub use result::{ContextHints, ContextMode, ContextResult, ContextType, DetectedContext, LeftSideColumn};
pub use text::classify_text;
pub use tokens::{
    CursorTokens, extract_left_side_column, extract_prefix_and_trigger, is_dot_triggered,
    is_in_string_or_comment, reference_before_dot,
};
