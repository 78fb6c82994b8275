// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlctx grammar
//!
//! Tokenizer and statement parser that produce the statement model consumed
//! by the context engine.
//!
//! ## Usage
//!
//! ```rust
//! use sqlctx_grammar::ParsedBuffer;
//! use sqlctx_ir::{ClauseKind, Dialect, Position};
//!
//! let buffer = ParsedBuffer::parse("SELECT * FROM Employees e WHERE ", Dialect::SqlServer);
//! let ctx = buffer.context_at(Position::new(1, 33));
//! let stmt = ctx.chunk().unwrap();
//! assert_eq!(ctx.find_table("e").and_then(|t| t.name()), Some("Employees"));
//! assert_eq!(
//!     ParsedBuffer::trailing_clause(stmt, Position::new(1, 33)).map(|c| c.kind),
//!     Some(ClauseKind::Where)
//! );
//! ```

pub mod buffer;
pub mod keywords;
pub mod parser;
pub mod tokenizer;

pub use buffer::{ParsedBuffer, StatementContext};
pub use keywords::is_reserved;
pub use parser::parse_statements;
pub use tokenizer::tokenize;
