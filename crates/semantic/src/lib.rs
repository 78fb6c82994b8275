// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SQL Context Engine - Semantic Layer
//!
//! Resolves identifiers against the statement's local names and a
//! [`LazyCatalog`](sqlctx_catalog::LazyCatalog), and turns classified cursors
//! into ranked completion candidates.
//!
//! ## Overview
//!
//! - [`LocalScope`]: aliases, CTEs and temp tables a statement defines
//! - [`IdentifierResolver`]: classifies each part of a dotted name
//! - [`CandidateProvider`]: completion candidates for a [`ContextResult`](sqlctx_context::ContextResult)
//! - [`ColumnRanker`]: relevance of columns next to comparisons and VALUES
//! - [`SchemaFilter`]: schemas and objects hidden from completion
//!
//! ## Non-blocking resolution
//!
//! Nothing here waits on the catalog. A level that is not loaded yet
//! starts loading and the part it would decide stays
//! [`SemanticType::Unresolved`]; the load comes back as a pending handle.
//! Callers re-run once the handle finishes, or use the `*_settled` helpers.
//!
//! ```rust,ignore
//! use sqlctx_semantic::{IdentifierResolver, LocalScope};
//!
//! let resolver = IdentifierResolver::new(catalog);
//! let result = resolver.classify(&["Hr", "dbo", "Employees"], &LocalScope::new());
//! if !result.is_settled() {
//!     // retry after result.pending finish
//! }
//! ```

pub mod candidates;
pub mod filter;
pub mod ranking;
pub mod resolver;
pub mod scope;
pub mod symbol;

pub use candidates::{Candidate, CandidateKind, CandidateProvider, Candidates};
pub use filter::SchemaFilter;
pub use ranking::{ColumnRanker, LeftColumn};
pub use resolver::IdentifierResolver;
pub use scope::LocalScope;
pub use symbol::{Classification, SemanticType};
