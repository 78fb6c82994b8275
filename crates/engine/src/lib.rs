// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Context Engine
//!
//! Host-facing facade over the context engine's layers.
//!
//! ## Architecture
//!
//! ```text
//! SqlEngine
//!   ├─ BufferStore        open buffers, one parsed generation each
//!   ├─ ContextEngine      what kind of identifier the cursor expects
//!   ├─ CandidateProvider  which names fit there
//!   ├─ IdentifierResolver what each written identifier refers to
//!   └─ LazyCatalog        database metadata, loaded on demand
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sqlctx_catalog::StaticLoader;
//! use sqlctx_engine::{EngineConfig, Position, SqlEngine};
//!
//! let loader = StaticLoader::from_yaml_str(CATALOG)?;
//! let engine = SqlEngine::new(EngineConfig::default().with_connected_database("Hr"), Arc::new(loader))?;
//! engine.open("query.sql", "SELECT  FROM Employees");
//! let response = engine.complete_settled("query.sql", Position::new(1, 8)).await?;
//! ```

pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod logging;

pub use buffer::{BufferSnapshot, BufferStore};
pub use config::{ConfigError, EngineConfig};
pub use engine::{CompletionResponse, EngineEvent, HighlightResponse, SqlEngine};
pub use error::{EngineError, EngineResult};
pub use highlight::{HighlightSpan, IdentifierChain, identifier_chains};
pub use logging::init_tracing;

pub use sqlctx_ir::{Dialect, Position};
pub use sqlctx_semantic::{Candidate, CandidateKind, SchemaFilter, SemanticType};
