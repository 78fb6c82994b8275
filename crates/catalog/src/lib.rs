// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlctx - Catalog Layer
//!
//! A lazily populated, process-wide mirror of the server's object tree:
//!
//! ```text
//! Server → Database → [Schema] → {Table, View, Procedure, Function, Synonym} → Column | Parameter
//! ```
//!
//! The schema level exists only when the loader reports
//! [`EngineFeatures::schemas`]. Nodes live in an arena addressed by
//! [`NodeId`] and move through `Stub → Loading → Loaded` (or `Failed`).
//!
//! - [`CatalogLoader`]: the async I/O boundary, one level per call
//! - [`LazyCatalog`]: non-blocking queries, idempotent load scheduling,
//!   refresh, weakly held [`CatalogListener`]s
//! - [`StaticLoader`]: a loader over a YAML or JSON document
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sqlctx_catalog::{LazyCatalog, LoadPolicy, StaticLoader};
//!
//! let loader = StaticLoader::from_yaml_str(include_str!("hr.yaml"))?;
//! let catalog = LazyCatalog::new(Arc::new(loader));
//!
//! // first call schedules the load and returns at once
//! let listing = catalog.databases(LoadPolicy::LOAD);
//! if let Some(pending) = listing.pending {
//!     pending.wait().await;
//! }
//! let databases = catalog.databases(LoadPolicy::SKIP).nodes;
//! ```

pub mod error;
pub mod lazy;
pub mod node;
pub mod r#static;
pub mod r#trait;

// Re-exports
pub use error::{CatalogError, CatalogResult};
pub use lazy::{
    CatalogListener, CatalogOptions, LazyCatalog, Listing, LoadHandle, LoadPolicy, LoadStatus, Lookup,
};
pub use node::{LoadState, NodeDetail, NodeId, NodeInfo, NodeKind, NodePath};
pub use r#static::{CatalogDocument, StaticLoader};
pub use r#trait::{CatalogLoader, EngineFeatures};
pub use sqlctx_ir::{ColumnMetadata, DataType, ObjectKind, ObjectMetadata, ParameterMetadata};
