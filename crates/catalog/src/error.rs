// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for Catalog operations
//!
//! Errors only come from loaders and static catalog documents. The lazy
//! catalog records a failed load on the node and never hands the error to
//! classification callers.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during Catalog operations
#[derive(Debug, Error, Clone, Serialize)]
pub enum CatalogError {
    /// Failed to connect to the metadata source
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Metadata query failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Load did not finish in time
    #[error("Query timed out after {0}s")]
    QueryTimeout(u64),

    /// Requested database was not found
    #[error("Database '{0}' not found")]
    DatabaseNotFound(String),

    /// Requested object was not found in the given container
    #[error("Object '{0}' not found in '{1}'")]
    ObjectNotFound(String, String),

    /// Node id does not belong to this catalog
    #[error("Unknown catalog node: {0}")]
    UnknownNode(u32),

    /// Failed to parse a static catalog document
    #[error("Invalid catalog document: {0}")]
    InvalidDocument(String),

    /// The loader cannot serve this kind of request
    #[error("Feature not supported: {0}")]
    NotSupported(String),
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        CatalogError::InvalidDocument(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::InvalidDocument(err.to_string())
    }
}
