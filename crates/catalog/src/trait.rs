// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog loader trait
//!
//! The I/O side of the catalog. A loader answers one level of the
//! `Server → Database → [Schema] → Object → Column | Parameter` tree per call;
//! the lazy catalog decides when each level is fetched.

use serde::{Deserialize, Serialize};
use sqlctx_ir::{ColumnMetadata, ObjectMetadata, ParameterMetadata};

use crate::error::CatalogResult;

/// Capabilities of the engine behind a loader
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineFeatures {
    /// Whether databases contain schemas; otherwise objects hang off the database
    pub schemas: bool,
    /// Schema unqualified names resolve against
    pub default_schema: Option<String>,
}

impl EngineFeatures {
    /// Features of a schema-aware engine
    pub fn with_schemas(default_schema: impl Into<String>) -> Self {
        Self {
            schemas: true,
            default_schema: Some(default_schema.into()),
        }
    }

    /// Features of an engine without a schema level
    pub fn without_schemas() -> Self {
        Self::default()
    }
}

/// Source of catalog metadata
///
/// Implementations can query a live server, read a file, or serve fixtures.
/// Every method fetches exactly one level; `schema` is `None` for engines
/// without a schema level.
///
/// # Examples
///
/// ```rust,ignore
/// use sqlctx_catalog::{CatalogLoader, CatalogError};
///
/// async fn table_names(loader: &impl CatalogLoader) -> Result<Vec<String>, CatalogError> {
///     let objects = loader.list_objects("Hr", Some("dbo")).await?;
///     Ok(objects.into_iter()
///         .filter(|o| o.kind.has_columns())
///         .map(|o| o.name)
///         .collect())
/// }
/// ```
#[async_trait::async_trait]
pub trait CatalogLoader: Send + Sync {
    /// Capabilities of the engine; read once when the catalog is built
    fn features(&self) -> EngineFeatures;

    /// List the databases on the server
    async fn list_databases(&self) -> CatalogResult<Vec<String>>;

    /// List the schemas of a database
    ///
    /// Only called when [`EngineFeatures::schemas`] is set.
    async fn list_schemas(&self, database: &str) -> CatalogResult<Vec<String>>;

    /// List tables, views, procedures, functions and synonyms
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DatabaseNotFound` or `CatalogError::ObjectNotFound`
    /// when the container does not exist.
    async fn list_objects(
        &self,
        database: &str,
        schema: Option<&str>,
    ) -> CatalogResult<Vec<ObjectMetadata>>;

    /// Column metadata of a table, view or synonym
    async fn get_columns(
        &self,
        database: &str,
        schema: Option<&str>,
        object: &str,
    ) -> CatalogResult<Vec<ColumnMetadata>>;

    /// Parameter metadata of a procedure or function
    async fn get_parameters(
        &self,
        database: &str,
        schema: Option<&str>,
        routine: &str,
    ) -> CatalogResult<Vec<ParameterMetadata>>;
}
