// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock catalog loader for testing
//!
//! Serves a static document, counts every call, and can hold loads back
//! behind a gate so tests can observe the catalog while a load is in flight.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sqlctx_catalog::{
    CatalogDocument, CatalogError, CatalogLoader, CatalogOptions, CatalogResult, ColumnMetadata,
    EngineFeatures, LazyCatalog, ObjectMetadata, ParameterMetadata, StaticLoader,
};
use tokio::sync::watch;

use crate::fixtures::SchemaFixtures;

/// In-memory loader with call counting
#[derive(Debug)]
pub struct MockLoader {
    inner: StaticLoader,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Vec<String>,
    gate: Option<watch::Receiver<bool>>,
    opener: Option<watch::Sender<bool>>,
}

impl MockLoader {
    /// Total loader calls so far
    pub fn load_count(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Calls of one loader method, e.g. `"get_columns"`
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    /// Let gated loads proceed
    pub fn release(&self) {
        if let Some(opener) = &self.opener {
            let _ = opener.send(true);
        }
    }

    async fn enter(&self, method: &'static str, target: &str) -> CatalogResult<()> {
        *self.calls.lock().entry(method).or_insert(0) += 1;
        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            let _ = gate.wait_for(|open| *open).await;
        }
        if self.failing.iter().any(|f| f.eq_ignore_ascii_case(target)) {
            return Err(CatalogError::ConnectionFailed(format!("{} unavailable", target)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogLoader for MockLoader {
    fn features(&self) -> EngineFeatures {
        self.inner.features()
    }

    async fn list_databases(&self) -> CatalogResult<Vec<String>> {
        self.enter("list_databases", "").await?;
        self.inner.list_databases().await
    }

    async fn list_schemas(&self, database: &str) -> CatalogResult<Vec<String>> {
        self.enter("list_schemas", database).await?;
        self.inner.list_schemas(database).await
    }

    async fn list_objects(&self, database: &str, schema: Option<&str>) -> CatalogResult<Vec<ObjectMetadata>> {
        self.enter("list_objects", schema.unwrap_or(database)).await?;
        self.inner.list_objects(database, schema).await
    }

    async fn get_columns(&self, database: &str, schema: Option<&str>, object: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        self.enter("get_columns", object).await?;
        self.inner.get_columns(database, schema, object).await
    }

    async fn get_parameters(&self, database: &str, schema: Option<&str>, routine: &str) -> CatalogResult<Vec<ParameterMetadata>> {
        self.enter("get_parameters", routine).await?;
        self.inner.get_parameters(database, schema, routine).await
    }
}

/// Builder for creating mock loaders with a fluent API
pub struct MockLoaderBuilder {
    document: CatalogDocument,
    connected_database: Option<String>,
    failing: Vec<String>,
    gated: bool,
}

impl Default for MockLoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLoaderBuilder {
    /// Create a new builder over an empty SQL Server catalog
    pub fn new() -> Self {
        Self {
            document: CatalogDocument::default(),
            connected_database: None,
            failing: Vec::new(),
            gated: false,
        }
    }

    /// Use the HR fixture catalog and connect to `Hr`
    pub fn with_hr_schema(self) -> Self {
        self.with_yaml(SchemaFixtures::hr_yaml()).with_connected_database("Hr")
    }

    /// Replace the document with a YAML catalog
    ///
    /// # Panics
    ///
    /// Panics on an invalid document.
    pub fn with_yaml(mut self, yaml: &str) -> Self {
        let loader = StaticLoader::from_yaml_str(yaml).unwrap_or_else(|e| panic!("bad fixture catalog: {}", e));
        self.document = loader.document().clone();
        self
    }

    pub fn with_connected_database(mut self, database: impl Into<String>) -> Self {
        self.connected_database = Some(database.into());
        self
    }

    /// Make every load of the named database, schema or object fail
    pub fn with_failure(mut self, target: impl Into<String>) -> Self {
        self.failing.push(target.into());
        self
    }

    /// Hold every load until [`MockLoader::release`]
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    /// Build the mock loader
    pub fn build(self) -> MockLoader {
        let (opener, gate) = if self.gated {
            let (tx, rx) = watch::channel(false);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        MockLoader {
            inner: StaticLoader::new(self.document),
            calls: Mutex::new(HashMap::new()),
            failing: self.failing,
            gate,
            opener,
        }
    }

    /// Build the loader and a lazy catalog over it
    pub fn build_catalog(self) -> (Arc<MockLoader>, LazyCatalog) {
        let mut options = CatalogOptions::default();
        if let Some(database) = &self.connected_database {
            options = options.with_connected_database(database.clone());
        }
        let loader = Arc::new(self.build());
        let catalog = LazyCatalog::with_options(loader.clone(), options);
        (loader, catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_catalog::{LoadPolicy, LoadState, NodeId};

    #[tokio::test]
    async fn test_hr_schema_lists_databases() {
        let loader = MockLoaderBuilder::new().with_hr_schema().build();
        let databases = loader.list_databases().await.unwrap();
        assert_eq!(databases, vec!["Hr", "Sales", "master"]);
        assert_eq!(loader.calls("list_databases"), 1);
    }

    #[tokio::test]
    async fn test_hr_schema_columns() {
        let loader = MockLoaderBuilder::new().with_hr_schema().build();
        let columns = loader.get_columns("Hr", Some("dbo"), "Employees").await.unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"EmployeeID"));
        assert!(names.contains(&"FirstName"));
        assert!(names.contains(&"LastName"));
    }

    #[tokio::test]
    async fn test_failure_target() {
        let loader = MockLoaderBuilder::new().with_hr_schema().with_failure("audit").build();
        assert!(loader.list_objects("Hr", Some("audit")).await.is_err());
        assert!(loader.list_objects("Hr", Some("dbo")).await.is_ok());
    }

    #[tokio::test]
    async fn test_gate_holds_loads() {
        let (loader, catalog) = MockLoaderBuilder::new().with_hr_schema().gated().build_catalog();
        let pending = catalog.databases(LoadPolicy::LOAD).pending.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(catalog.state(NodeId::ROOT), Some(LoadState::Loading));

        loader.release();
        pending.wait().await;
        assert_eq!(catalog.databases(LoadPolicy::SKIP).nodes.len(), 3);
        assert_eq!(catalog.connected_database().as_deref(), Some("Hr"));
    }
}
