// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static catalog loader
//!
//! Serves catalog metadata from a YAML or JSON document, for offline use and
//! testing without a live server.
//!
//! ```yaml
//! dialect: sqlserver
//! databases:
//!   - name: Hr
//!     schemas:
//!       - name: dbo
//!         tables:
//!           - name: Employees
//!             columns:
//!               - { name: EmployeeID, type: int, primary_key: true }
//!               - { name: DepartmentID, type: int, references: Departments.DepartmentID }
//!         synonyms:
//!           - { name: Staff, target: dbo.Employees }
//! ```
//!
//! Objects listed directly under a database belong to the dialect's default
//! schema, or to the database itself for dialects without schemas.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlctx_ir::{ColumnMetadata, DataType, Dialect, ObjectKind, ObjectMetadata, ParameterMetadata};

use crate::r#trait::{CatalogLoader, EngineFeatures};
use crate::{CatalogError, CatalogResult};

/// Root of a static catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub databases: Vec<DatabaseDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDef {
    pub name: String,
    #[serde(default)]
    pub schemas: Vec<SchemaDef>,
    #[serde(flatten)]
    pub objects: ObjectsDef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    #[serde(flatten)]
    pub objects: ObjectsDef,
}

/// Objects of one container, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectsDef {
    #[serde(default)]
    pub tables: Vec<RelationDef>,
    #[serde(default)]
    pub views: Vec<RelationDef>,
    #[serde(default)]
    pub procedures: Vec<RoutineDef>,
    #[serde(default)]
    pub functions: Vec<RoutineDef>,
    #[serde(default)]
    pub synonyms: Vec<SynonymDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// `Table.Column` this column refers to
    #[serde(default)]
    pub references: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutineDef {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    /// Defaults to the position in the list
    #[serde(default)]
    pub ordinal: Option<u32>,
    #[serde(default)]
    pub output: bool,
    #[serde(default)]
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymDef {
    pub name: String,
    /// `[schema.]object` the synonym stands for
    pub target: String,
}

const MAX_SYNONYM_HOPS: u8 = 4;

fn default_true() -> bool {
    true
}

/// Catalog loader backed by an in-memory document
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    document: CatalogDocument,
}

impl StaticLoader {
    pub fn new(document: CatalogDocument) -> Self {
        Self { document }
    }

    pub fn from_yaml_str(text: &str) -> CatalogResult<Self> {
        Ok(Self::new(serde_yaml::from_str(text)?))
    }

    pub fn from_json_str(text: &str) -> CatalogResult<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Load a document from disk; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: &std::path::Path) -> CatalogResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::ConnectionFailed(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    fn find_database(&self, name: &str) -> CatalogResult<&DatabaseDef> {
        self.document
            .databases
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CatalogError::DatabaseNotFound(name.to_string()))
    }

    /// Object groups visible in `schema`, or in the whole database when `None`
    fn containers<'a>(&self, database: &'a DatabaseDef, schema: Option<&str>) -> CatalogResult<Vec<&'a ObjectsDef>> {
        let default_schema = self.document.dialect.default_schema();
        match schema {
            Some(schema) => {
                let mut found: Vec<&ObjectsDef> = database
                    .schemas
                    .iter()
                    .filter(|s| s.name.eq_ignore_ascii_case(schema))
                    .map(|s| &s.objects)
                    .collect();
                if default_schema.is_some_and(|d| d.eq_ignore_ascii_case(schema)) {
                    found.push(&database.objects);
                }
                if found.is_empty() {
                    return Err(CatalogError::ObjectNotFound(schema.to_string(), database.name.clone()));
                }
                Ok(found)
            }
            None => Ok(std::iter::once(&database.objects)
                .chain(database.schemas.iter().map(|s| &s.objects))
                .collect()),
        }
    }

    /// Table or view by name, following synonyms a bounded number of times
    fn find_relation<'a>(
        &'a self,
        database: &str,
        schema: Option<&str>,
        name: &str,
        hops: u8,
    ) -> CatalogResult<&'a RelationDef> {
        let db = self.find_database(database)?;
        for objects in self.containers(db, schema)? {
            if let Some(found) = objects
                .tables
                .iter()
                .chain(objects.views.iter())
                .find(|r| r.name.eq_ignore_ascii_case(name))
            {
                return Ok(found);
            }
            if let Some(synonym) = objects.synonyms.iter().find(|s| s.name.eq_ignore_ascii_case(name)) {
                let (target_schema, target) = match synonym.target.rsplit_once('.') {
                    Some((s, t)) => (Some(s), t),
                    None => (schema, synonym.target.as_str()),
                };
                if hops > 0 {
                    return self.find_relation(database, target_schema, target, hops - 1);
                }
            }
        }
        Err(CatalogError::ObjectNotFound(name.to_string(), database.to_string()))
    }
}

#[async_trait]
impl CatalogLoader for StaticLoader {
    fn features(&self) -> EngineFeatures {
        let dialect = self.document.dialect;
        EngineFeatures {
            schemas: dialect.supports_schemas(),
            default_schema: dialect.default_schema().map(str::to_string),
        }
    }

    async fn list_databases(&self) -> CatalogResult<Vec<String>> {
        Ok(self.document.databases.iter().map(|d| d.name.clone()).collect())
    }

    async fn list_schemas(&self, database: &str) -> CatalogResult<Vec<String>> {
        let db = self.find_database(database)?;
        let mut names: Vec<String> = db.schemas.iter().map(|s| s.name.clone()).collect();
        let has_loose_objects = db.objects != ObjectsDef::default();
        if let Some(default) = self.document.dialect.default_schema() {
            if has_loose_objects && !names.iter().any(|n| n.eq_ignore_ascii_case(default)) {
                names.push(default.to_string());
            }
        }
        Ok(names)
    }

    async fn list_objects(&self, database: &str, schema: Option<&str>) -> CatalogResult<Vec<ObjectMetadata>> {
        let db = self.find_database(database)?;
        let mut objects = Vec::new();
        for group in self.containers(db, schema)? {
            objects.extend(group.tables.iter().map(|t| ObjectMetadata::new(&t.name, ObjectKind::Table)));
            objects.extend(group.views.iter().map(|v| ObjectMetadata::new(&v.name, ObjectKind::View)));
            objects.extend(
                group
                    .procedures
                    .iter()
                    .map(|p| ObjectMetadata::new(&p.name, ObjectKind::Procedure)),
            );
            objects.extend(
                group
                    .functions
                    .iter()
                    .map(|f| ObjectMetadata::new(&f.name, ObjectKind::Function)),
            );
            objects.extend(
                group
                    .synonyms
                    .iter()
                    .map(|s| ObjectMetadata::new(&s.name, ObjectKind::Synonym).with_target(&s.target)),
            );
        }
        Ok(objects)
    }

    async fn get_columns(&self, database: &str, schema: Option<&str>, object: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        let relation = self.find_relation(database, schema, object, MAX_SYNONYM_HOPS)?;
        Ok(relation
            .columns
            .iter()
            .map(|c| {
                let mut column = ColumnMetadata::new(&c.name, DataType::from_sql_name(&c.data_type))
                    .with_nullable(c.nullable && !c.primary_key);
                if c.primary_key {
                    column = column.with_primary_key();
                }
                column.references = c.references.clone();
                column
            })
            .collect())
    }

    async fn get_parameters(&self, database: &str, schema: Option<&str>, routine: &str) -> CatalogResult<Vec<ParameterMetadata>> {
        let db = self.find_database(database)?;
        let found = self
            .containers(db, schema)?
            .into_iter()
            .flat_map(|group| group.procedures.iter().chain(group.functions.iter()))
            .find(|r| r.name.eq_ignore_ascii_case(routine))
            .ok_or_else(|| CatalogError::ObjectNotFound(routine.to_string(), database.to_string()))?;

        Ok(found
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let ordinal = p.ordinal.unwrap_or(i as u32 + 1);
                let mut parameter = ParameterMetadata::new(&p.name, DataType::from_sql_name(&p.data_type), ordinal);
                if p.output {
                    parameter = parameter.with_output();
                }
                if p.has_default {
                    parameter = parameter.with_default();
                }
                parameter
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
dialect: sqlserver
databases:
  - name: Hr
    tables:
      - name: Regions
        columns:
          - { name: RegionID, type: int, primary_key: true }
    schemas:
      - name: dbo
        tables:
          - name: Employees
            columns:
              - { name: EmployeeID, type: int, primary_key: true }
              - { name: LastName, type: nvarchar(50) }
              - { name: DepartmentID, type: int, references: Departments.DepartmentID }
        synonyms:
          - { name: Staff, target: dbo.Employees }
      - name: audit
        views:
          - name: EmployeeLog
"#;

    fn loader() -> StaticLoader {
        StaticLoader::from_yaml_str(DOC).unwrap()
    }

    #[tokio::test]
    async fn test_lists_databases_and_schemas() {
        let loader = loader();
        assert_eq!(loader.list_databases().await.unwrap(), vec!["Hr"]);
        assert_eq!(loader.list_schemas("hr").await.unwrap(), vec!["dbo", "audit"]);
        assert!(loader.features().schemas);
        assert_eq!(loader.features().default_schema.as_deref(), Some("dbo"));
    }

    #[tokio::test]
    async fn test_loose_objects_join_default_schema() {
        let objects = loader().list_objects("Hr", Some("dbo")).await.unwrap();
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Employees", "Staff", "Regions"]);
        assert_eq!(objects[1].target.as_deref(), Some("dbo.Employees"));
    }

    #[tokio::test]
    async fn test_columns_carry_keys_and_types() {
        let columns = loader().get_columns("Hr", Some("dbo"), "employees").await.unwrap();
        assert_eq!(columns.len(), 3);
        assert!(columns[0].is_primary_key);
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].data_type, DataType::NVarchar(Some(50)));
        assert_eq!(columns[2].references.as_deref(), Some("Departments.DepartmentID"));
    }

    #[tokio::test]
    async fn test_synonym_columns_follow_target() {
        let columns = loader().get_columns("Hr", Some("dbo"), "Staff").await.unwrap();
        assert_eq!(columns.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_objects() {
        let loader = loader();
        assert!(matches!(
            loader.list_schemas("Nope").await,
            Err(CatalogError::DatabaseNotFound(_))
        ));
        assert!(matches!(
            loader.get_columns("Hr", Some("dbo"), "Nope").await,
            Err(CatalogError::ObjectNotFound(_, _))
        ));
    }

    #[test]
    fn test_bad_document() {
        let err = StaticLoader::from_yaml_str("databases: 3").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_json_document_without_schemas() {
        let loader = StaticLoader::from_json_str(
            r#"{"dialect": "mysql", "databases": [{"name": "shop", "tables": [{"name": "orders"}]}]}"#,
        )
        .unwrap();
        assert!(!loader.features().schemas);
        let objects = loader.list_objects("shop", None).await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].kind, ObjectKind::Table);
    }
}
