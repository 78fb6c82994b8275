// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Identifier resolution
//!
//! Classifies every part of a dotted name. Names the statement defines win
//! over the catalog; the catalog is walked top down; parts left over after an
//! object are its columns. A bare name that matches nothing else is tried as
//! a column of the tables in scope.
//!
//! Resolution never waits for the catalog. An unloaded level is scheduled
//! once and its handle is returned in [`Classification::pending`];
//! [`IdentifierResolver::classify_settled`] waits for those loads and
//! classifies again.
//!
//! Unqualified names resolve in the connected database unless a request
//! narrows the resolver to another one with
//! [`IdentifierResolver::in_database`], e.g. the database a `USE` switched to.

use sqlctx_catalog::{LazyCatalog, LoadPolicy, Lookup, NodeInfo};
use sqlctx_ir::{QualifiedName, TableRef};
use tracing::{debug, trace};

use crate::scope::LocalScope;
use crate::symbol::{Classification, SemanticType};

/// Upper bound on load rounds one settled classification waits for
///
/// A name has at most four parts, each needing one level to be loaded.
const MAX_SETTLE_ROUNDS: usize = 6;

/// Resolves qualified names against local scope and a lazy catalog
#[derive(Debug, Clone)]
pub struct IdentifierResolver {
    catalog: LazyCatalog,
    /// Overrides the catalog's connected database for this resolver
    database: Option<String>,
}

impl IdentifierResolver {
    pub fn new(catalog: LazyCatalog) -> Self {
        Self { catalog, database: None }
    }

    pub fn catalog(&self) -> &LazyCatalog {
        &self.catalog
    }

    /// Resolver that treats `database` as the current database
    ///
    /// `None` falls back to the catalog's connected database. The shared
    /// catalog is left untouched.
    pub fn in_database(&self, database: Option<&str>) -> Self {
        Self {
            catalog: self.catalog.clone(),
            database: database.map(str::to_string),
        }
    }

    /// Database unqualified names resolve in
    pub fn current_database(&self) -> Option<String> {
        self.database.clone().or_else(|| self.catalog.connected_database())
    }

    /// Node of the current database
    pub fn current_database_node(&self, policy: LoadPolicy) -> Lookup {
        match &self.database {
            Some(name) => self.catalog.database(name, policy),
            None => self.catalog.connected_database_node(policy),
        }
    }

    /// Classify each part of `parts`
    ///
    /// Never blocks: parts whose catalog level is still loading come back
    /// `Unresolved` with the load in `pending`.
    pub fn classify(&self, parts: &[&str], scope: &LocalScope) -> Classification {
        let mut out = Classification::with_capacity(parts.len());
        if parts.is_empty() {
            return out;
        }

        let resolved = self.classify_local(parts, scope, &mut out)
            || self.classify_catalog(parts, &mut out)
            || self.classify_bare_column(parts, scope, &mut out);
        out.fill(parts.len());

        trace!(?parts, types = ?out.types, resolved, pending = out.pending.len(), "classified name");
        out
    }

    pub fn classify_name(&self, name: &QualifiedName, scope: &LocalScope) -> Classification {
        self.classify(&name.as_strs(), scope)
    }

    /// Classify, waiting for every load the classification schedules
    pub async fn classify_settled(&self, parts: &[&str], scope: &LocalScope) -> Classification {
        let mut classification = self.classify(parts, scope);
        for round in 0..MAX_SETTLE_ROUNDS {
            if classification.is_settled() {
                break;
            }
            debug!(round, pending = classification.pending.len(), "waiting for catalog loads");
            for handle in std::mem::take(&mut classification.pending) {
                handle.wait().await;
            }
            classification = self.classify(parts, scope);
        }
        classification
    }

    /// Catalog object behind a table reference the statement makes
    ///
    /// `None` for references that do not live in the catalog, or while the
    /// levels leading to the object are loading.
    pub fn locate_table(&self, table: &TableRef, out: &mut Classification) -> Option<NodeInfo> {
        match table {
            TableRef::Table {
                database, schema, name, ..
            }
            | TableRef::TableFunction {
                database, schema, name, ..
            } => self.locate(database.as_deref(), schema.as_deref(), name, out),
            _ => None,
        }
    }

    /// Find an object by its written qualifiers
    ///
    /// Without a database the current one is used. Without a schema the
    /// default container is searched, then any schema already loaded.
    pub fn locate(
        &self,
        database: Option<&str>,
        schema: Option<&str>,
        name: &str,
        out: &mut Classification,
    ) -> Option<NodeInfo> {
        let schemas = self.catalog.features().schemas;
        // engines without schemas read `a.b` as database.object
        let (database, schema) = match (database, schema) {
            (None, Some(s)) if !schemas => (Some(s), None),
            other => other,
        };

        let db = match database {
            Some(db) => self.catalog.database(db, LoadPolicy::LOAD),
            None => self.current_database_node(LoadPolicy::LOAD),
        };
        out.wait_on(db.pending);
        let db = db.node?;

        let container = match schema.filter(|s| !s.is_empty()) {
            Some(schema) if schemas => self.catalog.schema(db.id, schema, LoadPolicy::LOAD),
            _ => self.catalog.default_container(db.id, LoadPolicy::LOAD),
        };
        out.wait_on(container.pending);

        if let Some(container) = container.node {
            let found = self.catalog.object(container.id, name, LoadPolicy::LOAD);
            out.wait_on(found.pending);
            if found.node.is_some() {
                return found.node;
            }
        }

        if schema.is_some_and(|s| !s.is_empty()) {
            return None;
        }
        self.catalog
            .loaded_containers(db.id)
            .into_iter()
            .find_map(|c| self.catalog.object(c.id, name, LoadPolicy::SKIP).node)
    }

    /// Whether `table` exposes a column called `column`
    ///
    /// Local references whose shape is unknown accept any column.
    fn column_of(&self, table: &TableRef, column: &str, scope: &LocalScope, out: &mut Classification) -> SemanticType {
        if let Some(columns) = scope.local_columns(table) {
            return if columns.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                SemanticType::Column
            } else {
                SemanticType::Unresolved
            };
        }
        match table {
            TableRef::Table { .. } => match self.locate_table(table, out) {
                Some(object) => self.object_column(&object, column, out),
                None => SemanticType::Unresolved,
            },
            _ => SemanticType::Column,
        }
    }

    fn object_column(&self, object: &NodeInfo, column: &str, out: &mut Classification) -> SemanticType {
        if !object.object_kind().is_some_and(|k| k.has_columns()) {
            return SemanticType::Unresolved;
        }
        let listing = self.catalog.columns(object.id, LoadPolicy::LOAD);
        out.wait_on(listing.pending.clone());
        if listing.find(column).is_some() {
            SemanticType::Column
        } else {
            SemanticType::Unresolved
        }
    }

    /// Aliases, CTEs and temp tables
    fn classify_local(&self, parts: &[&str], scope: &LocalScope, out: &mut Classification) -> bool {
        let head = parts[0];
        let (ty, table) = if let Some(table) = scope.alias(head) {
            (SemanticType::Alias, table.clone())
        } else if let Some(cte) = scope.cte(head) {
            let table = TableRef::Cte {
                name: cte.name.clone(),
                alias: None,
            };
            (SemanticType::Cte, table)
        } else if head.starts_with('#') || scope.temp_table(head).is_some() {
            let table = TableRef::TempTable {
                name: head.to_string(),
                alias: None,
                is_global: head.starts_with("##"),
            };
            (SemanticType::TempTable, table)
        } else {
            return false;
        };

        out.push(ty);
        if let Some(column) = parts.get(1) {
            let column = self.column_of(&table, column, scope, out);
            out.push(column);
        }
        true
    }

    /// Database, then schema of the current database, then object
    fn classify_catalog(&self, parts: &[&str], out: &mut Classification) -> bool {
        let head = parts[0];

        let database = self.catalog.database(head, LoadPolicy::LOAD);
        out.wait_on(database.pending);
        if let Some(db) = database.node {
            out.push(SemanticType::Database);
            self.walk_database(&db, &parts[1..], out);
            return true;
        }

        let current = self.current_database_node(LoadPolicy::LOAD);
        out.wait_on(current.pending);
        let Some(db) = current.node else {
            return false;
        };

        if self.catalog.features().schemas {
            let schema = self.catalog.schema(db.id, head, LoadPolicy::LOAD);
            out.wait_on(schema.pending);
            if let Some(schema) = schema.node {
                out.push(SemanticType::Schema);
                self.walk_container(&schema, &parts[1..], out);
                return true;
            }
        }

        let container = self.catalog.default_container(db.id, LoadPolicy::LOAD);
        out.wait_on(container.pending);
        let in_default = container.node.and_then(|c| {
            let found = self.catalog.object(c.id, head, LoadPolicy::LOAD);
            out.wait_on(found.pending);
            found.node
        });
        let object = in_default.or_else(|| {
            self.catalog
                .loaded_containers(db.id)
                .into_iter()
                .find_map(|c| self.catalog.object(c.id, head, LoadPolicy::SKIP).node)
        });

        match object {
            Some(object) => {
                self.push_object(&object, &parts[1..], out);
                true
            }
            None => false,
        }
    }

    fn walk_database(&self, db: &NodeInfo, rest: &[&str], out: &mut Classification) {
        let Some((head, tail)) = rest.split_first() else {
            return;
        };
        if !self.catalog.features().schemas {
            self.walk_container(db, rest, out);
            return;
        }

        // `db..object` skips to the default schema
        let schema = if head.is_empty() {
            self.catalog.default_container(db.id, LoadPolicy::LOAD)
        } else {
            self.catalog.schema(db.id, head, LoadPolicy::LOAD)
        };
        out.wait_on(schema.pending);
        if let Some(schema) = schema.node {
            out.push(SemanticType::Schema);
            self.walk_container(&schema, tail, out);
        }
    }

    fn walk_container(&self, container: &NodeInfo, rest: &[&str], out: &mut Classification) {
        let Some((head, tail)) = rest.split_first() else {
            return;
        };
        let object = self.catalog.object(container.id, head, LoadPolicy::LOAD);
        out.wait_on(object.pending);
        if let Some(object) = object.node {
            self.push_object(&object, tail, out);
        }
    }

    fn push_object(&self, object: &NodeInfo, rest: &[&str], out: &mut Classification) {
        let ty = object
            .object_kind()
            .map_or(SemanticType::Unresolved, SemanticType::from);
        out.push(ty);
        if let Some(column) = rest.first() {
            let column = self.object_column(object, column, out);
            out.push(column);
        }
    }

    /// A lone name tried as a column of the tables in scope, then of any
    /// table whose columns are already loaded
    fn classify_bare_column(&self, parts: &[&str], scope: &LocalScope, out: &mut Classification) -> bool {
        let [name] = parts else {
            return false;
        };

        for table in scope.all_tables() {
            // local references of unknown shape cannot vouch for a bare name
            let hit = match scope.local_columns(table) {
                Some(columns) => columns.iter().any(|c| c.eq_ignore_ascii_case(name)),
                None => {
                    matches!(table, TableRef::Table { .. })
                        && self.column_of(table, name, scope, out) == SemanticType::Column
                }
            };
            if hit {
                out.push(SemanticType::Column);
                return true;
            }
        }

        let Some(db) = self.current_database_node(LoadPolicy::SKIP).node else {
            return false;
        };
        let found = self.catalog.loaded_containers(db.id).into_iter().any(|container| {
            self.catalog
                .children(container.id, LoadPolicy::SKIP)
                .nodes
                .iter()
                .filter(|o| o.object_kind().is_some_and(|k| k.has_columns()))
                .any(|o| self.catalog.columns(o.id, LoadPolicy::SKIP).find(name).is_some())
        });
        if found {
            out.push(SemanticType::Column);
        }
        found
    }
}
