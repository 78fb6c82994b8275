// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Completion candidates
//!
//! Turns a classified cursor ([`ContextResult`]) into ranked candidates drawn
//! from the statement's local names and the lazy catalog.
//!
//! Like the resolver, the provider never waits: levels that are still loading
//! contribute nothing now and their loads come back in
//! [`Candidates::pending`].

use serde::{Deserialize, Serialize};
use sqlctx_catalog::{LazyCatalog, LoadHandle, LoadPolicy, NodeInfo, NodeKind, ObjectKind};
use sqlctx_context::{ContextHints, ContextResult, ContextType, KeywordProvider};
use sqlctx_grammar::StatementContext;
use sqlctx_ir::{DataType, Dialect, QualifiedName, TableRef};
use tracing::debug;

use crate::filter::SchemaFilter;
use crate::ranking::{ColumnRanker, LeftColumn};
use crate::resolver::IdentifierResolver;
use crate::scope::LocalScope;
use crate::symbol::Classification;

/// Objects offered where a table is expected
const RELATIONS: [ObjectKind; 3] = [ObjectKind::Table, ObjectKind::View, ObjectKind::Synonym];

/// Pseudo tables of OUTPUT clauses and triggers; they mirror the DML target
const PSEUDO_TABLES: [&str; 2] = ["inserted", "deleted"];

const MAX_SETTLE_ROUNDS: usize = 6;

/// Kind of a completion candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Keyword,
    Database,
    Schema,
    Table,
    View,
    Synonym,
    Procedure,
    Function,
    Column,
    Parameter,
    Alias,
    Cte,
    TempTable,
}

impl From<ObjectKind> for CandidateKind {
    fn from(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Table => CandidateKind::Table,
            ObjectKind::View => CandidateKind::View,
            ObjectKind::Synonym => CandidateKind::Synonym,
            ObjectKind::Procedure => CandidateKind::Procedure,
            ObjectKind::Function => CandidateKind::Function,
        }
    }
}

/// One completion candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub label: String,
    pub kind: CandidateKind,
    pub detail: Option<String>,
    /// Higher ranks first, between 0.0 and 1.0
    pub relevance: f64,
}

impl Candidate {
    pub fn new(label: impl Into<String>, kind: CandidateKind, relevance: f64) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            relevance,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Ranked candidates plus the loads that may add more
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub items: Vec<Candidate>,
    pub pending: Vec<LoadHandle>,
}

impl Candidates {
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// A table-like source of columns, under the name the statement uses for it
#[derive(Debug, Clone)]
struct Source {
    name: String,
    columns: Vec<(String, Option<DataType>)>,
}

impl Source {
    fn column(&self, name: &str) -> Option<&(String, Option<DataType>)> {
        self.columns.iter().find(|(c, _)| c.eq_ignore_ascii_case(name))
    }
}

/// Completion candidate provider
#[derive(Debug, Clone)]
pub struct CandidateProvider {
    resolver: IdentifierResolver,
    keywords: KeywordProvider,
    filter: SchemaFilter,
}

impl CandidateProvider {
    pub fn new(catalog: LazyCatalog, dialect: Dialect) -> Self {
        Self {
            resolver: IdentifierResolver::new(catalog),
            keywords: KeywordProvider::new(dialect),
            filter: SchemaFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: SchemaFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Provider that completes unqualified names in `database`
    ///
    /// `None` keeps the catalog's connected database.
    pub fn in_database(&self, database: Option<&str>) -> Self {
        Self {
            resolver: self.resolver.in_database(database),
            keywords: self.keywords,
            filter: self.filter.clone(),
        }
    }

    pub fn resolver(&self) -> &IdentifierResolver {
        &self.resolver
    }

    fn catalog(&self) -> &LazyCatalog {
        self.resolver.catalog()
    }

    /// Candidates for a cursor inside a parsed statement
    pub fn candidates(&self, context: &ContextResult, statement: &StatementContext<'_>) -> Candidates {
        self.candidates_in_scope(context, &LocalScope::from_context(statement))
    }

    pub fn candidates_in_scope(&self, context: &ContextResult, scope: &LocalScope) -> Candidates {
        let mut loads = Classification::default();
        let mut items = match context.kind {
            ContextType::Keyword => self.keyword_items(context, scope),
            ContextType::Database => self.database_items(&mut loads),
            ContextType::Schema => match self.database_node(context.hints.filter_database.as_deref(), &mut loads) {
                Some(db) => self.schema_items(&db, &mut loads),
                None => Vec::new(),
            },
            ContextType::Table => self.table_items(context, scope, &mut loads),
            ContextType::Column => self.column_items(&context.hints, scope, &mut loads),
            ContextType::Procedure => self.procedure_items(&context.hints, &mut loads),
            ContextType::Parameter => self.parameter_items(&context.hints, &mut loads),
            ContextType::Alias => self.alias_items(&context.hints, scope),
            ContextType::Unknown => Vec::new(),
        };

        items.retain(|c| matches_prefix(&c.label, &context.prefix));
        items.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        debug!(
            kind = context.kind.as_str(),
            mode = context.mode.as_str(),
            prefix = %context.prefix,
            items = items.len(),
            pending = loads.pending.len(),
            "collected candidates"
        );
        Candidates {
            items,
            pending: loads.pending,
        }
    }

    /// Candidates once every load they depend on has finished
    pub async fn candidates_settled(&self, context: &ContextResult, scope: &LocalScope) -> Candidates {
        let mut candidates = self.candidates_in_scope(context, scope);
        for _ in 0..MAX_SETTLE_ROUNDS {
            if candidates.is_settled() {
                break;
            }
            for handle in std::mem::take(&mut candidates.pending) {
                handle.wait().await;
            }
            candidates = self.candidates_in_scope(context, scope);
        }
        candidates
    }

    fn keyword_items(&self, context: &ContextResult, scope: &LocalScope) -> Vec<Candidate> {
        self.keywords
            .keywords_for(context, scope.statement_type())
            .keywords
            .into_iter()
            .map(|k| {
                let relevance = (0.5 - f64::from(k.sort_priority) * 0.001).max(0.05);
                let candidate = Candidate::new(k.label, CandidateKind::Keyword, relevance);
                match k.description {
                    Some(description) => candidate.with_detail(description),
                    None => candidate,
                }
            })
            .collect()
    }

    fn database_items(&self, loads: &mut Classification) -> Vec<Candidate> {
        let listing = self.catalog().databases(LoadPolicy::LOAD);
        loads.wait_on(listing.pending);
        listing
            .nodes
            .into_iter()
            .map(|db| Candidate::new(db.name, CandidateKind::Database, 0.8))
            .collect()
    }

    /// Named database, or the current one
    fn database_node(&self, name: Option<&str>, loads: &mut Classification) -> Option<NodeInfo> {
        let lookup = match name {
            Some(name) => self.catalog().database(name, LoadPolicy::LOAD),
            None => self.resolver.current_database_node(LoadPolicy::LOAD),
        };
        loads.wait_on(lookup.pending);
        lookup.node
    }

    fn default_container(&self, db: &NodeInfo, loads: &mut Classification) -> Option<NodeInfo> {
        let lookup = self.catalog().default_container(db.id, LoadPolicy::LOAD);
        loads.wait_on(lookup.pending);
        lookup.node
    }

    fn schema_items(&self, db: &NodeInfo, loads: &mut Classification) -> Vec<Candidate> {
        let listing = self.catalog().schemas(db.id, LoadPolicy::LOAD);
        loads.wait_on(listing.pending);
        listing
            .nodes
            .into_iter()
            .filter(|s| self.filter.allows_schema(&s.name))
            .map(|s| Candidate::new(s.name, CandidateKind::Schema, 0.6).with_detail(db.name.clone()))
            .collect()
    }

    fn object_items(&self, container: &NodeInfo, kinds: &[ObjectKind], loads: &mut Classification) -> Vec<Candidate> {
        let schema = (container.kind == NodeKind::Schema).then_some(container.name.as_str());
        if schema.is_some_and(|s| !self.filter.allows_schema(s)) {
            return Vec::new();
        }

        let listing = self.catalog().objects(container.id, None, LoadPolicy::LOAD);
        loads.wait_on(listing.pending);
        listing
            .nodes
            .into_iter()
            .filter_map(|object| {
                let kind = object.object_kind().filter(|k| kinds.contains(k))?;
                if !self.filter.allows_object(schema, &object.name) {
                    return None;
                }
                let relevance = match kind {
                    ObjectKind::Table | ObjectKind::Procedure => 0.9,
                    ObjectKind::View | ObjectKind::Function => 0.85,
                    ObjectKind::Synonym => 0.8,
                };
                Some(Candidate::new(object.name, kind.into(), relevance).with_detail(container.name.clone()))
            })
            .collect()
    }

    /// Objects after a written `schema.` or `database.schema.`
    fn qualified_object_items(&self, hints: &ContextHints, kinds: &[ObjectKind], loads: &mut Classification) -> Vec<Candidate> {
        let Some(db) = self.database_node(hints.filter_database.as_deref(), loads) else {
            return Vec::new();
        };

        match hints.filter_schema.as_deref() {
            Some(schema) if self.catalog().features().schemas => {
                let lookup = self.catalog().schema(db.id, schema, LoadPolicy::LOAD);
                loads.wait_on(lookup.pending);
                if let Some(schema) = lookup.node {
                    return self.object_items(&schema, kinds, loads);
                }
                // `Sales.` may name a database rather than a schema
                let other = match (&hints.filter_database, &hints.potential_database) {
                    (None, Some(name)) => self.database_node(Some(name), loads),
                    _ => None,
                };
                match other {
                    Some(other) => self.schema_items(&other, loads),
                    None => Vec::new(),
                }
            }
            // without a schema level the qualifier is a database
            Some(database) => match self.database_node(Some(database), loads) {
                Some(other) => self.object_items(&other, kinds, loads),
                None => Vec::new(),
            },
            None => match self.default_container(&db, loads) {
                Some(container) => self.object_items(&container, kinds, loads),
                None => Vec::new(),
            },
        }
    }

    fn table_items(&self, context: &ContextResult, scope: &LocalScope, loads: &mut Classification) -> Vec<Candidate> {
        let hints = &context.hints;
        if hints.filter_database.is_some() || hints.filter_schema.is_some() {
            return self.qualified_object_items(hints, &RELATIONS, loads);
        }

        let mut items: Vec<Candidate> = scope
            .ctes()
            .map(|cte| Candidate::new(cte.name.clone(), CandidateKind::Cte, 0.95).with_detail("common table expression"))
            .collect();
        items.extend(
            scope
                .temp_tables()
                .map(|t| Candidate::new(t.name.clone(), CandidateKind::TempTable, 0.9).with_detail("temporary table")),
        );

        if let Some(db) = self.database_node(None, loads) {
            if let Some(container) = self.default_container(&db, loads) {
                items.extend(self.object_items(&container, &RELATIONS, loads));
            }
            items.extend(self.schema_items(&db, loads));
        }
        items
    }

    fn procedure_items(&self, hints: &ContextHints, loads: &mut Classification) -> Vec<Candidate> {
        let routines = [ObjectKind::Procedure];
        if hints.filter_database.is_some() || hints.filter_schema.is_some() {
            return self.qualified_object_items(hints, &routines, loads);
        }

        let Some(db) = self.database_node(None, loads) else {
            return Vec::new();
        };
        let mut items = match self.default_container(&db, loads) {
            Some(container) => self.object_items(&container, &routines, loads),
            None => Vec::new(),
        };
        items.extend(self.schema_items(&db, loads));
        items
    }

    fn parameter_items(&self, hints: &ContextHints, loads: &mut Classification) -> Vec<Candidate> {
        let Some(routine) = hints.routine.as_deref().and_then(QualifiedName::parse) else {
            return Vec::new();
        };
        let parts = routine.as_strs();
        let Some((database, schema, name)) = split_name(&parts) else {
            return Vec::new();
        };
        let Some(object) = self.resolver.locate(database, schema, name, loads) else {
            return Vec::new();
        };
        if !object.object_kind().is_some_and(|k| k.has_parameters()) {
            return Vec::new();
        }

        let listing = self.catalog().parameters(object.id, LoadPolicy::LOAD);
        loads.wait_on(listing.pending);
        let next_ordinal = hints.value_position.map(|p| p as u32 + 1);
        listing
            .nodes
            .iter()
            .filter(|p| !hints.used_parameters.iter().any(|u| p.is_named(u)))
            .filter_map(|p| {
                let meta = p.parameter()?;
                let relevance = if Some(meta.ordinal) == next_ordinal {
                    0.95
                } else {
                    (0.8 - f64::from(meta.ordinal) * 0.01).max(0.1)
                };
                let mut detail = meta.data_type.to_string();
                if meta.is_output {
                    detail.push_str(" OUTPUT");
                }
                if meta.has_default {
                    detail.push_str(" = default");
                }
                Some(Candidate::new(p.name.clone(), CandidateKind::Parameter, relevance).with_detail(detail))
            })
            .collect()
    }

    fn alias_items(&self, hints: &ContextHints, scope: &LocalScope) -> Vec<Candidate> {
        let Some(table) = hints.table_ref.as_deref() else {
            return Vec::new();
        };
        let taken: Vec<String> = scope.aliases().iter().map(|a| a.to_lowercase()).collect();
        alias_suggestions(table)
            .into_iter()
            .filter(|a| !taken.contains(a))
            .enumerate()
            .map(|(i, alias)| Candidate::new(alias, CandidateKind::Alias, 0.9 - i as f64 * 0.1).with_detail(table.to_string()))
            .collect()
    }

    fn column_items(&self, hints: &ContextHints, scope: &LocalScope, loads: &mut Classification) -> Vec<Candidate> {
        let mut items = Vec::new();

        let sources: Vec<Source> = if let Some(qualifier) = hints.table_ref.as_deref() {
            let source = if PSEUDO_TABLES.iter().any(|p| p.eq_ignore_ascii_case(qualifier)) {
                hints
                    .filter_table
                    .as_deref()
                    .and_then(|target| self.target_source(target, scope, loads))
                    .map(|s| Source {
                        name: qualifier.to_string(),
                        columns: s.columns,
                    })
            } else {
                self.source_named(qualifier, hints.schema.as_deref(), hints.database.as_deref(), scope, loads)
            };
            match source {
                Some(source) => vec![source],
                None => {
                    debug!(qualifier, "qualifier matches nothing in scope");
                    return Vec::new();
                }
            }
        } else if let Some(target) = hints.filter_table.as_deref() {
            self.target_source(target, scope, loads).into_iter().collect()
        } else if let Some(target) = hints.insert_table.as_deref().filter(|_| scope.tables().is_empty()) {
            self.target_source(target, scope, loads).into_iter().collect()
        } else {
            items.extend(scope.tables().iter().filter_map(|t| {
                let alias = t.alias()?;
                let detail = t.name().unwrap_or("derived table").to_string();
                Some(Candidate::new(alias, CandidateKind::Alias, 0.4).with_detail(detail))
            }));
            scope
                .tables()
                .iter()
                .filter_map(|t| self.source_of(t, scope, loads))
                .collect()
        };

        let left = self.left_column(hints, scope, &sources, loads);
        let ranker = ColumnRanker::new()
            .with_left_column(left)
            .with_positional(hints.positional_column());

        for source in &sources {
            for (name, data_type) in &source.columns {
                let detail = match data_type {
                    Some(ty) => format!("{}.{} {}", source.name, name, ty),
                    None => format!("{}.{}", source.name, name),
                };
                let relevance = ranker.score(&source.name, name, data_type.as_ref());
                items.push(Candidate::new(name.clone(), CandidateKind::Column, relevance).with_detail(detail));
            }
        }
        items
    }

    /// Columns a table reference of the statement exposes
    fn source_of(&self, table: &TableRef, scope: &LocalScope, loads: &mut Classification) -> Option<Source> {
        let name = table.exposed_name()?.to_string();
        if let Some(columns) = scope.local_columns(table) {
            return Some(Source {
                name,
                columns: columns.into_iter().map(|c| (c, None)).collect(),
            });
        }
        match table {
            TableRef::Table { .. } => {
                let object = self.resolver.locate_table(table, loads)?;
                Some(self.object_source(name, &object, loads))
            }
            _ => None,
        }
    }

    /// Source a written qualifier designates
    ///
    /// A bare qualifier must name something the statement references; a
    /// schema-qualified one may also name any catalog object.
    fn source_named(
        &self,
        qualifier: &str,
        schema: Option<&str>,
        database: Option<&str>,
        scope: &LocalScope,
        loads: &mut Classification,
    ) -> Option<Source> {
        let written = match (database, schema) {
            (None, Some(schema)) => format!("{}.{}", schema, qualifier),
            (None, None) => qualifier.to_string(),
            (Some(_), _) => String::new(),
        };
        if let Some(table) = (!written.is_empty()).then(|| scope.find_table(&written)).flatten() {
            return self.source_of(table, scope, loads);
        }
        if schema.is_none() && database.is_none() {
            return None;
        }
        let object = self.resolver.locate(database, schema, qualifier, loads)?;
        Some(self.object_source(qualifier.to_string(), &object, loads))
    }

    /// Source for the target of an INSERT, UPDATE or MERGE
    fn target_source(&self, target: &str, scope: &LocalScope, loads: &mut Classification) -> Option<Source> {
        if let Some(table) = scope.find_table(target) {
            return self.source_of(table, scope, loads);
        }
        if let Some(temp) = scope.temp_table(target) {
            return Some(Source {
                name: temp.name.clone(),
                columns: temp.columns.iter().flatten().map(|c| (c.clone(), None)).collect(),
            });
        }
        let written = QualifiedName::parse(target)?;
        let parts = written.as_strs();
        let (database, schema, name) = split_name(&parts)?;
        let object = self.resolver.locate(database, schema, name, loads)?;
        Some(self.object_source(name.to_string(), &object, loads))
    }

    fn object_source(&self, name: String, object: &NodeInfo, loads: &mut Classification) -> Source {
        let listing = self.catalog().columns(object.id, LoadPolicy::LOAD);
        loads.wait_on(listing.pending);
        let columns = listing
            .nodes
            .iter()
            .map(|c| (c.name.clone(), c.column().map(|m| m.data_type.clone())))
            .collect();
        Source { name, columns }
    }

    /// The comparison's left-hand column, with its type when it can be found
    fn left_column(
        &self,
        hints: &ContextHints,
        scope: &LocalScope,
        sources: &[Source],
        loads: &mut Classification,
    ) -> Option<LeftColumn> {
        let left = hints.left_side_column.as_ref()?;
        let owner = match left.table_ref.as_deref() {
            Some(qualifier) => sources
                .iter()
                .find(|s| s.name.eq_ignore_ascii_case(qualifier))
                .cloned()
                .or_else(|| self.source_named(qualifier, left.schema.as_deref(), None, scope, loads)),
            None => sources.iter().find(|s| s.column(&left.column_name).is_some()).cloned(),
        };
        let data_type = owner
            .as_ref()
            .and_then(|s| s.column(&left.column_name))
            .and_then(|(_, ty)| ty.clone());
        Some(LeftColumn {
            source: owner.map(|s| s.name).or_else(|| left.table_ref.clone()),
            name: left.column_name.clone(),
            data_type,
        })
    }
}

/// Split `[database.][schema.]name` into its parts
fn split_name<'a>(parts: &[&'a str]) -> Option<(Option<&'a str>, Option<&'a str>, &'a str)> {
    match *parts {
        [name] => Some((None, None, name)),
        [schema, name] => Some((None, Some(schema), name)),
        [.., database, schema, name] => Some((Some(database), Some(schema), name)),
        [] => None,
    }
}

/// Case-insensitive prefix test; `@` and `#` sigils are optional in the prefix
fn matches_prefix(label: &str, prefix: &str) -> bool {
    if prefix.starts_with('#') && !label.starts_with('#') {
        return false;
    }
    let bare = |s: &str| s.trim_start_matches(['@', '#']).to_lowercase();
    bare(label).starts_with(&bare(prefix))
}

/// Short aliases for a table name: word initials, then a three-letter stem
///
/// `Employees` gives `e` and `emp`; `EmployeeArchive` gives `ea` and `emp`.
fn alias_suggestions(table: &str) -> Vec<String> {
    let name = table.trim_start_matches('#');
    let mut initials = String::new();
    let mut previous: Option<char> = None;
    for ch in name.chars() {
        let starts_word = match previous {
            None => true,
            Some(p) => p == '_' || (ch.is_uppercase() && p.is_lowercase()),
        };
        if starts_word && ch.is_alphanumeric() {
            initials.extend(ch.to_lowercase());
        }
        previous = Some(ch);
    }

    let stem: String = name
        .rsplit('_')
        .next()
        .unwrap_or(name)
        .chars()
        .take(3)
        .flat_map(char::to_lowercase)
        .collect();

    let mut out = Vec::new();
    for candidate in [initials, stem] {
        if !candidate.is_empty() && !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_context::ContextEngine;
    use sqlctx_grammar::ParsedBuffer;
    use sqlctx_test_utils::{MockLoaderBuilder, SqlFixtures, assert_labels_exclude, assert_labels_include, split_cursor};

    fn hr_provider() -> CandidateProvider {
        let (_, catalog) = MockLoaderBuilder::new().with_hr_schema().build_catalog();
        CandidateProvider::new(catalog, Dialect::SqlServer)
    }

    async fn complete_with(provider: &CandidateProvider, input: &str) -> Candidates {
        let (sql, pos) = split_cursor(input);
        let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
        let context = ContextEngine::new(&buffer).detect(pos);
        let scope = LocalScope::from_context(&buffer.context_at(pos));
        provider.candidates_settled(&context, &scope).await
    }

    async fn complete(input: &str) -> Candidates {
        complete_with(&hr_provider(), input).await
    }

    #[tokio::test]
    async fn test_select_list_columns() {
        let result = complete(SqlFixtures::select_list()).await;
        assert!(result.is_settled());
        assert_labels_include(result.labels(), &["EmployeeID", "FirstName", "Salary"]);
        assert!(result.items.iter().all(|c| c.kind == CandidateKind::Column));
    }

    #[tokio::test]
    async fn test_qualified_alias_columns() {
        let result = complete(SqlFixtures::select_qualified()).await;
        assert_labels_include(result.labels(), &["FirstName", "ManagerID"]);
        assert_labels_exclude(result.labels(), &["DepartmentName", "e"]);
        let first = result.items.iter().find(|c| c.label == "Salary").unwrap();
        assert_eq!(first.detail.as_deref(), Some("e.Salary money"));
    }

    #[tokio::test]
    async fn test_undefined_alias_offers_nothing() {
        let result = complete(SqlFixtures::undefined_alias()).await;
        assert!(result.is_empty());
        assert!(result.is_settled());
    }

    #[tokio::test]
    async fn test_join_key_ranks_first() {
        let result = complete(SqlFixtures::where_comparison()).await;
        let first = &result.items[0];
        assert_eq!(first.label, "DepartmentID");
        assert_eq!(first.detail.as_deref(), Some("e.DepartmentID int"));

        let itself = result
            .items
            .iter()
            .find(|c| c.detail.as_deref() == Some("d.DepartmentID int"))
            .unwrap();
        assert!(itself.relevance < first.relevance);
    }

    #[tokio::test]
    async fn test_insert_value_ranks_positional_column() {
        let result = complete(SqlFixtures::insert_values()).await;
        assert_eq!(result.items[0].label, "LastName");
    }

    #[tokio::test]
    async fn test_exec_parameters() {
        let result = complete(SqlFixtures::exec_params()).await;
        assert_labels_include(result.labels(), &["@NewSalary", "@Reason", "@OldSalary"]);
        assert_labels_exclude(result.labels(), &["@EmployeeID"]);
        assert_eq!(result.items[0].label, "@NewSalary");

        let output = result.items.iter().find(|c| c.label == "@OldSalary").unwrap();
        assert_eq!(output.detail.as_deref(), Some("money OUTPUT"));
    }

    #[tokio::test]
    async fn test_schema_qualified_tables() {
        let result = complete(SqlFixtures::schema_qualified_from()).await;
        assert_eq!(result.labels(), vec!["ChangeLog"]);

        let result = complete(SqlFixtures::database_qualified_from()).await;
        assert_labels_include(result.labels(), &["Orders", "Customers"]);
        assert_labels_exclude(result.labels(), &["Employees"]);
    }

    #[tokio::test]
    async fn test_database_qualifier_lists_schemas() {
        let result = complete("SELECT * FROM Sales.█").await;
        assert_eq!(result.labels(), vec!["dbo"]);
        assert_eq!(result.items[0].kind, CandidateKind::Schema);
    }

    #[tokio::test]
    async fn test_from_offers_ctes_first() {
        let result = complete(SqlFixtures::cte_from()).await;
        assert_eq!(result.items[0].label, "EmpCTE");
        assert_eq!(result.items[0].kind, CandidateKind::Cte);
        assert_labels_include(result.labels(), &["Employees", "vw_ActiveEmployees", "Staff", "dbo", "audit"]);

        let result = complete(SqlFixtures::cte_out_of_scope()).await;
        assert_labels_exclude(result.labels(), &["EmpCTE"]);
    }

    #[tokio::test]
    async fn test_temp_table_in_from() {
        let result = complete("CREATE TABLE #Raise (EmployeeID INT);\nSELECT * FROM #R█").await;
        assert_eq!(result.labels(), vec!["#Raise"]);
        assert_eq!(result.items[0].kind, CandidateKind::TempTable);
    }

    #[tokio::test]
    async fn test_temp_table_columns() {
        let result = complete(SqlFixtures::temp_table_script()).await;
        assert_eq!(result.labels(), vec!["EmployeeID", "Amount"]);
    }

    #[tokio::test]
    async fn test_keywords_filtered_by_prefix() {
        let result = complete("SEL█").await;
        assert_labels_include(result.labels(), &["SELECT"]);
        assert!(result.items.iter().all(|c| c.kind == CandidateKind::Keyword));
        assert!(result.items.iter().all(|c| c.label.to_lowercase().starts_with("sel")));
    }

    #[tokio::test]
    async fn test_use_lists_databases() {
        let result = complete("USE █").await;
        assert_labels_include(result.labels(), &["Hr", "Sales", "master"]);
    }

    #[tokio::test]
    async fn test_alias_suggestions_skip_taken() {
        let result = complete("SELECT * FROM Departments e JOIN Employees AS █").await;
        assert_eq!(result.labels(), vec!["emp"]);
    }

    #[tokio::test]
    async fn test_schema_filter_hides_schema() {
        let provider = hr_provider().with_filter(SchemaFilter::new().hide_schema("audit"));
        let result = complete_with(&provider, "SELECT * FROM █").await;
        assert_labels_include(result.labels(), &["Employees", "dbo"]);
        assert_labels_exclude(result.labels(), &["audit"]);

        let result = complete_with(&provider, SqlFixtures::schema_qualified_from()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_loading_catalog_reports_pending() {
        let (loader, catalog) = MockLoaderBuilder::new().with_hr_schema().gated().build_catalog();
        let provider = CandidateProvider::new(catalog, Dialect::SqlServer);
        let (sql, pos) = split_cursor(SqlFixtures::select_list());
        let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
        let context = ContextEngine::new(&buffer).detect(pos);
        let scope = LocalScope::from_context(&buffer.context_at(pos));

        let first = provider.candidates_in_scope(&context, &scope);
        assert!(first.is_empty());
        assert!(!first.is_settled());

        loader.release();
        let settled = provider.candidates_settled(&context, &scope).await;
        assert_labels_include(settled.labels(), &["FirstName"]);
    }

    #[test]
    fn test_matches_prefix() {
        assert!(matches_prefix("Employees", "emp"));
        assert!(matches_prefix("Employees", ""));
        assert!(matches_prefix("@EmployeeID", "@Emp"));
        assert!(matches_prefix("@EmployeeID", "Emp"));
        assert!(matches_prefix("#Raise", "#r"));
        assert!(!matches_prefix("Raise", "#r"));
        assert!(!matches_prefix("Departments", "emp"));
    }

    #[test]
    fn test_alias_suggestions() {
        assert_eq!(alias_suggestions("Employees"), vec!["e", "emp"]);
        assert_eq!(alias_suggestions("EmployeeArchive"), vec!["ea", "emp"]);
        assert_eq!(alias_suggestions("vw_ActiveEmployees"), vec!["vae", "act"]);
        assert_eq!(alias_suggestions("#Raise"), vec!["r", "rai"]);
    }
}
