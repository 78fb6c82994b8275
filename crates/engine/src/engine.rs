// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL engine facade
//!
//! [`SqlEngine`] ties the layers together for a host editor: it keeps open
//! buffers, answers completion and highlight requests, and reports when
//! catalog loads change an earlier answer.
//!
//! Requests never wait on the catalog. A response that depended on a level
//! still loading carries the pending loads; for highlights the engine
//! re-runs the request itself once they finish and publishes
//! [`EngineEvent::Reclassified`] if the buffer is still at that generation.
//!
//! Unqualified names resolve in the database a `USE` earlier in the buffer
//! switched to, else in the configured one. The switch is applied per request
//! and never changes the shared catalog's connected database.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use sqlctx_catalog::{CatalogListener, CatalogLoader, CatalogOptions, LazyCatalog, LoadHandle, NodeId};
use sqlctx_context::{ContextEngine, ContextResult};
use sqlctx_ir::{ExecutionChunk, Position};
use sqlctx_semantic::{Candidate, CandidateProvider, LocalScope};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::buffer::{BufferSnapshot, BufferStore};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::highlight::{HighlightSpan, identifier_chains, spans_for};

/// Notifications for the host
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A catalog node finished loading
    CatalogLoaded(NodeId),
    /// Fresh highlights for a buffer whose earlier ones were incomplete
    Reclassified {
        buffer_id: String,
        generation: u64,
        spans: Vec<HighlightSpan>,
    },
}

/// Answer to a completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionResponse {
    pub context: ContextResult,
    /// False inside strings and comments
    pub should_complete: bool,
    pub items: Vec<Candidate>,
    /// Loads that may add candidates once finished
    #[serde(skip)]
    pub pending: Vec<LoadHandle>,
}

impl CompletionResponse {
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Answer to a highlight request
#[derive(Debug, Clone)]
pub struct HighlightResponse {
    pub generation: u64,
    pub spans: Vec<HighlightSpan>,
    pub pending: Vec<LoadHandle>,
}

/// Forwards catalog load notifications to the event channel
struct EventForwarder {
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl CatalogListener for EventForwarder {
    fn on_catalog_loaded(&self, node: NodeId) {
        // a dropped receiver just means nobody listens
        let _ = self.events.send(EngineEvent::CatalogLoaded(node));
    }
}

struct Inner {
    config: EngineConfig,
    catalog: LazyCatalog,
    provider: CandidateProvider,
    buffers: BufferStore,
    events: mpsc::UnboundedSender<EngineEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<EngineEvent>>>,
    // kept alive for the catalog's weak listener list
    _forwarder: Arc<EventForwarder>,
}

/// Completion and highlighting over open buffers; clones share state
#[derive(Clone)]
pub struct SqlEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SqlEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlEngine")
            .field("dialect", &self.inner.config.dialect)
            .field("buffers", &self.inner.buffers.len())
            .field("catalog", &self.inner.catalog)
            .finish()
    }
}

impl SqlEngine {
    /// Build an engine over a catalog loader
    pub fn new(config: EngineConfig, loader: Arc<dyn CatalogLoader>) -> EngineResult<Self> {
        config.validate()?;

        let mut options = CatalogOptions::default().with_load_timeout(config.load_timeout());
        if let Some(database) = &config.connected_database {
            options = options.with_connected_database(database.clone());
        }
        let catalog = LazyCatalog::with_options(loader, options);
        if catalog.features().schemas != config.dialect.supports_schemas() {
            warn!(
                dialect = ?config.dialect,
                loader_schemas = catalog.features().schemas,
                "loader and dialect disagree on schema support; following the loader"
            );
        }

        let (events, receiver) = mpsc::unbounded_channel();
        let forwarder = Arc::new(EventForwarder { events: events.clone() });
        catalog.add_listener(&forwarder);

        let provider = CandidateProvider::new(catalog.clone(), config.dialect)
            .with_filter(config.schema_filter.clone());
        let buffers =
            BufferStore::new(config.dialect).with_initial_database(config.initial_database().map(str::to_string));

        info!(dialect = ?config.dialect, connected = ?config.connected_database, "engine ready");
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                catalog,
                provider,
                buffers,
                events,
                receiver: Mutex::new(Some(receiver)),
                _forwarder: forwarder,
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn catalog(&self) -> &LazyCatalog {
        &self.inner.catalog
    }

    pub fn buffers(&self) -> &BufferStore {
        &self.inner.buffers
    }

    /// Take the event stream; only the first call gets it
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.inner.receiver.lock().take()
    }

    pub fn open(&self, buffer_id: &str, text: impl Into<String>) -> u64 {
        self.inner.buffers.open(buffer_id, text).generation
    }

    pub fn update(&self, buffer_id: &str, text: impl Into<String>) -> EngineResult<u64> {
        self.inner
            .buffers
            .update(buffer_id, text)
            .map(|b| b.generation)
            .ok_or_else(|| EngineError::UnknownBuffer(buffer_id.to_string()))
    }

    pub fn close(&self, buffer_id: &str) -> bool {
        self.inner.buffers.close(buffer_id)
    }

    fn snapshot(&self, buffer_id: &str) -> EngineResult<BufferSnapshot> {
        self.inner
            .buffers
            .get(buffer_id)
            .ok_or_else(|| EngineError::UnknownBuffer(buffer_id.to_string()))
    }

    /// Completion candidates at `position`
    #[instrument(skip(self), fields(generation))]
    pub fn complete(&self, buffer_id: &str, position: Position) -> EngineResult<CompletionResponse> {
        let snapshot = self.snapshot(buffer_id)?;
        tracing::Span::current().record("generation", snapshot.generation);
        let (context, scope) = self.detect(&snapshot, position);
        let provider = self.provider_at(&snapshot, position.line);
        Ok(self.respond(&provider, context.result, context.should_complete, &scope))
    }

    /// Completion candidates once every catalog load they need has finished
    pub async fn complete_settled(&self, buffer_id: &str, position: Position) -> EngineResult<CompletionResponse> {
        let snapshot = self.snapshot(buffer_id)?;
        let (context, scope) = self.detect(&snapshot, position);
        let provider = self.provider_at(&snapshot, position.line);
        if !context.should_complete {
            return Ok(self.respond(&provider, context.result, false, &scope));
        }
        let candidates = provider.candidates_settled(&context.result, &scope).await;
        Ok(CompletionResponse {
            context: context.result,
            should_complete: true,
            items: self.truncate(candidates.items),
            pending: candidates.pending,
        })
    }

    fn detect(&self, snapshot: &BufferSnapshot, position: Position) -> (sqlctx_context::DetectedContext, LocalScope) {
        let parsed = &snapshot.parsed;
        let detected = ContextEngine::new(parsed).detect_full(position);
        let scope = LocalScope::from_context(&parsed.context_at(position));
        (detected, scope)
    }

    /// Database in effect on `line` of a buffer
    fn database_at<'a>(&'a self, snapshot: &'a BufferSnapshot, line: u32) -> Option<&'a str> {
        snapshot
            .database_at(line)
            .or(self.inner.config.initial_database())
    }

    fn provider_at(&self, snapshot: &BufferSnapshot, line: u32) -> CandidateProvider {
        self.inner.provider.in_database(self.database_at(snapshot, line))
    }

    fn respond(
        &self,
        provider: &CandidateProvider,
        context: ContextResult,
        should_complete: bool,
        scope: &LocalScope,
    ) -> CompletionResponse {
        if !should_complete {
            debug!("cursor inside string or comment");
            return CompletionResponse {
                context,
                should_complete,
                items: Vec::new(),
                pending: Vec::new(),
            };
        }
        let candidates = provider.candidates_in_scope(&context, scope);
        CompletionResponse {
            context,
            should_complete,
            items: self.truncate(candidates.items),
            pending: candidates.pending,
        }
    }

    fn truncate(&self, mut items: Vec<Candidate>) -> Vec<Candidate> {
        items.truncate(self.inner.config.max_candidates);
        items
    }

    /// Classify every identifier chain of a buffer
    ///
    /// When some parts wait on catalog loads and a tokio runtime is running,
    /// the engine retries after the loads finish and publishes
    /// [`EngineEvent::Reclassified`].
    #[instrument(skip(self))]
    pub fn highlight(&self, buffer_id: &str) -> EngineResult<HighlightResponse> {
        let snapshot = self.snapshot(buffer_id)?;
        let response = self.classify_buffer(&snapshot);
        if !response.pending.is_empty() {
            self.schedule_reclassify(snapshot, response.pending.clone());
        }
        Ok(response)
    }

    fn classify_buffer(&self, snapshot: &BufferSnapshot) -> HighlightResponse {
        let parsed = &snapshot.parsed;
        let base = self.inner.provider.resolver();
        let mut resolver = base.in_database(self.inner.config.initial_database());
        let mut spans = Vec::new();
        let mut pending: Vec<LoadHandle> = Vec::new();

        for chain in identifier_chains(parsed.tokens()) {
            let start = chain.start();
            let database = self.database_at(snapshot, start.line);
            if resolver.current_database().as_deref() != database {
                resolver = base.in_database(database);
            }
            let scope = LocalScope::from_context(&parsed.context_at(start));
            let classification = resolver.classify(&chain.names(), &scope);
            spans.extend(spans_for(&chain, &classification.types));
            for handle in classification.pending {
                if !pending.iter().any(|h| h.node() == handle.node()) {
                    pending.push(handle);
                }
            }
        }

        debug!(
            buffer = %snapshot.id,
            spans = spans.len(),
            pending = pending.len(),
            "classified buffer"
        );
        HighlightResponse {
            generation: snapshot.generation,
            spans,
            pending,
        }
    }

    fn schedule_reclassify(&self, snapshot: BufferSnapshot, pending: Vec<LoadHandle>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(buffer = %snapshot.id, "no runtime; reclassification left to the caller");
            return;
        };
        let engine = self.clone();
        runtime.spawn(async move {
            for handle in pending {
                handle.wait().await;
            }
            engine.reclassify(snapshot);
        });
    }

    fn reclassify(&self, snapshot: BufferSnapshot) {
        if !self.inner.buffers.is_current(&snapshot.id, snapshot.generation) {
            debug!(buffer = %snapshot.id, generation = snapshot.generation, "buffer changed; dropping reclassification");
            return;
        }
        let response = self.classify_buffer(&snapshot);
        if !response.pending.is_empty() {
            self.schedule_reclassify(snapshot.clone(), response.pending);
        }
        let _ = self.inner.events.send(EngineEvent::Reclassified {
            buffer_id: snapshot.id,
            generation: response.generation,
            spans: response.spans,
        });
    }

    /// Execution chunks of a buffer, starting in the configured database
    pub fn segments(&self, buffer_id: &str) -> EngineResult<Vec<ExecutionChunk>> {
        Ok(self.snapshot(buffer_id)?.chunks.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_ir::Dialect;
    use sqlctx_semantic::SemanticType;
    use sqlctx_test_utils::{MockLoaderBuilder, SqlFixtures, assert_labels_include, split_cursor};

    fn hr_engine() -> SqlEngine {
        let loader = MockLoaderBuilder::new().with_hr_schema().build();
        let config = EngineConfig::new(Dialect::SqlServer).with_connected_database("Hr");
        SqlEngine::new(config, Arc::new(loader)).unwrap()
    }

    #[tokio::test]
    async fn test_complete_select_list() {
        let engine = hr_engine();
        let (sql, pos) = split_cursor(SqlFixtures::select_list());
        engine.open("q.sql", sql);

        let response = engine.complete_settled("q.sql", pos).await.unwrap();
        assert!(response.should_complete);
        assert!(response.is_settled());
        assert_labels_include(response.items.iter().map(|c| c.label.as_str()), &["FirstName", "Salary"]);
    }

    #[tokio::test]
    async fn test_complete_inside_comment() {
        let engine = hr_engine();
        let (sql, pos) = split_cursor("SELECT 1 -- FROM █");
        engine.open("q.sql", sql);

        let response = engine.complete("q.sql", pos).unwrap();
        assert!(!response.should_complete);
        assert!(response.items.is_empty());
    }

    #[tokio::test]
    async fn test_max_candidates() {
        let loader = MockLoaderBuilder::new().with_hr_schema().build();
        let config = EngineConfig::new(Dialect::SqlServer)
            .with_connected_database("Hr")
            .with_max_candidates(3);
        let engine = SqlEngine::new(config, Arc::new(loader)).unwrap();
        let (sql, pos) = split_cursor(SqlFixtures::select_list());
        engine.open("q.sql", sql);

        let response = engine.complete_settled("q.sql", pos).await.unwrap();
        assert_eq!(response.items.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_buffer() {
        let engine = hr_engine();
        assert!(matches!(
            engine.complete("nope.sql", Position::new(1, 1)),
            Err(EngineError::UnknownBuffer(_))
        ));
        assert!(engine.update("nope.sql", "SELECT 1").is_err());
        assert!(!engine.close("nope.sql"));
    }

    #[tokio::test]
    async fn test_highlight_publishes_reclassification() {
        let engine = hr_engine();
        let mut events = engine.take_events().unwrap();
        assert!(engine.take_events().is_none());

        engine.open("q.sql", "SELECT e.Salary FROM Hr.dbo.Employees e");
        let first = engine.highlight("q.sql").unwrap();
        assert!(!first.pending.is_empty());

        let spans = loop {
            match events.recv().await {
                Some(EngineEvent::Reclassified { spans, .. }) if !spans.is_empty() => {
                    if spans.iter().all(|s| s.semantic_type != SemanticType::Unresolved) {
                        break spans;
                    }
                }
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        };
        let types: Vec<_> = spans.iter().map(|s| (s.text.as_str(), s.semantic_type)).collect();
        assert!(types.contains(&("Employees", SemanticType::Table)));
        assert!(types.contains(&("Salary", SemanticType::Column)));
        assert!(types.contains(&("Hr", SemanticType::Database)));
    }

    #[test]
    fn test_highlight_without_runtime() {
        let engine = hr_engine();
        engine.open("q.sql", "SELECT Salary FROM dbo.Employees");

        let mut response = engine.highlight("q.sql").unwrap();
        let mut rounds = 0;
        while !response.pending.is_empty() {
            // queued loads only run when drained
            assert!(tokio_test::block_on(engine.catalog().drain()) > 0);
            response = engine.highlight("q.sql").unwrap();
            rounds += 1;
        }
        assert!(rounds > 0);
        let types: Vec<_> = response.spans.iter().map(|s| s.semantic_type).collect();
        assert_eq!(types, vec![SemanticType::Column, SemanticType::Schema, SemanticType::Table]);
    }

    #[tokio::test]
    async fn test_segments_use_connected_database() {
        let engine = hr_engine();
        engine.open("s.sql", SqlFixtures::hr_script());
        let chunks = engine.segments("s.sql").unwrap();
        assert!(chunks.iter().any(|c| c.database.as_deref() == Some("Sales")));
        assert_eq!(chunks[0].database.as_deref(), Some("Hr"));
    }
}
