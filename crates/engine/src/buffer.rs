// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Buffer Management
//!
//! Open buffers and the tokens, statements and execution chunks parsed from
//! their current text. Every open or update produces a new generation; a snapshot of a
//! generation is immutable and shared behind an `Arc`, so requests against
//! the same buffer never wait on each other.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlctx_engine::BufferStore;
//!
//! let store = BufferStore::new(Dialect::SqlServer);
//! store.open("query.sql", "SELECT * FROM Employees");
//! let snapshot = store.get("query.sql").unwrap();
//! assert_eq!(snapshot.generation, 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use sqlctx_grammar::ParsedBuffer;
use sqlctx_ir::{Dialect, ExecutionChunk};
use tracing::debug;

/// One generation of a buffer
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
    pub id: String,
    /// Increases with every open or update, across all buffers
    pub generation: u64,
    pub parsed: Arc<ParsedBuffer>,
    /// Segmenter output, starting in the store's initial database
    pub chunks: Arc<[ExecutionChunk]>,
}

impl BufferSnapshot {
    pub fn text(&self) -> &str {
        self.parsed.text()
    }

    /// Database a `USE` earlier in the buffer switched to by `line`, or the
    /// initial database
    pub fn database_at(&self, line: u32) -> Option<&str> {
        sqlctx_segmenter::database_at(&self.chunks, line)
    }
}

/// Open buffers by id
#[derive(Debug)]
pub struct BufferStore {
    dialect: Dialect,
    initial_database: Option<String>,
    buffers: RwLock<HashMap<String, BufferSnapshot>>,
    generations: AtomicU64,
}

impl BufferStore {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            initial_database: None,
            buffers: RwLock::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// Database in effect before a buffer's first `USE`
    pub fn with_initial_database(mut self, database: Option<String>) -> Self {
        self.initial_database = database;
        self
    }

    /// Open a buffer, replacing any buffer with the same id
    pub fn open(&self, id: impl Into<String>, text: impl Into<String>) -> BufferSnapshot {
        let snapshot = self.snapshot(id.into(), text.into());
        self.buffers.write().insert(snapshot.id.clone(), snapshot.clone());
        snapshot
    }

    /// Replace the text of an open buffer
    ///
    /// Returns `None` when the buffer is not open.
    pub fn update(&self, id: &str, text: impl Into<String>) -> Option<BufferSnapshot> {
        if !self.contains(id) {
            return None;
        }
        // parse outside the lock
        let snapshot = self.snapshot(id.to_string(), text.into());
        let mut buffers = self.buffers.write();
        let slot = buffers.get_mut(id)?;
        *slot = snapshot.clone();
        Some(snapshot)
    }

    /// Close a buffer; returns whether it was open
    pub fn close(&self, id: &str) -> bool {
        let closed = self.buffers.write().remove(id).is_some();
        debug!(buffer = id, closed, "closed buffer");
        closed
    }

    pub fn get(&self, id: &str) -> Option<BufferSnapshot> {
        self.buffers.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.buffers.read().contains_key(id)
    }

    /// Whether `generation` is still the current text of `id`
    pub fn is_current(&self, id: &str, generation: u64) -> bool {
        self.buffers
            .read()
            .get(id)
            .is_some_and(|b| b.generation == generation)
    }

    pub fn ids(&self) -> Vec<String> {
        self.buffers.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.read().is_empty()
    }

    fn snapshot(&self, id: String, text: String) -> BufferSnapshot {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let chunks: Arc<[ExecutionChunk]> = sqlctx_segmenter::parse(&text, self.initial_database.as_deref()).into();
        let parsed = Arc::new(ParsedBuffer::parse(text, self.dialect));
        debug!(
            buffer = %id,
            generation,
            tokens = parsed.tokens().len(),
            statements = parsed.statements().len(),
            chunks = chunks.len(),
            "parsed buffer generation"
        );
        BufferSnapshot {
            id,
            generation,
            parsed,
            chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_update_close() {
        let store = BufferStore::new(Dialect::SqlServer);
        let first = store.open("a.sql", "SELECT 1");
        assert_eq!(first.generation, 1);
        assert_eq!(store.len(), 1);

        let second = store.update("a.sql", "SELECT 2").unwrap();
        assert!(second.generation > first.generation);
        assert_eq!(store.get("a.sql").unwrap().text(), "SELECT 2");
        assert!(!store.is_current("a.sql", first.generation));
        assert!(store.is_current("a.sql", second.generation));

        assert!(store.close("a.sql"));
        assert!(!store.close("a.sql"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_requires_open_buffer() {
        let store = BufferStore::new(Dialect::SqlServer);
        assert!(store.update("missing.sql", "SELECT 1").is_none());
        assert!(!store.contains("missing.sql"));
    }

    #[test]
    fn test_snapshot_tracks_use_switches() {
        let store = BufferStore::new(Dialect::SqlServer).with_initial_database(Some("Hr".into()));
        let snapshot = store.open("a.sql", "SELECT 1\nGO\nUSE Sales\nSELECT * FROM Orders");
        assert_eq!(snapshot.database_at(1), Some("Hr"));
        assert_eq!(snapshot.database_at(3), Some("Sales"));
        assert_eq!(snapshot.database_at(4), Some("Sales"));

        let updated = store.update("a.sql", "SELECT * FROM Orders").unwrap();
        assert_eq!(updated.database_at(1), Some("Hr"));
    }

    #[test]
    fn test_old_snapshot_survives_update() {
        let store = BufferStore::new(Dialect::SqlServer);
        let old = store.open("a.sql", "SELECT * FROM Employees");
        store.update("a.sql", "SELECT 1");
        assert_eq!(old.text(), "SELECT * FROM Employees");
        assert_eq!(store.ids(), vec!["a.sql".to_string()]);
    }
}
