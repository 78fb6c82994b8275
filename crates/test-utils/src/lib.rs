// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for the SQL context engine
//!
//! This crate provides common testing components including:
//! - A mock catalog loader with an HR fixture schema and load counting
//! - SQL fixtures and cursor-marker helpers
//! - A YAML corpus format for context-detection cases
//! - Candidate list assertions

pub mod assertions;
pub mod corpus;
pub mod cursor;
pub mod fixtures;
pub mod mock_loader;

// Re-exports for convenience
pub use assertions::{assert_labels_exclude, assert_labels_include};
pub use corpus::{ContextCase, CorpusError, parse_corpus, parse_corpus_file};
pub use cursor::{CURSOR, split_cursor};
pub use fixtures::{SchemaFixtures, SqlFixtures};
pub use mock_loader::{MockLoader, MockLoaderBuilder};

/// Install a test-friendly tracing subscriber once per process
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
