// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Execution chunks
//!
//! The segmenter turns a script into executable units, each carrying the
//! database in effect for it and the absolute line it starts on.

use serde::{Deserialize, Serialize};

/// Executable unit of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionChunk {
    /// SQL text with comments removed; empty for a `USE` switch
    pub sql: String,
    /// Database in effect: the latest `USE`, else the ambient database
    pub database: Option<String>,
    /// Whether this chunk is the zero-length switch produced by `USE`
    pub has_use_directive: bool,
    /// 1-indexed batch the chunk belongs to
    pub batch_number: u32,
    /// Absolute 1-indexed line of the chunk's first non-whitespace character
    pub start_line: u32,
}

impl ExecutionChunk {
    /// SQL chunk
    pub fn statement(sql: impl Into<String>, database: Option<String>, batch_number: u32, start_line: u32) -> Self {
        Self {
            sql: sql.into(),
            database,
            has_use_directive: false,
            batch_number,
            start_line,
        }
    }

    /// Zero-length database switch
    pub fn use_database(database: impl Into<String>, batch_number: u32, start_line: u32) -> Self {
        Self {
            sql: String::new(),
            database: Some(database.into()),
            has_use_directive: true,
            batch_number,
            start_line,
        }
    }

    /// Absolute line of the chunk's last line
    pub fn end_line(&self) -> u32 {
        let extra = self.sql.matches('\n').count() as u32;
        self.start_line + extra
    }
}
