// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Engine errors
//!
//! Only buffer bookkeeping, configuration and catalog setup can fail.
//! Classification itself always produces a result.

use sqlctx_catalog::CatalogError;
use thiserror::Error;

use crate::config::ConfigError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No buffer is open under this id
    #[error("Buffer '{0}' is not open")]
    UnknownBuffer(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
