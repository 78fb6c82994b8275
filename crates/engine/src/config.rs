// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Engine Configuration
//!
//! Settings arrive either from a client settings payload (under the `sqlctx`
//! key) or from a YAML config file. Both use the same field names.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlctx_engine::{EngineConfig, Dialect};
//!
//! let config = EngineConfig::new(Dialect::SqlServer)
//!     .with_connected_database("Hr")
//!     .with_max_candidates(50);
//! config.validate()?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlctx_ir::Dialect;
use sqlctx_semantic::SchemaFilter;
use tracing_subscriber::EnvFilter;

/// Key client settings are nested under
pub const SETTINGS_KEY: &str = "sqlctx";

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQL dialect of the buffers
    pub dialect: Dialect,

    /// Database in effect before a script's first `USE`
    ///
    /// Falls back to `connected_database` when unset.
    pub ambient_database: Option<String>,

    /// Database unqualified names resolve against
    pub connected_database: Option<String>,

    /// Schemas and objects hidden from completion
    pub schema_filter: SchemaFilter,

    /// Upper bound on candidates per completion request
    pub max_candidates: usize,

    /// Maximum time for a single catalog load (seconds)
    pub load_timeout_secs: u64,

    /// `tracing` filter directive, e.g. `sqlctx_catalog=debug`
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::SqlServer,
            ambient_database: None,
            connected_database: None,
            schema_filter: SchemaFilter::default(),
            max_candidates: 200,
            load_timeout_secs: 10,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    pub fn with_connected_database(mut self, database: impl Into<String>) -> Self {
        self.connected_database = Some(database.into());
        self
    }

    pub fn with_ambient_database(mut self, database: impl Into<String>) -> Self {
        self.ambient_database = Some(database.into());
        self
    }

    pub fn with_schema_filter(mut self, filter: SchemaFilter) -> Self {
        self.schema_filter = filter;
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    pub fn with_load_timeout_secs(mut self, secs: u64) -> Self {
        self.load_timeout_secs = secs;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    /// Database a segmented script starts in
    pub fn initial_database(&self) -> Option<&str> {
        self.ambient_database
            .as_deref()
            .or(self.connected_database.as_deref())
    }

    /// Validate the configuration
    ///
    /// Checks that:
    /// - Candidate limit and load timeout are positive
    /// - Database names are not blank
    /// - The log filter parses
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_candidates == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_candidates",
                reason: "must be > 0".to_string(),
            });
        }

        if self.load_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "load_timeout_secs",
                reason: "must be > 0".to_string(),
            });
        }

        for (field, value) in [
            ("ambient_database", &self.ambient_database),
            ("connected_database", &self.connected_database),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be blank".to_string(),
                });
            }
        }

        if let Some(filter) = &self.log_filter {
            EnvFilter::try_new(filter).map_err(|e| ConfigError::InvalidLogFilter(e.to_string()))?;
        }

        Ok(())
    }

    /// Parse engine config from a client settings payload
    ///
    /// Expected shape:
    /// ```json
    /// { "sqlctx": { "dialect": "sqlserver", "connected_database": "Hr" } }
    /// ```
    /// Missing fields keep their defaults.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let section = settings.get(SETTINGS_KEY).ok_or(ConfigError::MissingSection)?;
        let config: Self = serde_json::from_value(section.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse engine config from a YAML config file's content
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settings payload without the `sqlctx` section
    #[error("Settings have no 'sqlctx' section")]
    MissingSection,

    /// A field holds an unusable value
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The log filter directive does not parse
    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),

    /// Malformed settings payload
    #[error("Invalid settings: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed config file
    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
