// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Context-detection corpus format
//!
//! A corpus is a YAML list of cases. Each case holds SQL with one `█` cursor
//! marker and what the engine should report there:
//!
//! ```yaml
//! - description: columns of the FROM table
//!   input: "SELECT █ FROM Employees"
//!   kind: column
//!   include: [EmployeeID, FirstName]
//!   exclude: [DepartmentName]
//! ```
//!
//! `kind` and `mode` are the snake_case names the engine serializes.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::cursor::CURSOR;

/// A single context-detection case
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContextCase {
    pub description: String,
    pub input: String,
    pub kind: String,
    #[serde(default)]
    pub mode: Option<String>,
    /// Candidate labels that must be offered
    #[serde(default)]
    pub include: Vec<String>,
    /// Candidate labels that must not be offered
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Expect no candidates at all
    #[serde(default)]
    pub empty: bool,
}

/// Corpus parse errors
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid corpus: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Case '{0}' has no cursor marker")]
    MissingCursor(String),

    #[error("Empty corpus")]
    Empty,
}

/// Parse corpus content from a string
pub fn parse_corpus(content: &str) -> Result<Vec<ContextCase>, CorpusError> {
    let cases: Vec<ContextCase> = serde_yaml::from_str(content)?;
    if cases.is_empty() {
        return Err(CorpusError::Empty);
    }
    if let Some(case) = cases.iter().find(|c| !c.input.contains(CURSOR)) {
        return Err(CorpusError::MissingCursor(case.description.clone()));
    }
    Ok(cases)
}

/// Parse a corpus file
pub fn parse_corpus_file(path: &Path) -> Result<Vec<ContextCase>, CorpusError> {
    let content = std::fs::read_to_string(path)?;
    parse_corpus(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus() {
        let cases = parse_corpus(
            r#"
- description: select list
  input: "SELECT █ FROM Employees"
  kind: column
  include: [EmployeeID]
- description: bad alias
  input: "SELECT x.█ FROM Employees e"
  kind: column
  mode: qualified
  empty: true
"#,
        )
        .unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].include, vec!["EmployeeID"]);
        assert_eq!(cases[1].mode.as_deref(), Some("qualified"));
        assert!(cases[1].empty);
    }

    #[test]
    fn test_missing_cursor() {
        let err = parse_corpus("- { description: nope, input: SELECT 1, kind: keyword }").unwrap_err();
        assert!(matches!(err, CorpusError::MissingCursor(_)));
    }

    #[test]
    fn test_empty_corpus() {
        assert!(matches!(parse_corpus("[]"), Err(CorpusError::Empty)));
    }
}
