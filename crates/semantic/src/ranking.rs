// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Column ranking
//!
//! Reorders column candidates for the right-hand side of a comparison and for
//! positional INSERT values. Ranking never removes a candidate.
//!
//! Signals, strongest first:
//! - the candidate is the column the value lands in (`VALUES` position)
//! - same name as the left-hand column (`d.DepartmentID = e.DepartmentID`)
//! - both names end in `ID`, or the names are within a small edit distance
//! - compatible data types

use std::cmp::{max, min};

use sqlctx_ir::DataType;

/// Score of a column with no signal at all
pub const BASE_RELEVANCE: f64 = 0.6;

/// Minimum similarity for a near-miss name to count
const MIN_SIMILARITY: f64 = 0.6;

/// Column on the other side of the cursor's comparison
#[derive(Debug, Clone, PartialEq)]
pub struct LeftColumn {
    /// Exposed name of the table it belongs to, when known
    pub source: Option<String>,
    pub name: String,
    pub data_type: Option<DataType>,
}

/// Relevance scoring for column candidates
#[derive(Debug, Clone, Default)]
pub struct ColumnRanker {
    left: Option<LeftColumn>,
    positional: Option<String>,
}

impl ColumnRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_left_column(mut self, left: Option<LeftColumn>) -> Self {
        self.left = left;
        self
    }

    /// Column a VALUES entry at the cursor is inserted into
    pub fn with_positional(mut self, column: Option<&str>) -> Self {
        self.positional = column.map(str::to_string);
        self
    }

    pub fn has_signals(&self) -> bool {
        self.left.is_some() || self.positional.is_some()
    }

    /// Relevance of `name` from `source`, between 0.0 and 1.0
    pub fn score(&self, source: &str, name: &str, data_type: Option<&DataType>) -> f64 {
        let mut score = BASE_RELEVANCE;

        if self.positional.as_deref().is_some_and(|p| p.eq_ignore_ascii_case(name)) {
            score += 0.3;
        }

        if let Some(left) = &self.left {
            let same_name = left.name.eq_ignore_ascii_case(name);
            if same_name && left.source.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(source)) {
                // comparing a column with itself
                return (score - 0.3).clamp(0.0, 1.0);
            }

            if same_name {
                score += 0.25;
            } else if is_key_name(&left.name) && is_key_name(name) {
                score += 0.1;
            } else {
                let similarity = similarity_score(&left.name.to_lowercase(), &name.to_lowercase());
                if similarity >= MIN_SIMILARITY {
                    score += 0.1 * similarity;
                }
            }

            match (&left.data_type, data_type) {
                (Some(left), Some(right)) if left.is_compatible_with(right) => score += 0.1,
                (Some(_), Some(_)) => score -= 0.2,
                _ => {}
            }
        }

        score.clamp(0.0, 1.0)
    }
}

/// Names that look like keys: `ID`, `EmployeeID`, `customer_id`
fn is_key_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with("id")
}

/// Levenshtein distance, Wagner-Fischer with a single row per step
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m < n {
        return levenshtein_distance(b, a);
    }

    let mut previous: Vec<usize> = (0..=n).collect();
    for (i, &ca) in a_chars.iter().enumerate() {
        let mut current = vec![i + 1];
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current.push(min(min(previous[j + 1] + 1, current[j] + 1), previous[j] + cost));
        }
        previous = current;
    }

    previous[n]
}

/// Similarity between 0.0 and 1.0 based on edit distance
fn similarity_score(a: &str, b: &str) -> f64 {
    let max_len = max(a.chars().count(), b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(a, b) as f64 / max_len as f64)
}
