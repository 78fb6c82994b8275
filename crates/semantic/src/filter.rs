// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Hiding schemas and objects from completion
//!
//! Patterns are case-insensitive and `*` matches any run of characters.
//! Object patterns may be written `schema.name` to hide one schema's object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaFilter {
    /// Schema name patterns, e.g. `sys`, `tmp_*`
    pub hidden_schemas: Vec<String>,
    /// Object name patterns, e.g. `*_backup`, `audit.ChangeLog`
    pub hidden_objects: Vec<String>,
}

impl SchemaFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide_schema(mut self, pattern: impl Into<String>) -> Self {
        self.hidden_schemas.push(pattern.into());
        self
    }

    pub fn hide_object(mut self, pattern: impl Into<String>) -> Self {
        self.hidden_objects.push(pattern.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hidden_schemas.is_empty() && self.hidden_objects.is_empty()
    }

    pub fn allows_schema(&self, schema: &str) -> bool {
        !self.hidden_schemas.iter().any(|p| wildcard_match(p, schema))
    }

    /// Whether an object of `schema` may be offered
    pub fn allows_object(&self, schema: Option<&str>, name: &str) -> bool {
        if schema.is_some_and(|s| !self.allows_schema(s)) {
            return false;
        }
        !self.hidden_objects.iter().any(|pattern| match pattern.split_once('.') {
            Some((schema_pattern, name_pattern)) => {
                schema.is_some_and(|s| wildcard_match(schema_pattern, s)) && wildcard_match(name_pattern, name)
            }
            None => wildcard_match(pattern, name),
        })
    }
}

/// Case-insensitive match where `*` stands for any run of characters
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            // let the last star swallow one more character
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards() {
        assert!(wildcard_match("sys", "SYS"));
        assert!(wildcard_match("tmp_*", "tmp_orders"));
        assert!(wildcard_match("*_backup", "Employees_Backup"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("tmp_*", "orders"));
        assert!(!wildcard_match("a*c", "abd"));
    }

    #[test]
    fn test_hidden_schema_hides_its_objects() {
        let filter = SchemaFilter::new().hide_schema("audit");
        assert!(!filter.allows_schema("Audit"));
        assert!(!filter.allows_object(Some("audit"), "ChangeLog"));
        assert!(filter.allows_object(Some("dbo"), "Employees"));
    }

    #[test]
    fn test_object_patterns() {
        let filter = SchemaFilter::new().hide_object("*Archive").hide_object("dbo.Staff");
        assert!(!filter.allows_object(Some("dbo"), "EmployeeArchive"));
        assert!(!filter.allows_object(Some("dbo"), "Staff"));
        assert!(filter.allows_object(Some("hr"), "Staff"));
        assert!(filter.allows_object(None, "Employees"));
    }

    #[test]
    fn test_deserialize_partial() {
        let filter: SchemaFilter = serde_json::from_str(r#"{"hidden_schemas": ["sys"]}"#).unwrap();
        assert_eq!(filter.hidden_schemas, vec!["sys"]);
        assert!(filter.hidden_objects.is_empty());
        assert!(SchemaFilter::default().is_empty());
    }
}
