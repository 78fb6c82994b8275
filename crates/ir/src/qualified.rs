// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Qualified names
//!
//! A qualified name is a dotted reference of one to four parts, potentially
//! `database.schema.table.column`. `has_trailing_dot` records that the cursor
//! sits right after the last dot: the name is incomplete and the *next* level is
//! being completed.

use serde::{Deserialize, Serialize};

/// Maximum number of parts in a dotted reference
pub const MAX_PARTS: usize = 4;

/// Dotted reference split into unquoted parts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Parts with delimiters stripped, outermost first
    pub parts: Vec<String>,
    /// Whether the raw text ended with a dot
    pub has_trailing_dot: bool,
}

impl QualifiedName {
    /// Build from already-split parts
    pub fn new(parts: Vec<String>, has_trailing_dot: bool) -> Self {
        Self {
            parts,
            has_trailing_dot,
        }
    }

    /// Split raw text such as `[Sales].dbo.` on dots outside delimiters
    ///
    /// Returns `None` for blank input. References longer than four parts keep
    /// their last four. An empty middle part (`Sales..Orders`) is kept as an
    /// empty string and means "default".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut parts = Vec::new();
        let mut current = String::new();
        let mut closer: Option<char> = None;
        let mut chars = raw.chars().peekable();

        while let Some(ch) = chars.next() {
            match closer {
                Some(close) => {
                    current.push(ch);
                    if ch == close {
                        // doubled closer is an escaped literal
                        if chars.peek() == Some(&close) {
                            current.push(close);
                            chars.next();
                        } else {
                            closer = None;
                        }
                    }
                }
                None => match ch {
                    '[' => {
                        closer = Some(']');
                        current.push(ch);
                    }
                    '"' | '`' => {
                        closer = Some(ch);
                        current.push(ch);
                    }
                    '.' => parts.push(std::mem::take(&mut current)),
                    c if c.is_whitespace() => {}
                    c => current.push(c),
                },
            }
        }

        let has_trailing_dot = current.is_empty() && raw.ends_with('.');
        if !has_trailing_dot {
            parts.push(current);
        }

        let mut parts: Vec<String> = parts.iter().map(|p| strip_delimiters(p)).collect();
        if parts.len() > MAX_PARTS {
            parts.drain(..parts.len() - MAX_PARTS);
        }
        if parts.is_empty() {
            return None;
        }

        Some(Self {
            parts,
            has_trailing_dot,
        })
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether there are no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Last part
    pub fn last(&self) -> Option<&str> {
        self.parts.last().map(String::as_str)
    }

    /// Parts as string slices
    pub fn as_strs(&self) -> Vec<&str> {
        self.parts.iter().map(String::as_str).collect()
    }

    /// Dotted form without delimiters
    pub fn joined(&self) -> String {
        self.parts.join(".")
    }
}

/// Remove `[]`, `""` or `` ` `` delimiters and unescape doubled closers
///
/// Unterminated delimiters (`[Sales` while typing) are stripped as well.
pub fn strip_delimiters(raw: &str) -> String {
    let raw = raw.trim();
    let (open, close) = match raw.chars().next() {
        Some('[') => ('[', ']'),
        Some('"') => ('"', '"'),
        Some('`') => ('`', '`'),
        _ => return raw.to_string(),
    };

    let inner = &raw[open.len_utf8()..];
    let inner = if inner.ends_with(close) && !inner.is_empty() {
        &inner[..inner.len() - close.len_utf8()]
    } else {
        inner
    };

    let doubled: String = [close, close].iter().collect();
    inner.replace(&doubled, &close.to_string())
}

/// Case-folded, undelimited form used as a lookup key
pub fn normalize_identifier(raw: &str) -> String {
    strip_delimiters(raw).to_lowercase()
}
