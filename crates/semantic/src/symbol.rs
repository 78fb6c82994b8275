// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Semantic types of identifier parts
//!
//! Every part of a dotted name gets one [`SemanticType`]; highlighting paints
//! by it and completion uses it to decide what the next part can be.

use serde::{Deserialize, Serialize};
use sqlctx_catalog::{LoadHandle, NodeId, ObjectKind};

/// What one part of a qualified name designates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Database,
    Schema,
    Table,
    View,
    Procedure,
    Function,
    Synonym,
    Column,
    Alias,
    Cte,
    TempTable,
    Unresolved,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Database => "database",
            SemanticType::Schema => "schema",
            SemanticType::Table => "table",
            SemanticType::View => "view",
            SemanticType::Procedure => "procedure",
            SemanticType::Function => "function",
            SemanticType::Synonym => "synonym",
            SemanticType::Column => "column",
            SemanticType::Alias => "alias",
            SemanticType::Cte => "cte",
            SemanticType::TempTable => "temp_table",
            SemanticType::Unresolved => "unresolved",
        }
    }

    /// Whether the part names something with columns
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            SemanticType::Table
                | SemanticType::View
                | SemanticType::Synonym
                | SemanticType::Alias
                | SemanticType::Cte
                | SemanticType::TempTable
        )
    }
}

impl From<ObjectKind> for SemanticType {
    fn from(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Table => SemanticType::Table,
            ObjectKind::View => SemanticType::View,
            ObjectKind::Procedure => SemanticType::Procedure,
            ObjectKind::Function => SemanticType::Function,
            ObjectKind::Synonym => SemanticType::Synonym,
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a qualified name
///
/// `types` has one entry per part. `pending` lists catalog loads that were
/// scheduled while classifying; once they finish a second pass may resolve
/// parts that are `Unresolved` now.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub types: Vec<SemanticType>,
    pub pending: Vec<LoadHandle>,
}

impl Classification {
    pub(crate) fn with_capacity(parts: usize) -> Self {
        Self {
            types: Vec::with_capacity(parts),
            pending: Vec::new(),
        }
    }

    /// Whether no load is outstanding
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Type of the last part
    pub fn last(&self) -> Option<SemanticType> {
        self.types.last().copied()
    }

    /// Whether every part resolved
    pub fn is_resolved(&self) -> bool {
        !self.types.contains(&SemanticType::Unresolved)
    }

    pub(crate) fn push(&mut self, ty: SemanticType) {
        self.types.push(ty);
    }

    /// Pad the remaining parts as unresolved
    pub(crate) fn fill(&mut self, parts: usize) {
        self.types.resize(parts, SemanticType::Unresolved);
    }

    pub(crate) fn wait_on(&mut self, handle: Option<LoadHandle>) {
        if let Some(handle) = handle {
            if !self.pending.iter().any(|h| h.node() == handle.node()) {
                self.pending.push(handle);
            }
        }
    }

    /// Nodes the pending loads will populate
    pub fn pending_nodes(&self) -> Vec<NodeId> {
        self.pending.iter().map(LoadHandle::node).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_mapping() {
        assert_eq!(SemanticType::from(ObjectKind::View), SemanticType::View);
        assert_eq!(SemanticType::from(ObjectKind::Synonym), SemanticType::Synonym);
        assert!(SemanticType::Alias.is_relation());
        assert!(!SemanticType::Procedure.is_relation());
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&SemanticType::TempTable).unwrap();
        assert_eq!(json, "\"temp_table\"");
        assert_eq!(SemanticType::Cte.to_string(), "cte");
    }

    #[test]
    fn test_fill_pads_unresolved() {
        let mut classification = Classification::with_capacity(3);
        classification.push(SemanticType::Schema);
        classification.fill(3);
        assert_eq!(
            classification.types,
            vec![SemanticType::Schema, SemanticType::Unresolved, SemanticType::Unresolved]
        );
        assert!(!classification.is_resolved());
        assert!(classification.is_settled());
    }
}
