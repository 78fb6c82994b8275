// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Catalog arena nodes
//!
//! Nodes are appended to an arena and never removed, so a [`NodeId`] stays
//! valid for the life of the catalog. A node's children are published as one
//! `Arc<[NodeId]>`; a load replaces the whole slice.

use std::sync::Arc;

use serde::Serialize;
use sqlctx_ir::{ColumnMetadata, ObjectKind, ObjectMetadata, ParameterMetadata};

/// Stable handle of a catalog node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root server node of every catalog
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Level of a node in the catalog tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Server,
    Database,
    Schema,
    Object(ObjectKind),
    Column,
    Parameter,
}

impl NodeKind {
    /// Leaves are born loaded
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Column | NodeKind::Parameter)
    }
}

/// Population state of a node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Name known, children never fetched
    Stub,
    /// A load is scheduled or running
    Loading,
    Loaded,
    /// The last load failed; only a refresh retries it
    Failed,
}

impl LoadState {
    /// Whether a load has finished, successfully or not
    pub fn is_settled(&self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed)
    }
}

/// Metadata carried by a node beyond its name
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeDetail {
    #[default]
    None,
    Object(ObjectMetadata),
    Column(ColumnMetadata),
    Parameter(ParameterMetadata),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) state: LoadState,
    pub(crate) children: Arc<[NodeId]>,
    pub(crate) detail: NodeDetail,
    /// Dropped from its parent by a refresh; the slot is never reused
    pub(crate) retired: bool,
}

impl Node {
    pub(crate) fn new(name: String, kind: NodeKind, parent: Option<NodeId>, detail: NodeDetail) -> Self {
        let state = if kind.is_leaf() {
            LoadState::Loaded
        } else {
            LoadState::Stub
        };
        Self {
            name,
            kind,
            parent,
            state,
            children: Arc::from(Vec::new()),
            detail,
            retired: false,
        }
    }

    pub(crate) fn info(&self, id: NodeId) -> NodeInfo {
        NodeInfo {
            id,
            name: self.name.clone(),
            kind: self.kind,
            parent: self.parent,
            state: self.state,
            detail: self.detail.clone(),
        }
    }
}

/// Snapshot of a node, detached from the arena
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub state: LoadState,
    pub detail: NodeDetail,
}

impl NodeInfo {
    pub fn object_kind(&self) -> Option<ObjectKind> {
        match self.kind {
            NodeKind::Object(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn column(&self) -> Option<&ColumnMetadata> {
        match &self.detail {
            NodeDetail::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn parameter(&self) -> Option<&ParameterMetadata> {
        match &self.detail {
            NodeDetail::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Names leading from the server to a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub object: Option<String>,
}
