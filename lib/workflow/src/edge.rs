//! Edge types for workflow graphs.
//!
//! An edge is a directed transition between two nodes, optionally labeled
//! (e.g. "Yes" / "No" out of a condition node). Self-loops and parallel
//! edges between the same pair of nodes are permitted.

pub use crate::id::EdgeId;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// A directed transition between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: EdgeId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WorkflowEdge {
    /// Creates an unlabeled edge.
    #[must_use]
    pub fn new(id: EdgeId, source_node_id: NodeId, target_node_id: NodeId) -> Self {
        Self {
            id,
            source_node_id,
            target_node_id,
            label: None,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns true if either endpoint is `node_id`.
    #[must_use]
    pub fn touches(&self, node_id: &NodeId) -> bool {
        self.source_node_id == *node_id || self.target_node_id == *node_id
    }
}
