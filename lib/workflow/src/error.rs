//! Error types for the workflow crate.
//!
//! Errors are layered the same way the crate is:
//! - `StoreError`: graph store and selection failures
//! - `DocumentError`: decoding the workflow wire document
//! - `RepositoryError`: failures reported by the persistence collaborator
//! - `DesignerError`: session-level failures, carried in a rootcause `Report`

use crate::id::{EdgeId, NodeId};
use plantops_core::WorkflowId;
use std::fmt;

/// Errors from graph store operations.
///
/// These are returned, never raised, so the editing surface can ignore them
/// or surface a non-blocking notification.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No node with this id exists in the store.
    NodeNotFound { node_id: NodeId },
    /// No edge with this id exists in the store.
    EdgeNotFound { edge_id: EdgeId },
    /// An edge endpoint does not reference a node in the store.
    InvalidReference { node_id: NodeId },
    /// The node kind is not in the registry.
    UnrecognizedKind {
        node_id: Option<NodeId>,
        kind: String,
    },
    /// The field is not part of the node kind's configuration schema.
    UnknownField { kind: String, field: String },
    /// The value does not fit the field's type.
    InvalidFieldValue { field: String, reason: String },
    /// A canvas coordinate was NaN or infinite.
    InvalidPosition { x: f64, y: f64 },
    /// Two nodes in a loaded graph share an id.
    DuplicateNodeId { node_id: NodeId },
    /// Two edges in a loaded graph share an id.
    DuplicateEdgeId { edge_id: EdgeId },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
            Self::EdgeNotFound { edge_id } => write!(f, "edge not found: {edge_id}"),
            Self::InvalidReference { node_id } => {
                write!(f, "edge references missing node {node_id}")
            }
            Self::UnrecognizedKind {
                node_id: Some(node_id),
                kind,
            } => write!(f, "unrecognized node kind '{kind}' on node {node_id}"),
            Self::UnrecognizedKind {
                node_id: None,
                kind,
            } => write!(f, "unrecognized node kind '{kind}'"),
            Self::UnknownField { kind, field } => {
                write!(f, "field '{field}' is not configurable on {kind} nodes")
            }
            Self::InvalidFieldValue { field, reason } => {
                write!(f, "invalid value for field '{field}': {reason}")
            }
            Self::InvalidPosition { x, y } => {
                write!(f, "invalid canvas position ({x}, {y})")
            }
            Self::DuplicateNodeId { node_id } => write!(f, "duplicate node id: {node_id}"),
            Self::DuplicateEdgeId { edge_id } => write!(f, "duplicate edge id: {edge_id}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors decoding a workflow document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The payload is not a well-formed workflow document.
    Malformed { reason: String },
    /// The document is well-formed but describes an unusable graph.
    Rejected { source: StoreError },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed workflow document: {reason}"),
            Self::Rejected { source } => write!(f, "workflow document rejected: {source}"),
        }
    }
}

impl std::error::Error for DocumentError {}

impl From<StoreError> for DocumentError {
    fn from(source: StoreError) -> Self {
        Self::Rejected { source }
    }
}

/// Errors reported by a workflow repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No workflow stored under this id.
    NotFound { workflow_id: WorkflowId },
    /// The backing storage rejected the operation.
    StorageFailed { reason: String },
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { workflow_id } => write!(f, "workflow not found: {workflow_id}"),
            Self::StorageFailed { reason } => write!(f, "workflow storage failed: {reason}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Errors from designer session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignerError {
    /// Save was refused because the graph has validation errors.
    ValidationFailed { error_count: usize },
    /// Loading a workflow from the repository failed.
    Load { reason: String },
    /// Handing the snapshot to the repository failed.
    Save { reason: String },
    /// A loaded graph could not be placed in the store.
    Store { source: StoreError },
}

impl fmt::Display for DesignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed { error_count } => {
                write!(f, "workflow has {error_count} validation error(s)")
            }
            Self::Load { reason } => write!(f, "failed to load workflow: {reason}"),
            Self::Save { reason } => write!(f, "failed to save workflow: {reason}"),
            Self::Store { source } => write!(f, "workflow graph rejected: {source}"),
        }
    }
}

impl std::error::Error for DesignerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::NodeNotFound {
            node_id: NodeId::from("n1"),
        };
        assert_eq!(err.to_string(), "node not found: n1");
    }

    #[test]
    fn unrecognized_kind_mentions_node_when_known() {
        let err = StoreError::UnrecognizedKind {
            node_id: Some(NodeId::from("n7")),
            kind: "teleport".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unrecognized node kind 'teleport' on node n7"
        );

        let err = StoreError::UnrecognizedKind {
            node_id: None,
            kind: "teleport".to_string(),
        };
        assert_eq!(err.to_string(), "unrecognized node kind 'teleport'");
    }

    #[test]
    fn repository_error_display() {
        let workflow_id = WorkflowId::new();
        let err = RepositoryError::NotFound { workflow_id };
        assert!(err.to_string().contains("workflow not found"));
    }

    #[test]
    fn designer_error_wraps_store_error() {
        let err = DesignerError::Store {
            source: StoreError::DuplicateEdgeId {
                edge_id: EdgeId::from("e1"),
            },
        };
        assert!(err.to_string().contains("duplicate edge id: e1"));
    }
}
