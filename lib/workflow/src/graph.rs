//! The workflow graph aggregate and its wire document.
//!
//! `WorkflowGraph` is the plain value handed to the validator and to the
//! persistence collaborator. It is produced by `GraphStore::snapshot` and
//! consumed by `GraphStore::hydrate`; holding one never gives access to the
//! store's live state.
//!
//! Graphs loaded from outside may be malformed (dangling edges, missing
//! start node). That is reported by the validator, not rejected here.

use crate::edge::WorkflowEdge;
use crate::error::DocumentError;
use crate::node::{NodeDocument, NodeId, WorkflowNode};
use crate::registry::NodeKind;
use serde::{Deserialize, Serialize};

/// A named workflow: its nodes and directed edges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "WorkflowDocument", into = "WorkflowDocument")]
pub struct WorkflowGraph {
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|node| node.id == *node_id)
    }

    /// Returns the nodes of one kind, in graph order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.iter().filter(move |node| node.kind() == kind)
    }

    /// Builds a graph from its wire document.
    ///
    /// # Errors
    ///
    /// Returns `UnrecognizedKind` for a node whose kind is not in the
    /// registry. A config value that does not fit its field is kept as
    /// written and reported by the validator. Nothing is dropped silently.
    pub fn from_document(document: WorkflowDocument) -> Result<Self, DocumentError> {
        let nodes = document
            .nodes
            .into_iter()
            .map(WorkflowNode::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: document.name,
            nodes,
            edges: document.edges,
        })
    }

    /// Decodes a graph from a JSON workflow document.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the payload does not have the document shape
    /// and `Rejected` if it does but names an unknown kind.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: WorkflowDocument =
            serde_json::from_str(json).map_err(|e| DocumentError::Malformed {
                reason: e.to_string(),
            })?;
        Self::from_document(document)
    }

    /// Encodes the graph as a pretty-printed JSON workflow document.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if a coordinate is not finite. `serde_json` would
    /// otherwise write it as `null`, which does not decode back.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        if let Some(node) = self
            .nodes
            .iter()
            .find(|node| !node.x.is_finite() || !node.y.is_finite())
        {
            return Err(DocumentError::Malformed {
                reason: format!("node {} is at non-finite position ({}, {})", node.id, node.x, node.y),
            });
        }
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Malformed {
            reason: e.to_string(),
        })
    }
}

/// Wire form of a workflow graph, as exchanged with the persistence API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl TryFrom<WorkflowDocument> for WorkflowGraph {
    type Error = DocumentError;

    fn try_from(document: WorkflowDocument) -> Result<Self, Self::Error> {
        Self::from_document(document)
    }
}

impl From<WorkflowGraph> for WorkflowDocument {
    fn from(graph: WorkflowGraph) -> Self {
        Self {
            name: graph.name,
            nodes: graph.nodes.into_iter().map(NodeDocument::from).collect(),
            edges: graph.edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;

    const MINIMAL: &str = r#"{
        "name": "Purchase order approval",
        "nodes": [
            {"id": "n1", "kind": "start", "x": 0, "y": 0, "config": {}},
            {"id": "n2", "kind": "end", "x": 100, "y": 0, "config": {}}
        ],
        "edges": [
            {"id": "e1", "sourceNodeId": "n1", "targetNodeId": "n2"}
        ]
    }"#;

    #[test]
    fn decodes_minimal_document() {
        let graph = WorkflowGraph::from_json(MINIMAL).expect("decode");
        assert_eq!(graph.name, "Purchase order approval");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes_of_kind(NodeKind::Start).count(), 1);
        assert_eq!(
            graph.node(&NodeId::from("n2")).map(WorkflowNode::kind),
            Some(NodeKind::End)
        );
    }

    #[test]
    fn unknown_kind_surfaces_as_rejected() {
        let json = r#"{"name": "x", "nodes": [{"id": "n1", "kind": "robot", "x": 0, "y": 0}]}"#;
        let err = WorkflowGraph::from_json(json).unwrap_err();
        assert_eq!(
            err,
            DocumentError::Rejected {
                source: StoreError::UnrecognizedKind {
                    node_id: Some(NodeId::from("n1")),
                    kind: "robot".to_string(),
                },
            }
        );
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = WorkflowGraph::from_json(r#"{"nodes": 3}"#).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed { .. }));
    }

    #[test]
    fn dangling_edges_are_kept_for_the_validator() {
        let json = r#"{
            "name": "stale",
            "nodes": [{"id": "n1", "kind": "start", "x": 0, "y": 0}],
            "edges": [{"id": "e1", "sourceNodeId": "n1", "targetNodeId": "gone"}]
        }"#;
        let graph = WorkflowGraph::from_json(json).expect("decode");
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn serde_uses_document_shape() {
        let graph = WorkflowGraph::from_json(MINIMAL).expect("decode");
        let value = serde_json::to_value(&graph).expect("serialize");
        assert_eq!(value["nodes"][0]["kind"], json!("start"));
        assert_eq!(value["nodes"][0]["config"], json!({}));
        assert_eq!(value["edges"][0]["sourceNodeId"], json!("n1"));

        let parsed: WorkflowGraph = serde_json::from_value(value).expect("deserialize");
        assert_eq!(parsed, graph);
    }

    #[test]
    fn ill_typed_config_loads_and_is_written_back() {
        for timeout in [json!("48"), json!(1.5)] {
            let json = json!({
                "name": "Deviation approval",
                "nodes": [
                    {"id": "n1", "kind": "start", "x": 0, "y": 0},
                    {"id": "n2", "kind": "approval", "x": 100, "y": 0,
                     "config": {"timeout": timeout, "assignee": "QA lead"}},
                    {"id": "n3", "kind": "end", "x": 200, "y": 0}
                ],
                "edges": []
            })
            .to_string();

            let graph = WorkflowGraph::from_json(&json).expect("decode");
            let approval = graph.node(&NodeId::from("n2")).expect("approval node");
            assert_eq!(approval.unfit_fields().collect::<Vec<_>>(), vec!["timeout"]);

            let encoded = graph.to_json_pretty().expect("encode");
            let value: serde_json::Value = serde_json::from_str(&encoded).expect("json");
            assert_eq!(value["nodes"][1]["config"]["timeout"], timeout);
            assert_eq!(value["nodes"][1]["config"]["assignee"], json!("QA lead"));
            assert_eq!(WorkflowGraph::from_json(&encoded).expect("decode again"), graph);
        }
    }

    #[test]
    fn non_finite_position_does_not_encode() {
        let mut graph = WorkflowGraph::from_json(MINIMAL).expect("decode");
        graph.nodes[1].x = f64::NAN;
        let err = graph.to_json_pretty().unwrap_err();
        assert!(matches!(err, DocumentError::Malformed { ref reason } if reason.contains("n2")));
    }
}
