//! Graph store: the single source of truth for the workflow being edited.
//!
//! Every mutation runs to completion inside one call, so no caller can
//! observe a node removed without its edges. The store never holds an edge
//! whose endpoints are missing.

use crate::edge::{EdgeId, WorkflowEdge};
use crate::error::StoreError;
use crate::graph::WorkflowGraph;
use crate::node::{NodeId, WorkflowNode};
use crate::registry::NodeKind;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use tracing::debug;

/// A node removed from the store together with the edges its removal
/// cascaded to.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: WorkflowNode,
    pub edges: Vec<WorkflowEdge>,
}

/// Editable nodes and edges of one open workflow.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    name: String,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
}

impl GraphStore {
    /// Creates an empty store for a new workflow.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Builds a store from a loaded graph.
    ///
    /// # Errors
    ///
    /// Fails closed if two nodes or two edges share an id, if a node sits at
    /// a non-finite position, or if an edge references a node the graph does
    /// not contain.
    pub fn hydrate(graph: WorkflowGraph) -> Result<Self, StoreError> {
        let mut node_ids = HashSet::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            check_position(node.x, node.y)?;
            if !node_ids.insert(node.id.as_str()) {
                return Err(StoreError::DuplicateNodeId {
                    node_id: node.id.clone(),
                });
            }
        }

        let mut edge_ids = HashSet::with_capacity(graph.edges.len());
        for edge in &graph.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(StoreError::DuplicateEdgeId {
                    edge_id: edge.id.clone(),
                });
            }
            for endpoint in [&edge.source_node_id, &edge.target_node_id] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(StoreError::InvalidReference {
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "hydrated graph store"
        );

        Ok(Self {
            name: graph.name,
            nodes: graph.nodes,
            edges: graph.edges,
        })
    }

    /// Returns the workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the workflow.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Places a new node of `kind` at the given canvas position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPosition` for a NaN or infinite coordinate.
    pub fn add_node(&mut self, kind: NodeKind, x: f64, y: f64) -> Result<&WorkflowNode, StoreError> {
        check_position(x, y)?;

        let mut id = NodeId::generate();
        while self.contains_node(&id) {
            id = NodeId::generate();
        }

        debug!(node_id = %id, %kind, x, y, "adding node");
        self.nodes.push(WorkflowNode::new(id, kind, x, y));
        let index = self.nodes.len() - 1;
        Ok(&self.nodes[index])
    }

    /// Places a new node of the kind named `kind`.
    ///
    /// # Errors
    ///
    /// Returns `UnrecognizedKind` if the name is not in the registry, or
    /// `InvalidPosition` for a NaN or infinite coordinate.
    pub fn add_node_named(
        &mut self,
        kind: &str,
        x: f64,
        y: f64,
    ) -> Result<&WorkflowNode, StoreError> {
        let kind: NodeKind = kind.parse()?;
        self.add_node(kind, x, y)
    }

    /// Sets one config field of a node; `null` unsets it. Other fields are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent, `UnknownField` if its
    /// kind has no such field, and `InvalidFieldValue` if the value does not
    /// fit.
    pub fn update_node_config(
        &mut self,
        node_id: &NodeId,
        field: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        let node = self.node_mut(node_id)?;
        node.set_field(field, value)?;
        debug!(%node_id, field, "updated node config");
        Ok(())
    }

    /// Moves a node to a new canvas position.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent or `InvalidPosition` for
    /// a NaN or infinite coordinate.
    pub fn move_node(&mut self, node_id: &NodeId, x: f64, y: f64) -> Result<(), StoreError> {
        check_position(x, y)?;
        let node = self.node_mut(node_id)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Removes a node and every edge that starts or ends at it.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent; the store is unchanged.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<RemovedNode, StoreError> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.id == *node_id)
            .ok_or_else(|| StoreError::NodeNotFound {
                node_id: node_id.clone(),
            })?;

        let node = self.nodes.remove(index);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge| edge.touches(node_id));
        self.edges = kept;

        debug!(%node_id, removed_edges = removed.len(), "deleted node");
        Ok(RemovedNode {
            node,
            edges: removed,
        })
    }

    /// Connects two existing nodes.
    ///
    /// Self-loops and repeated edges between the same pair are allowed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if either endpoint is absent; the edge set
    /// is unchanged.
    pub fn add_edge(
        &mut self,
        source_node_id: &NodeId,
        target_node_id: &NodeId,
        label: Option<String>,
    ) -> Result<&WorkflowEdge, StoreError> {
        for endpoint in [source_node_id, target_node_id] {
            if !self.contains_node(endpoint) {
                return Err(StoreError::InvalidReference {
                    node_id: endpoint.clone(),
                });
            }
        }

        let mut id = EdgeId::generate();
        while self.edge(&id).is_some() {
            id = EdgeId::generate();
        }

        debug!(edge_id = %id, source = %source_node_id, target = %target_node_id, "adding edge");
        self.edges.push(WorkflowEdge {
            id,
            source_node_id: source_node_id.clone(),
            target_node_id: target_node_id.clone(),
            label,
        });
        let index = self.edges.len() - 1;
        Ok(&self.edges[index])
    }

    /// Removes one edge.
    ///
    /// # Errors
    ///
    /// Returns `EdgeNotFound` if the edge is absent.
    pub fn delete_edge(&mut self, edge_id: &EdgeId) -> Result<WorkflowEdge, StoreError> {
        let index = self
            .edges
            .iter()
            .position(|edge| edge.id == *edge_id)
            .ok_or_else(|| StoreError::EdgeNotFound {
                edge_id: edge_id.clone(),
            })?;
        debug!(%edge_id, "deleted edge");
        Ok(self.edges.remove(index))
    }

    /// Returns an owned copy of the current graph.
    #[must_use]
    pub fn snapshot(&self) -> WorkflowGraph {
        WorkflowGraph {
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|node| node.id == *node_id)
    }

    #[must_use]
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&WorkflowEdge> {
        self.edges.iter().find(|edge| edge.id == *edge_id)
    }

    #[must_use]
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.node(node_id).is_some()
    }

    /// Returns all nodes in placement order.
    #[must_use]
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    /// Returns all edges in creation order.
    #[must_use]
    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the edges leaving a node.
    pub fn outgoing<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a WorkflowEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.source_node_id == *node_id)
    }

    /// Returns the edges entering a node.
    pub fn incoming<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a WorkflowEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.target_node_id == *node_id)
    }

    fn node_mut(&mut self, node_id: &NodeId) -> Result<&mut WorkflowNode, StoreError> {
        self.nodes
            .iter_mut()
            .find(|node| node.id == *node_id)
            .ok_or_else(|| StoreError::NodeNotFound {
                node_id: node_id.clone(),
            })
    }
}

fn check_position(x: f64, y: f64) -> Result<(), StoreError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidPosition { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    /// Builds `n1 (start) -> n2 (end)` with fixed ids.
    fn minimal_graph() -> WorkflowGraph {
        WorkflowGraph {
            name: "Minimal".to_string(),
            nodes: vec![
                WorkflowNode::new(NodeId::from("n1"), NodeKind::Start, 0.0, 0.0),
                WorkflowNode::new(NodeId::from("n2"), NodeKind::End, 100.0, 0.0),
            ],
            edges: vec![WorkflowEdge::new(
                EdgeId::from("e1"),
                NodeId::from("n1"),
                NodeId::from("n2"),
            )],
        }
    }

    #[test]
    fn add_node_starts_with_empty_config() {
        let mut store = GraphStore::new("Inbound inspection");
        let node = store.add_node(NodeKind::Approval, 120.0, 80.0).unwrap();
        assert_eq!(node.kind(), NodeKind::Approval);
        assert_eq!((node.x, node.y), (120.0, 80.0));
        assert!(node.config_map().is_empty());
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn add_node_named_rejects_unknown_kind() {
        let mut store = GraphStore::new("w");
        let err = store.add_node_named("teleport", 0.0, 0.0).unwrap_err();
        assert!(matches!(err, StoreError::UnrecognizedKind { .. }));
        assert_eq!(store.node_count(), 0);

        let node = store.add_node_named("webhook", 1.0, 2.0).unwrap();
        assert_eq!(node.kind(), NodeKind::Webhook);
    }

    #[test]
    fn add_node_rejects_non_finite_position() {
        let mut store = GraphStore::new("w");
        assert!(matches!(
            store.add_node(NodeKind::Task, f64::NAN, 0.0),
            Err(StoreError::InvalidPosition { .. })
        ));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn update_node_config_sets_one_field() {
        let mut store = GraphStore::new("w");
        let id = store.add_node(NodeKind::Approval, 0.0, 0.0).unwrap().id.clone();

        store
            .update_node_config(&id, "assignee", json!("QA lead"))
            .unwrap();
        store.update_node_config(&id, "timeout", json!(48)).unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!(node.field_value("assignee"), Some(json!("QA lead")));
        assert_eq!(node.field_value("timeout"), Some(json!(48)));
    }

    #[test]
    fn update_node_config_accepts_numeric_text() {
        let mut store = GraphStore::new("w");
        let id = store.add_node(NodeKind::Approval, 0.0, 0.0).unwrap().id.clone();

        store.update_node_config(&id, "timeout", json!("48")).unwrap();
        assert_eq!(store.node(&id).unwrap().field_value("timeout"), Some(json!(48)));

        let err = store
            .update_node_config(&id, "timeout", json!("two days"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidFieldValue { .. }));
        assert_eq!(store.node(&id).unwrap().field_value("timeout"), Some(json!(48)));
    }

    #[test]
    fn update_node_config_on_missing_node() {
        let mut store = GraphStore::new("w");
        let err = store
            .update_node_config(&NodeId::from("ghost"), "assignee", json!("x"))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::NodeNotFound {
                node_id: NodeId::from("ghost")
            }
        );
    }

    #[test]
    fn move_node_changes_position_only() {
        let mut store = GraphStore::hydrate(minimal_graph()).unwrap();
        let id = NodeId::from("n2");
        store.move_node(&id, 250.5, -40.0).unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!((node.x, node.y), (250.5, -40.0));
        assert_eq!(node.kind(), NodeKind::End);
        assert!(matches!(
            store.move_node(&NodeId::from("ghost"), 0.0, 0.0),
            Err(StoreError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn delete_node_cascades_to_edges() {
        let mut store = GraphStore::hydrate(minimal_graph()).unwrap();
        let removed = store.delete_node(&NodeId::from("n1")).unwrap();

        assert_eq!(removed.node.id, "n1");
        assert_eq!(removed.edges.len(), 1);

        let snapshot = store.snapshot();
        assert!(snapshot.edges.is_empty());
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].id, "n2");
    }

    #[test]
    fn delete_missing_node_leaves_store_unchanged() {
        let mut store = GraphStore::hydrate(minimal_graph()).unwrap();
        let before = store.snapshot();
        assert!(store.delete_node(&NodeId::from("ghost")).is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn add_edge_requires_both_endpoints() {
        let mut store = GraphStore::hydrate(minimal_graph()).unwrap();
        let err = store
            .add_edge(&NodeId::from("n1"), &NodeId::from("ghost"), None)
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidReference {
                node_id: NodeId::from("ghost")
            }
        );
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn add_edge_allows_self_loops_and_parallel_edges() {
        let mut store = GraphStore::hydrate(minimal_graph()).unwrap();
        let n1 = NodeId::from("n1");
        let n2 = NodeId::from("n2");

        store.add_edge(&n1, &n1, None).unwrap();
        store.add_edge(&n1, &n2, Some("Yes".to_string())).unwrap();
        assert_eq!(store.edge_count(), 3);
        assert_eq!(store.outgoing(&n1).count(), 3);
        assert_eq!(store.incoming(&n2).count(), 2);
    }

    #[test]
    fn delete_edge_by_id() {
        let mut store = GraphStore::hydrate(minimal_graph()).unwrap();
        let removed = store.delete_edge(&EdgeId::from("e1")).unwrap();
        assert_eq!(removed.source_node_id, "n1");
        assert_eq!(store.edge_count(), 0);
        assert_eq!(
            store.delete_edge(&EdgeId::from("e1")),
            Err(StoreError::EdgeNotFound {
                edge_id: EdgeId::from("e1")
            })
        );
    }

    #[test]
    fn snapshot_is_detached_from_the_store() {
        let mut store = GraphStore::hydrate(minimal_graph()).unwrap();
        let mut snapshot = store.snapshot();
        snapshot.nodes.clear();
        snapshot.edges.clear();
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);

        let frozen = store.snapshot();
        store.delete_node(&NodeId::from("n2")).unwrap();
        assert_eq!(frozen.nodes.len(), 2);
    }

    #[test]
    fn hydrate_rejects_duplicate_node_ids() {
        let mut graph = minimal_graph();
        graph
            .nodes
            .push(WorkflowNode::new(NodeId::from("n1"), NodeKind::Task, 0.0, 0.0));
        assert_eq!(
            GraphStore::hydrate(graph).unwrap_err(),
            StoreError::DuplicateNodeId {
                node_id: NodeId::from("n1")
            }
        );
    }

    #[test]
    fn hydrate_rejects_duplicate_edge_ids() {
        let mut graph = minimal_graph();
        graph.edges.push(WorkflowEdge::new(
            EdgeId::from("e1"),
            NodeId::from("n2"),
            NodeId::from("n1"),
        ));
        assert_eq!(
            GraphStore::hydrate(graph).unwrap_err(),
            StoreError::DuplicateEdgeId {
                edge_id: EdgeId::from("e1")
            }
        );
    }

    #[test]
    fn hydrate_rejects_non_finite_positions() {
        let mut graph = minimal_graph();
        graph.nodes[1].y = f64::INFINITY;
        assert_eq!(
            GraphStore::hydrate(graph).unwrap_err(),
            StoreError::InvalidPosition {
                x: 100.0,
                y: f64::INFINITY
            }
        );
    }

    #[test]
    fn hydrate_rejects_dangling_edges() {
        let mut graph = minimal_graph();
        graph.edges.push(WorkflowEdge::new(
            EdgeId::from("e2"),
            NodeId::from("n2"),
            NodeId::from("gone"),
        ));
        assert_eq!(
            GraphStore::hydrate(graph).unwrap_err(),
            StoreError::InvalidReference {
                node_id: NodeId::from("gone")
            }
        );
    }

    #[test]
    fn hydrate_then_snapshot_round_trips() {
        let graph = minimal_graph();
        let store = GraphStore::hydrate(graph.clone()).unwrap();
        assert_eq!(store.name(), "Minimal");
        assert_eq!(store.snapshot(), graph);
    }

    /// One random editing step.
    #[derive(Debug, Clone)]
    enum Op {
        Add(usize),
        Delete(usize),
        Connect(usize, usize),
        Disconnect(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0..NodeKind::ALL.len()).prop_map(Op::Add),
            1 => any::<usize>().prop_map(Op::Delete),
            3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Connect(a, b)),
            1 => any::<usize>().prop_map(Op::Disconnect),
        ]
    }

    fn apply(store: &mut GraphStore, ops: &[Op], seen: &mut HashSet<NodeId>) {
        for op in ops {
            match *op {
                Op::Add(kind) => {
                    let id = store
                        .add_node(NodeKind::ALL[kind], 0.0, 0.0)
                        .unwrap()
                        .id
                        .clone();
                    assert!(seen.insert(id), "node id reused");
                }
                Op::Delete(pick) if store.node_count() > 0 => {
                    let id = store.nodes()[pick % store.node_count()].id.clone();
                    store.delete_node(&id).unwrap();
                }
                Op::Connect(a, b) if store.node_count() > 0 => {
                    let source = store.nodes()[a % store.node_count()].id.clone();
                    let target = store.nodes()[b % store.node_count()].id.clone();
                    store.add_edge(&source, &target, None).unwrap();
                }
                Op::Disconnect(pick) if store.edge_count() > 0 => {
                    let id = store.edges()[pick % store.edge_count()].id.clone();
                    store.delete_edge(&id).unwrap();
                }
                _ => {}
            }
        }
    }

    proptest! {
        #[test]
        fn delete_node_never_leaves_dangling_edges(
            ops in prop::collection::vec(op(), 0..60),
            pick in any::<usize>(),
        ) {
            let mut store = GraphStore::new("prop");
            apply(&mut store, &ops, &mut HashSet::new());
            prop_assume!(store.node_count() > 0);

            let victim = store.nodes()[pick % store.node_count()].id.clone();
            store.delete_node(&victim).unwrap();

            let snapshot = store.snapshot();
            prop_assert!(snapshot.edges.iter().all(|edge| !edge.touches(&victim)));
            for edge in &snapshot.edges {
                prop_assert!(snapshot.node(&edge.source_node_id).is_some());
                prop_assert!(snapshot.node(&edge.target_node_id).is_some());
            }
        }

        #[test]
        fn node_ids_stay_unique_across_edits(ops in prop::collection::vec(op(), 0..80)) {
            let mut store = GraphStore::new("prop");
            let mut seen = HashSet::new();
            apply(&mut store, &ops, &mut seen);

            let live: HashSet<_> = store.nodes().iter().map(|node| node.id.clone()).collect();
            prop_assert_eq!(live.len(), store.node_count());
        }

        #[test]
        fn add_edge_to_missing_node_leaves_edges_untouched(
            ops in prop::collection::vec(op(), 0..40),
            pick in any::<usize>(),
            outward in any::<bool>(),
        ) {
            let mut store = GraphStore::new("prop");
            apply(&mut store, &ops, &mut HashSet::new());
            prop_assume!(store.node_count() > 0);

            let present = store.nodes()[pick % store.node_count()].id.clone();
            let missing = NodeId::from("missing");
            let before = store.edges().to_vec();

            let result = if outward {
                store.add_edge(&present, &missing, None).map(|_| ())
            } else {
                store.add_edge(&missing, &present, None).map(|_| ())
            };

            prop_assert_eq!(result, Err(StoreError::InvalidReference { node_id: missing }));
            prop_assert_eq!(store.edges(), before.as_slice());
        }

        #[test]
        fn document_round_trip_preserves_snapshot(
            ops in prop::collection::vec(op(), 0..40),
            coords in prop::collection::vec((-10_000i32..10_000, -10_000i32..10_000), 0..40),
        ) {
            let mut store = GraphStore::new("prop");
            apply(&mut store, &ops, &mut HashSet::new());
            let ids: Vec<_> = store.nodes().iter().map(|node| node.id.clone()).collect();
            for (id, (x, y)) in ids.iter().zip(coords) {
                store.move_node(id, f64::from(x), f64::from(y)).unwrap();
            }
            if let Some(first) = ids.first() {
                store.update_node_config(first, "description", json!("first step")).unwrap();
            }

            let before = store.snapshot();
            let encoded = before.to_json_pretty().unwrap();
            let reloaded = GraphStore::hydrate(WorkflowGraph::from_json(&encoded).unwrap()).unwrap();
            prop_assert_eq!(reloaded.snapshot(), before);
        }
    }
}
