//! Structural validation of a workflow graph before save.
//!
//! The validator reads a snapshot and produces a report. Malformed graphs
//! are described by the report; they never make the validator fail.
//!
//! Errors (block save):
//! - `NoStartNode` / `NoEndNode`: at most one of each per report
//! - `OrphanNode`: a node with no incident edge at all
//! - `DanglingEdge`: an edge whose source or target is not in the graph
//!
//! Warnings (advisory):
//! - `MissingDescription`: a node without a description
//! - `TooManyBranches`: a condition node fanning out past the threshold
//! - `UnreachableNode`: a connected node no start node leads to
//! - `UnfitFieldValue`: a loaded config value that does not fit its field

use crate::edge::EdgeId;
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use crate::registry::NodeKind;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, instrument};

/// Tunables for advisory checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Outgoing branches a condition node may have before a warning.
    pub max_condition_branches: usize,
    pub warn_missing_description: bool,
    pub warn_unreachable: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_condition_branches: 5,
            warn_missing_description: true,
            warn_unreachable: true,
        }
    }
}

/// Structural problems that block save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NoStartNode,
    NoEndNode,
    OrphanNode,
    DanglingEdge,
}

/// Advisory findings that never block save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    MissingDescription,
    TooManyBranches,
    UnreachableNode,
    UnfitFieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<EdgeId>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub kind: WarningKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    pub message: String,
}

/// Outcome of one validator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    is_valid: bool,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    fn new(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// True iff there are no errors. Warnings do not count.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Returns the errors attached to one node, for focusing it in the UI.
    pub fn errors_for<'a>(
        &'a self,
        node_id: &'a NodeId,
    ) -> impl Iterator<Item = &'a ValidationError> {
        self.errors
            .iter()
            .filter(move |error| error.node_id.as_ref() == Some(node_id))
    }

    /// Returns true if any error has the given kind.
    #[must_use]
    pub fn has_error(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind == kind)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({} error(s), {} warning(s))",
            if self.is_valid { "valid" } else { "invalid" },
            self.errors.len(),
            self.warnings.len()
        )?;
        for error in &self.errors {
            writeln!(f, "  error:   {}", error.message)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning.message)?;
        }
        Ok(())
    }
}

/// Runs structural checks over workflow graphs.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates a graph without modifying it.
    #[instrument(skip_all, fields(workflow = %graph.name, nodes = graph.nodes.len(), edges = graph.edges.len()))]
    pub fn run(&self, graph: &WorkflowGraph) -> ValidationReport {
        let mut errors = Vec::new();

        if graph.nodes_of_kind(NodeKind::Start).next().is_none() {
            errors.push(ValidationError {
                kind: ErrorKind::NoStartNode,
                node_id: None,
                edge_id: None,
                message: "workflow has no start node".to_string(),
            });
        }
        if graph.nodes_of_kind(NodeKind::End).next().is_none() {
            errors.push(ValidationError {
                kind: ErrorKind::NoEndNode,
                node_id: None,
                edge_id: None,
                message: "workflow has no end node".to_string(),
            });
        }

        let incidence = incidence(graph);
        for node in &graph.nodes {
            if incidence.get(node.id.as_str()).copied().unwrap_or(0) == 0 {
                errors.push(ValidationError {
                    kind: ErrorKind::OrphanNode,
                    node_id: Some(node.id.clone()),
                    edge_id: None,
                    message: format!("node {} is not connected to any other node", node.id),
                });
            }
        }

        let node_ids: HashSet<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
        for edge in &graph.edges {
            let missing: Vec<&str> = [&edge.source_node_id, &edge.target_node_id]
                .into_iter()
                .map(NodeId::as_str)
                .filter(|id| !node_ids.contains(id))
                .collect();
            if !missing.is_empty() {
                errors.push(ValidationError {
                    kind: ErrorKind::DanglingEdge,
                    node_id: None,
                    edge_id: Some(edge.id.clone()),
                    message: format!(
                        "edge {} references missing node {}",
                        edge.id,
                        missing.join(" and ")
                    ),
                });
            }
        }

        let warnings = self.warnings(graph, &incidence, &node_ids);
        let report = ValidationReport::new(errors, warnings);
        debug!(
            valid = report.is_valid(),
            errors = report.errors().len(),
            warnings = report.warnings().len(),
            "validated workflow"
        );
        report
    }

    fn warnings(
        &self,
        graph: &WorkflowGraph,
        incidence: &HashMap<&str, usize>,
        node_ids: &HashSet<&str>,
    ) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if self.config.warn_missing_description {
            for node in graph.nodes.iter().filter(|node| !node.details.has_description()) {
                warnings.push(ValidationWarning {
                    kind: WarningKind::MissingDescription,
                    node_id: Some(node.id.clone()),
                    message: format!("node {} has no description", node.id),
                });
            }
        }

        for node in &graph.nodes {
            for field in node.unfit_fields() {
                warnings.push(ValidationWarning {
                    kind: WarningKind::UnfitFieldValue,
                    node_id: Some(node.id.clone()),
                    message: format!(
                        "node {} has a value for '{field}' that does not fit the field",
                        node.id
                    ),
                });
            }
        }

        for node in graph.nodes_of_kind(NodeKind::Condition) {
            let branches = graph
                .edges
                .iter()
                .filter(|edge| edge.source_node_id == node.id)
                .count();
            if branches > self.config.max_condition_branches {
                warnings.push(ValidationWarning {
                    kind: WarningKind::TooManyBranches,
                    node_id: Some(node.id.clone()),
                    message: format!(
                        "condition node {} has {branches} outgoing branches (more than {})",
                        node.id, self.config.max_condition_branches
                    ),
                });
            }
        }

        if self.config.warn_unreachable {
            let reached = reachable_from_start(graph, node_ids);
            if !reached.is_empty() {
                for node in &graph.nodes {
                    let id = node.id.as_str();
                    let connected = incidence.get(id).copied().unwrap_or(0) > 0;
                    if connected && !reached.contains(id) {
                        warnings.push(ValidationWarning {
                            kind: WarningKind::UnreachableNode,
                            node_id: Some(node.id.clone()),
                            message: format!("node {} cannot be reached from a start node", node.id),
                        });
                    }
                }
            }
        }

        warnings
    }
}

/// Counts incident edges (in + out) per node id, over every edge.
fn incidence(graph: &WorkflowGraph) -> HashMap<&str, usize> {
    let mut counts = HashMap::with_capacity(graph.nodes.len());
    for edge in &graph.edges {
        *counts.entry(edge.source_node_id.as_str()).or_insert(0) += 1;
        *counts.entry(edge.target_node_id.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Returns the ids reachable from any start node over resolvable edges,
/// start nodes included. Empty when the graph has no start node.
fn reachable_from_start<'a>(
    graph: &'a WorkflowGraph,
    node_ids: &HashSet<&'a str>,
) -> HashSet<&'a str> {
    let mut map: DiGraphMap<&str, ()> = DiGraphMap::new();
    for node in &graph.nodes {
        map.add_node(node.id.as_str());
    }
    for edge in &graph.edges {
        let (source, target) = (edge.source_node_id.as_str(), edge.target_node_id.as_str());
        if node_ids.contains(source) && node_ids.contains(target) {
            map.add_edge(source, target, ());
        }
    }

    let mut reached = HashSet::new();
    let mut dfs = Dfs::empty(&map);
    for start in graph.nodes_of_kind(NodeKind::Start) {
        dfs.move_to(start.id.as_str());
        while let Some(id) = dfs.next(&map) {
            reached.insert(id);
        }
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::WorkflowEdge;
    use crate::node::WorkflowNode;
    use crate::store::GraphStore;
    use proptest::prelude::*;

    fn node(id: &str, kind: NodeKind) -> WorkflowNode {
        WorkflowNode::new(NodeId::from(id), kind, 0.0, 0.0)
    }

    fn edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
        WorkflowEdge::new(EdgeId::from(id), NodeId::from(source), NodeId::from(target))
    }

    fn minimal() -> WorkflowGraph {
        WorkflowGraph {
            name: "Minimal".to_string(),
            nodes: vec![node("n1", NodeKind::Start), node("n2", NodeKind::End)],
            edges: vec![edge("e1", "n1", "n2")],
        }
    }

    fn error_kinds(report: &ValidationReport) -> Vec<(ErrorKind, Option<&str>)> {
        report
            .errors()
            .iter()
            .map(|error| (error.kind, error.node_id.as_ref().map(NodeId::as_str)))
            .collect()
    }

    #[test]
    fn minimal_graph_is_valid() {
        let report = Validator::default().run(&minimal());
        assert!(report.is_valid());
        assert!(report.errors().is_empty());
    }

    #[test]
    fn isolated_node_is_an_orphan() {
        let mut graph = minimal();
        graph.nodes.push(node("n3", NodeKind::Approval));

        let report = Validator::default().run(&graph);
        assert!(!report.is_valid());
        assert_eq!(error_kinds(&report), vec![(ErrorKind::OrphanNode, Some("n3"))]);
        assert_eq!(report.errors_for(&NodeId::from("n3")).count(), 1);
    }

    #[test]
    fn missing_end_also_orphans_the_start() {
        let mut graph = minimal();
        graph.nodes.retain(|node| node.id != "n2");
        graph.edges.clear();

        let report = Validator::default().run(&graph);
        assert_eq!(
            error_kinds(&report),
            vec![
                (ErrorKind::NoEndNode, None),
                (ErrorKind::OrphanNode, Some("n1")),
            ]
        );
    }

    #[test]
    fn empty_graph_reports_each_missing_marker_once() {
        let report = Validator::default().run(&WorkflowGraph::new("empty"));
        assert_eq!(
            error_kinds(&report),
            vec![(ErrorKind::NoStartNode, None), (ErrorKind::NoEndNode, None)]
        );
        assert!(report.has_error(ErrorKind::NoEndNode));
        assert!(!report.has_error(ErrorKind::OrphanNode));
    }

    #[test]
    fn dangling_edge_is_reported_once_per_edge() {
        let mut graph = minimal();
        graph.edges.push(edge("e2", "ghost", "phantom"));

        let report = Validator::default().run(&graph);
        assert_eq!(report.errors().len(), 1);
        let error = &report.errors()[0];
        assert_eq!(error.kind, ErrorKind::DanglingEdge);
        assert_eq!(error.edge_id, Some(EdgeId::from("e2")));
        assert!(error.message.contains("ghost and phantom"));
    }

    #[test]
    fn warnings_never_block_save() {
        let report = Validator::default().run(&minimal());
        assert!(report.is_valid());
        assert_eq!(report.warnings().len(), 2);
        assert!(
            report
                .warnings()
                .iter()
                .all(|warning| warning.kind == WarningKind::MissingDescription)
        );
    }

    #[test]
    fn description_silences_the_warning() {
        let mut graph = minimal();
        for node in &mut graph.nodes {
            node.details.description = Some("documented".to_string());
        }
        assert!(Validator::default().run(&graph).warnings().is_empty());
    }

    #[test]
    fn wide_condition_is_flagged() {
        let mut graph = minimal();
        graph.nodes.push(node("c1", NodeKind::Condition));
        graph.edges.push(edge("in", "n1", "c1"));
        for branch in 0..3 {
            graph
                .edges
                .push(edge(&format!("b{branch}"), "c1", "n2"));
        }

        let config = ValidatorConfig {
            max_condition_branches: 2,
            warn_missing_description: false,
            ..ValidatorConfig::default()
        };
        let report = Validator::new(config).run(&graph);
        assert!(report.is_valid());
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.warnings()[0].kind, WarningKind::TooManyBranches);

        let relaxed = Validator::new(ValidatorConfig {
            warn_missing_description: false,
            ..ValidatorConfig::default()
        });
        assert_eq!(relaxed.config().max_condition_branches, 5);
        assert!(relaxed.run(&graph).warnings().is_empty());
    }

    #[test]
    fn unreachable_island_is_a_warning() {
        let mut graph = minimal();
        graph.nodes.push(node("t1", NodeKind::Task));
        graph.nodes.push(node("t2", NodeKind::Task));
        graph.edges.push(edge("e2", "t1", "t2"));

        let config = ValidatorConfig {
            warn_missing_description: false,
            ..ValidatorConfig::default()
        };
        let report = Validator::new(config).run(&graph);
        assert!(report.is_valid());
        let flagged: Vec<_> = report
            .warnings()
            .iter()
            .map(|warning| warning.node_id.as_ref().map(NodeId::as_str))
            .collect();
        assert_eq!(flagged, vec![Some("t1"), Some("t2")]);
    }

    #[test]
    fn unfit_loaded_value_is_a_warning() {
        let graph = WorkflowGraph::from_json(
            r#"{
                "name": "Deviation approval",
                "nodes": [
                    {"id": "n1", "kind": "start", "x": 0, "y": 0},
                    {"id": "n2", "kind": "approval", "x": 100, "y": 0,
                     "config": {"timeout": "48", "assignee": "QA lead"}},
                    {"id": "n3", "kind": "end", "x": 200, "y": 0}
                ],
                "edges": [
                    {"id": "e1", "sourceNodeId": "n1", "targetNodeId": "n2"},
                    {"id": "e2", "sourceNodeId": "n2", "targetNodeId": "n3"}
                ]
            }"#,
        )
        .expect("an ill-typed value does not block loading");

        let config = ValidatorConfig {
            warn_missing_description: false,
            ..ValidatorConfig::default()
        };
        let report = Validator::new(config).run(&graph);
        assert!(report.is_valid());
        assert_eq!(report.warnings().len(), 1);
        let warning = &report.warnings()[0];
        assert_eq!(warning.kind, WarningKind::UnfitFieldValue);
        assert_eq!(warning.node_id, Some(NodeId::from("n2")));
        assert!(warning.message.contains("'timeout'"));
    }

    #[test]
    fn report_serializes_with_is_valid_flag() {
        let report = Validator::default().run(&WorkflowGraph::new("empty"));
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["isValid"], serde_json::json!(false));
        assert_eq!(json["errors"][0]["kind"], serde_json::json!("NoStartNode"));
    }

    #[test]
    fn display_lists_errors() {
        let report = Validator::default().run(&WorkflowGraph::new("empty"));
        let text = report.to_string();
        assert!(text.starts_with("invalid (2 error(s), 0 warning(s))"));
        assert!(text.contains("workflow has no start node"));
    }

    /// A connected graph: one start, one end, and `middle` nodes chained
    /// between them, plus `extra` random edges among existing nodes.
    fn connected_graph() -> impl Strategy<Value = WorkflowGraph> {
        (
            prop::collection::vec(2..NodeKind::ALL.len(), 0..12),
            prop::collection::vec((any::<usize>(), any::<usize>()), 0..12),
        )
            .prop_map(|(middle, extra)| {
                let mut store = GraphStore::new("generated");
                let mut chain = vec![store.add_node(NodeKind::Start, 0.0, 0.0).unwrap().id.clone()];
                for kind in middle {
                    chain.push(store.add_node(NodeKind::ALL[kind], 0.0, 0.0).unwrap().id.clone());
                }
                chain.push(store.add_node(NodeKind::End, 0.0, 0.0).unwrap().id.clone());
                for pair in chain.windows(2) {
                    store.add_edge(&pair[0], &pair[1], None).unwrap();
                }
                for (a, b) in extra {
                    let source = chain[a % chain.len()].clone();
                    let target = chain[b % chain.len()].clone();
                    store.add_edge(&source, &target, None).unwrap();
                }
                store.snapshot()
            })
    }

    proptest! {
        #[test]
        fn connected_graphs_are_valid(graph in connected_graph()) {
            let report = Validator::default().run(&graph);
            prop_assert!(report.is_valid(), "{}", report);
        }

        #[test]
        fn missing_start_is_reported_exactly_once(graph in connected_graph()) {
            let mut graph = graph;
            graph.nodes.retain(|node| node.kind() != NodeKind::Start);

            let report = Validator::default().run(&graph);
            let count = report
                .errors()
                .iter()
                .filter(|error| error.kind == ErrorKind::NoStartNode)
                .count();
            prop_assert_eq!(count, 1);
            prop_assert!(!report.is_valid());
        }

        #[test]
        fn validity_matches_error_list(graph in connected_graph(), drop in any::<usize>()) {
            let mut graph = graph;
            let index = drop % graph.nodes.len();
            graph.nodes.remove(index);

            let report = Validator::default().run(&graph);
            prop_assert_eq!(report.is_valid(), report.errors().is_empty());
        }
    }
}
