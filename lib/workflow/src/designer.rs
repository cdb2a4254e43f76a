//! The designer session: one open workflow being edited.
//!
//! [`Designer`] is the entry point the UI calls. It owns the graph store,
//! the selection and the validator, and keeps them consistent: deleting
//! the selected node also clears the selection.
//!
//! Saving never lends the live store to an async task. `begin_save` copies
//! a validated snapshot into a [`PendingSave`], which is submitted on its
//! own while the user keeps editing.

use crate::edge::EdgeId;
use crate::error::{DesignerError, StoreError};
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use crate::registry::NodeKind;
use crate::repository::{SavedWorkflow, WorkflowRepository};
use crate::selection::{PropertyPanel, Selection, properties};
use crate::store::{GraphStore, RemovedNode};
use crate::validator::{ValidationReport, Validator, ValidatorConfig};
use plantops_core::WorkflowId;
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument};

/// An editing session over one workflow.
#[derive(Debug, Clone)]
pub struct Designer {
    workflow_id: Option<WorkflowId>,
    version: Option<u32>,
    store: GraphStore,
    selection: Selection,
    validator: Validator,
}

impl Designer {
    /// Starts a session on a new, unsaved workflow.
    #[must_use]
    pub fn new(name: impl Into<String>, config: ValidatorConfig) -> Self {
        Self {
            workflow_id: None,
            version: None,
            store: GraphStore::new(name),
            selection: Selection::new(),
            validator: Validator::new(config),
        }
    }

    /// Loads a stored workflow and opens a session on it.
    ///
    /// # Errors
    ///
    /// Returns `Load` if the repository cannot produce the workflow, or
    /// `Store` if the stored graph is inconsistent (duplicate ids, edges to
    /// missing nodes).
    #[instrument(skip(repository, config))]
    pub async fn open(
        repository: &dyn WorkflowRepository,
        id: WorkflowId,
        config: ValidatorConfig,
    ) -> plantops_core::Result<Self, DesignerError> {
        let loaded = repository
            .load(id)
            .await
            .map_err(|e| DesignerError::Load {
                reason: e.to_string(),
            })?;
        let store =
            GraphStore::hydrate(loaded.graph).map_err(|source| DesignerError::Store { source })?;

        info!(
            version = loaded.version,
            nodes = store.node_count(),
            edges = store.edge_count(),
            "opened workflow"
        );
        Ok(Self {
            workflow_id: Some(id),
            version: Some(loaded.version),
            store,
            selection: Selection::new(),
            validator: Validator::new(config),
        })
    }

    /// The repository id, once the workflow has been saved or opened.
    #[must_use]
    pub fn workflow_id(&self) -> Option<WorkflowId> {
        self.workflow_id
    }

    /// The stored version the session is based on: the one opened, or the
    /// one acknowledged by the latest save. `None` until either happens.
    #[must_use]
    pub fn saved_version(&self) -> Option<u32> {
        self.version
    }

    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.store.rename(name);
    }

    /// Places a new node and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPosition` for a NaN or infinite coordinate.
    pub fn add_node(&mut self, kind: NodeKind, x: f64, y: f64) -> Result<NodeId, StoreError> {
        Ok(self.store.add_node(kind, x, y)?.id.clone())
    }

    /// Places a new node of the kind named `kind`, as dropped from the
    /// palette.
    ///
    /// # Errors
    ///
    /// Returns `UnrecognizedKind` or `InvalidPosition`.
    pub fn add_node_named(&mut self, kind: &str, x: f64, y: f64) -> Result<NodeId, StoreError> {
        Ok(self.store.add_node_named(kind, x, y)?.id.clone())
    }

    /// Sets one config field of a node; `null` unsets it.
    ///
    /// # Errors
    ///
    /// See [`GraphStore::update_node_config`].
    pub fn update_node_config(
        &mut self,
        node_id: &NodeId,
        field: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        self.store.update_node_config(node_id, field, value)
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// See [`GraphStore::move_node`].
    pub fn move_node(&mut self, node_id: &NodeId, x: f64, y: f64) -> Result<(), StoreError> {
        self.store.move_node(node_id, x, y)
    }

    /// Deletes a node with its edges, dropping it from the selection.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent; nothing changes.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<RemovedNode, StoreError> {
        let removed = self.store.delete_node(node_id)?;
        if self.selection.is_selected(node_id) {
            self.selection.clear();
        }
        Ok(removed)
    }

    /// Connects two nodes and returns the new edge's id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if either endpoint is absent.
    pub fn add_edge(
        &mut self,
        source_node_id: &NodeId,
        target_node_id: &NodeId,
        label: Option<String>,
    ) -> Result<EdgeId, StoreError> {
        Ok(self
            .store
            .add_edge(source_node_id, target_node_id, label)?
            .id
            .clone())
    }

    /// # Errors
    ///
    /// Returns `EdgeNotFound` if the edge is absent.
    pub fn delete_edge(&mut self, edge_id: &EdgeId) -> Result<(), StoreError> {
        self.store.delete_edge(edge_id).map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent.
    pub fn select(&mut self, node_id: &NodeId) -> Result<(), StoreError> {
        self.selection.select(&self.store, node_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The properties panel for the selected node, if any.
    #[must_use]
    pub fn properties(&self) -> Option<PropertyPanel> {
        properties(&self.store, &self.selection)
    }

    /// Validates the current graph.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        self.validator.run(&self.store.snapshot())
    }

    #[must_use]
    pub fn snapshot(&self) -> WorkflowGraph {
        self.store.snapshot()
    }

    /// Validates a snapshot and prepares it for submission.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if the snapshot has validation errors.
    /// Warnings do not block.
    pub fn begin_save(&self) -> Result<PendingSave, DesignerError> {
        let graph = self.store.snapshot();
        let report = self.validator.run(&graph);
        if !report.is_valid() {
            debug!(errors = report.errors().len(), "save blocked by validation");
            return Err(DesignerError::ValidationFailed {
                error_count: report.errors().len(),
            });
        }
        Ok(PendingSave {
            workflow_id: self.workflow_id,
            graph,
            report,
        })
    }

    /// Records the repository's acknowledgement of a submitted save.
    pub fn finish_save(&mut self, saved: &SavedWorkflow) {
        debug!(workflow_id = %saved.id, version = saved.version, "save acknowledged");
        self.workflow_id = Some(saved.id);
        self.version = Some(saved.version);
    }

    /// Validates, submits and records a save in one go.
    ///
    /// The session stays borrowed while the repository works; use
    /// [`begin_save`](Self::begin_save) to keep editing meanwhile.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` or `Save`.
    pub async fn save(
        &mut self,
        repository: &dyn WorkflowRepository,
    ) -> plantops_core::Result<SavedWorkflow, DesignerError> {
        let saved = self.begin_save()?.submit(repository).await?;
        self.finish_save(&saved);
        Ok(saved)
    }
}

/// A validated snapshot on its way to the repository.
#[derive(Debug, Clone)]
pub struct PendingSave {
    workflow_id: Option<WorkflowId>,
    graph: WorkflowGraph,
    report: ValidationReport,
}

impl PendingSave {
    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// The validation report the snapshot passed, warnings included.
    #[must_use]
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Hands the snapshot to the repository.
    ///
    /// # Errors
    ///
    /// Returns `Save` if the repository rejects the write.
    #[instrument(skip_all, fields(workflow = %self.graph.name, workflow_id = ?self.workflow_id))]
    pub async fn submit(
        self,
        repository: &dyn WorkflowRepository,
    ) -> plantops_core::Result<SavedWorkflow, DesignerError> {
        let saved = repository
            .save(self.workflow_id, self.graph)
            .await
            .map_err(|e| DesignerError::Save {
                reason: e.to_string(),
            })?;
        info!(workflow_id = %saved.id, version = saved.version, "saved workflow");
        Ok(saved)
    }
}
