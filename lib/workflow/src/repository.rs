//! Persistence boundary for designed workflows.
//!
//! The designer hands owned snapshots to a [`WorkflowRepository`]; how they
//! are stored is up to the implementation. The repository assigns the
//! canonical [`WorkflowId`]; the graph never carries it.

use crate::error::RepositoryError;
use crate::graph::WorkflowGraph;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plantops_core::WorkflowId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Acknowledgement of a stored workflow revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorkflow {
    pub id: WorkflowId,
    /// Starts at 1 and increases with every save of the same workflow.
    pub version: u32,
    pub saved_at: DateTime<Utc>,
}

/// The latest revision of a stored workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWorkflow {
    pub version: u32,
    pub graph: WorkflowGraph,
}

/// Storage for workflow graphs.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Stores a graph as a new workflow (`id` is `None`) or as the next
    /// revision of an existing one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` names an unknown workflow, or
    /// `StorageFailed` if the backend rejects the write.
    async fn save(
        &self,
        id: Option<WorkflowId>,
        graph: WorkflowGraph,
    ) -> Result<SavedWorkflow, RepositoryError>;

    /// Loads the latest revision of a workflow together with its version.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no workflow is stored under `id`.
    async fn load(&self, id: WorkflowId) -> Result<LoadedWorkflow, RepositoryError>;
}

/// Keeps every revision in memory.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    revisions: RwLock<HashMap<WorkflowId, Vec<WorkflowGraph>>>,
}

impl InMemoryWorkflowRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored revisions of a workflow.
    pub async fn revision_count(&self, id: WorkflowId) -> usize {
        self.revisions.read().await.get(&id).map_or(0, Vec::len)
    }

    /// Loads one specific revision, counting from 1.
    pub async fn load_version(&self, id: WorkflowId, version: u32) -> Option<WorkflowGraph> {
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.revisions.read().await.get(&id)?.get(index).cloned()
    }

    /// Returns the ids of all stored workflows.
    pub async fn ids(&self) -> Vec<WorkflowId> {
        let mut ids: Vec<_> = self.revisions.read().await.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    #[instrument(skip(self, graph), fields(workflow = %graph.name))]
    async fn save(
        &self,
        id: Option<WorkflowId>,
        graph: WorkflowGraph,
    ) -> Result<SavedWorkflow, RepositoryError> {
        let mut revisions = self.revisions.write().await;
        let id = match id {
            Some(id) if revisions.contains_key(&id) => id,
            Some(workflow_id) => return Err(RepositoryError::NotFound { workflow_id }),
            None => WorkflowId::new(),
        };

        let history = revisions.entry(id).or_default();
        let version = next_version(history.len()).ok_or_else(|| RepositoryError::StorageFailed {
            reason: format!("revision limit reached for workflow {id}"),
        })?;
        history.push(graph);

        debug!(workflow_id = %id, version, "stored workflow revision");
        Ok(SavedWorkflow {
            id,
            version,
            saved_at: Utc::now(),
        })
    }

    async fn load(&self, id: WorkflowId) -> Result<LoadedWorkflow, RepositoryError> {
        let revisions = self.revisions.read().await;
        let not_found = || RepositoryError::NotFound { workflow_id: id };
        let history = revisions.get(&id).ok_or_else(not_found)?;
        let graph = history.last().cloned().ok_or_else(not_found)?;
        let version = u32::try_from(history.len()).map_err(|_| RepositoryError::StorageFailed {
            reason: format!("revision count of workflow {id} exceeds the version range"),
        })?;
        Ok(LoadedWorkflow { version, graph })
    }
}

/// Version assigned to the revision stored after `stored` earlier ones.
fn next_version(stored: usize) -> Option<u32> {
    stored
        .checked_add(1)
        .and_then(|next| u32::try_from(next).ok())
}
