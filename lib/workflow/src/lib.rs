//! Workflow designer model for the plantops platform.
//!
//! This crate holds everything behind the visual workflow editor:
//!
//! - **Registry**: the closed set of node kinds, their palette metadata and
//!   configurable fields
//! - **Graph Store**: the editable nodes and edges of one workflow, with
//!   cascading deletes and referential integrity on every mutation
//! - **Selection**: which node is selected and the properties panel model
//! - **Validator**: structural checks run before save
//! - **Designer**: the session facade the UI calls, including the
//!   snapshot-based save flow against a [`WorkflowRepository`]

pub mod designer;
pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod registry;
pub mod repository;
pub mod selection;
pub mod store;
pub mod validator;

pub use designer::{Designer, PendingSave};
pub use edge::{EdgeId, WorkflowEdge};
pub use error::{DesignerError, DocumentError, RepositoryError, StoreError};
pub use graph::{WorkflowDocument, WorkflowGraph};
pub use node::{NodeConfig, NodeDetails, NodeDocument, NodeId, WorkflowNode};
pub use registry::{FieldInput, FieldSpec, NodeCategory, NodeKind, NodeKindDescriptor};
pub use repository::{
    InMemoryWorkflowRepository, LoadedWorkflow, SavedWorkflow, WorkflowRepository,
};
pub use selection::{PropertyField, PropertyPanel, Selection};
pub use store::{GraphStore, RemovedNode};
pub use validator::{
    ErrorKind, ValidationError, ValidationReport, ValidationWarning, Validator, ValidatorConfig,
    WarningKind,
};
