//! Selection and the properties panel model.
//!
//! Selection is UI state and lives outside the graph store; the store never
//! knows which node is selected. The panel model is derived on demand from
//! the selected node and its kind's field schema.

use crate::error::StoreError;
use crate::node::NodeId;
use crate::registry::{FieldInput, NodeKind};
use crate::store::GraphStore;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// At most one selected node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected_node_id: Option<NodeId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a node that exists in the store.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent; the selection is
    /// unchanged.
    pub fn select(&mut self, store: &GraphStore, node_id: &NodeId) -> Result<(), StoreError> {
        if !store.contains_node(node_id) {
            return Err(StoreError::NodeNotFound {
                node_id: node_id.clone(),
            });
        }
        self.selected_node_id = Some(node_id.clone());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected_node_id = None;
    }

    #[must_use]
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected_node_id.as_ref()
    }

    #[must_use]
    pub fn is_selected(&self, node_id: &NodeId) -> bool {
        self.selected_node_id.as_ref() == Some(node_id)
    }
}

/// One editable field of the properties panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyField {
    pub name: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
    /// Current value from the node's config; `None` when unset.
    pub value: Option<JsonValue>,
    /// Shown while `value` is `None`.
    pub placeholder: &'static str,
}

/// What the properties panel renders for the selected node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyPanel {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    pub fields: Vec<PropertyField>,
}

impl PropertyPanel {
    /// Returns the field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&PropertyField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Builds the properties panel for the selected node.
///
/// Returns `None` when nothing is selected or the selected node no longer
/// exists. Rendering never writes placeholder values back to the config.
#[must_use]
pub fn properties(store: &GraphStore, selection: &Selection) -> Option<PropertyPanel> {
    let node = store.node(selection.selected()?)?;
    let descriptor = node.kind().descriptor();
    let config = node.config_map();

    let fields = descriptor
        .all_fields()
        .map(|spec| PropertyField {
            name: spec.name,
            label: spec.label,
            input: spec.input,
            value: config.get(spec.name).cloned(),
            // The label placeholder is the kind's own display name.
            placeholder: if spec.name == "label" {
                descriptor.label
            } else {
                spec.placeholder
            },
        })
        .collect();

    Some(PropertyPanel {
        node_id: node.id.clone(),
        kind: node.kind(),
        title: node.title().to_string(),
        fields,
    })
}
