//! Workflow node types and their per-kind configuration.
//!
//! Each node has:
//! - An id unique within the graph
//! - A free-form canvas position
//! - Common details (label, description)
//! - A configuration variant matching its kind
//!
//! On the wire a node's configuration is one flat object keyed by field
//! name. Keys outside the kind's schema are kept in `extra` so a load/save
//! cycle never drops data.

use crate::error::StoreError;
pub use crate::id::NodeId;
use crate::registry::{FieldInput, NodeKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// How a workflow is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerMode {
    Manual,
    Schedule,
    Event,
}

/// Outcome recorded when the workflow reaches an end node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndOutcome {
    Completed,
    Approved,
    Rejected,
    Cancelled,
}

/// Comparison applied by a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

/// Delivery channel for notification nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationChannel {
    InApp,
    Sms,
    Push,
    Slack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DelayUnit {
    Minutes,
    Hours,
    Days,
}

/// When a parallel block continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinMode {
    /// After every branch finished.
    All,
    /// After the first branch finished.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Human-readable fields shared by every node kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodeDetails {
    /// Returns true if the node has a non-blank description.
    #[must_use]
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|description| !description.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerMode>,
    /// Cron expression, used when `trigger` is `schedule`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<EndOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApprovalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Hours before the approval escalates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalate_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionConfig {
    /// Path of the field being compared, e.g. `order.total`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, JsonValue>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<NotificationChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_in_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<DelayUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParallelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinMode>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
}

/// Configuration for a node, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    Start(StartConfig),
    End(EndConfig),
    Approval(ApprovalConfig),
    Condition(ConditionConfig),
    Action(ActionConfig),
    Email(EmailConfig),
    Notification(NotificationConfig),
    Task(TaskConfig),
    Delay(DelayConfig),
    Parallel(ParallelConfig),
    Webhook(WebhookConfig),
}

impl NodeConfig {
    /// Returns an unset configuration for the given kind.
    #[must_use]
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Start => Self::Start(StartConfig::default()),
            NodeKind::End => Self::End(EndConfig::default()),
            NodeKind::Approval => Self::Approval(ApprovalConfig::default()),
            NodeKind::Condition => Self::Condition(ConditionConfig::default()),
            NodeKind::Action => Self::Action(ActionConfig::default()),
            NodeKind::Email => Self::Email(EmailConfig::default()),
            NodeKind::Notification => Self::Notification(NotificationConfig::default()),
            NodeKind::Task => Self::Task(TaskConfig::default()),
            NodeKind::Delay => Self::Delay(DelayConfig::default()),
            NodeKind::Parallel => Self::Parallel(ParallelConfig::default()),
            NodeKind::Webhook => Self::Webhook(WebhookConfig::default()),
        }
    }

    /// Returns the kind this configuration belongs to.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Start(_) => NodeKind::Start,
            Self::End(_) => NodeKind::End,
            Self::Approval(_) => NodeKind::Approval,
            Self::Condition(_) => NodeKind::Condition,
            Self::Action(_) => NodeKind::Action,
            Self::Email(_) => NodeKind::Email,
            Self::Notification(_) => NodeKind::Notification,
            Self::Task(_) => NodeKind::Task,
            Self::Delay(_) => NodeKind::Delay,
            Self::Parallel(_) => NodeKind::Parallel,
            Self::Webhook(_) => NodeKind::Webhook,
        }
    }

    /// Sets one kind-specific field from a JSON value; `null` unsets it.
    ///
    /// The caller is expected to have checked `field` against the kind's
    /// schema. On error the configuration is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFieldValue` if the value does not fit the field.
    pub fn set_field(&mut self, field: &str, value: JsonValue) -> Result<(), StoreError> {
        match self {
            Self::Start(config) => patch(config, field, value),
            Self::End(config) => patch(config, field, value),
            Self::Approval(config) => patch(config, field, value),
            Self::Condition(config) => patch(config, field, value),
            Self::Action(config) => patch(config, field, value),
            Self::Email(config) => patch(config, field, value),
            Self::Notification(config) => patch(config, field, value),
            Self::Task(config) => patch(config, field, value),
            Self::Delay(config) => patch(config, field, value),
            Self::Parallel(config) => patch(config, field, value),
            Self::Webhook(config) => patch(config, field, value),
        }
    }

    /// Returns the set fields as a flat object keyed by field name.
    #[must_use]
    pub fn to_map(&self) -> Map<String, JsonValue> {
        match self {
            Self::Start(config) => to_object(config),
            Self::End(config) => to_object(config),
            Self::Approval(config) => to_object(config),
            Self::Condition(config) => to_object(config),
            Self::Action(config) => to_object(config),
            Self::Email(config) => to_object(config),
            Self::Notification(config) => to_object(config),
            Self::Task(config) => to_object(config),
            Self::Delay(config) => to_object(config),
            Self::Parallel(config) => to_object(config),
            Self::Webhook(config) => to_object(config),
        }
    }
}

fn to_object<T: Serialize>(config: &T) -> Map<String, JsonValue> {
    // Config structs only hold options of plain data; they always serialize
    // to an object.
    match serde_json::to_value(config) {
        Ok(JsonValue::Object(object)) => object,
        _ => Map::new(),
    }
}

/// Turns a numeric string such as `"48"` into a JSON number. Anything else
/// is returned unchanged.
fn coerce_number(value: JsonValue) -> JsonValue {
    let parsed = match &value {
        JsonValue::String(text) => {
            let text = text.trim();
            text.parse::<i64>().map(JsonValue::from).ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
            })
        }
        _ => None,
    };
    parsed.unwrap_or(value)
}

fn patch<T>(config: &mut T, field: &str, value: JsonValue) -> Result<(), StoreError>
where
    T: Serialize + DeserializeOwned,
{
    let mut object = to_object(config);
    if value.is_null() {
        object.remove(field);
    } else {
        object.insert(field.to_string(), value);
    }

    *config = serde_json::from_value(JsonValue::Object(object)).map_err(|e| {
        StoreError::InvalidFieldValue {
            field: field.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(())
}

/// A node placed on the workflow canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeDocument", into = "NodeDocument")]
pub struct WorkflowNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub details: NodeDetails,
    pub config: NodeConfig,
    /// Config values kept verbatim: keys outside the kind's schema, and
    /// schema fields whose loaded value did not fit the field's type.
    pub extra: Map<String, JsonValue>,
}

impl WorkflowNode {
    /// Creates a node of the given kind with an empty configuration.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            details: NodeDetails::default(),
            config: NodeConfig::empty(kind),
            extra: Map::new(),
        }
    }

    /// Returns the kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    /// Returns the title shown on the canvas: the label if set, else the
    /// kind's display label.
    #[must_use]
    pub fn title(&self) -> &str {
        self.details
            .label
            .as_deref()
            .unwrap_or(self.kind().descriptor().label)
    }

    /// Sets a common or kind-specific config field; `null` unsets it.
    ///
    /// A string holding a number is accepted for a numeric field, since
    /// text inputs hand back strings.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` if the kind has no such field and
    /// `InvalidFieldValue` if the value does not fit. The node is unchanged
    /// on error.
    pub fn set_field(&mut self, field: &str, value: JsonValue) -> Result<(), StoreError> {
        let value = match self.kind().descriptor().field(field) {
            Some(spec) if spec.input == FieldInput::Number => coerce_number(value),
            _ => value,
        };
        self.apply_field(field, value)
    }

    fn apply_field(&mut self, field: &str, value: JsonValue) -> Result<(), StoreError> {
        let descriptor = self.kind().descriptor();
        if descriptor.field(field).is_some() {
            self.config.set_field(field, value)?;
        } else if descriptor.has_field(field) {
            patch(&mut self.details, field, value)?;
        } else {
            return Err(StoreError::UnknownField {
                kind: self.kind().to_string(),
                field: field.to_string(),
            });
        }
        // A stale ill-typed value must not shadow the new one on save.
        self.extra.remove(field);
        Ok(())
    }

    /// Returns the schema fields whose stored value does not fit their type.
    pub fn unfit_fields(&self) -> impl Iterator<Item = &str> {
        let descriptor = self.kind().descriptor();
        self.extra
            .keys()
            .map(String::as_str)
            .filter(move |key| descriptor.has_field(key))
    }

    /// Returns the current value of a config field, if set.
    #[must_use]
    pub fn field_value(&self, field: &str) -> Option<JsonValue> {
        self.config_map().remove(field)
    }

    /// Returns the whole configuration as the flat wire object.
    #[must_use]
    pub fn config_map(&self) -> Map<String, JsonValue> {
        let mut object = self.extra.clone();
        object.extend(to_object(&self.details));
        object.extend(self.config.to_map());
        object
    }
}

/// Wire form of a node: `{id, kind, x, y, config}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: NodeId,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub config: Map<String, JsonValue>,
}

impl TryFrom<NodeDocument> for WorkflowNode {
    type Error = StoreError;

    fn try_from(document: NodeDocument) -> Result<Self, Self::Error> {
        let kind: NodeKind =
            document
                .kind
                .parse()
                .map_err(|_| StoreError::UnrecognizedKind {
                    node_id: Some(document.id.clone()),
                    kind: document.kind.clone(),
                })?;

        let mut node = WorkflowNode::new(document.id, kind, document.x, document.y);
        for (field, value) in document.config {
            if !kind.descriptor().has_field(&field) {
                node.extra.insert(field, value);
                continue;
            }
            // Values that do not fit are kept as written and reported by the
            // validator; a single bad field never blocks opening a workflow.
            match node.apply_field(&field, value.clone()) {
                Ok(()) => {}
                Err(StoreError::InvalidFieldValue { .. }) => {
                    node.extra.insert(field, value);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(node)
    }
}

impl From<WorkflowNode> for NodeDocument {
    fn from(node: WorkflowNode) -> Self {
        Self {
            kind: node.kind().to_string(),
            config: node.config_map(),
            id: node.id,
            x: node.x,
            y: node.y,
        }
    }
}
