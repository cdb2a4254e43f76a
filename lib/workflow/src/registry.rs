//! Node registry: the fixed catalog of node kinds a workflow can contain.
//!
//! The catalog is a static table. Each entry carries what the palette and
//! the properties panel need to render a kind: label, icon reference,
//! category and the configuration field schema.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed type tag of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    End,
    Approval,
    Condition,
    Action,
    Email,
    Notification,
    Task,
    Delay,
    Parallel,
    Webhook,
}

impl NodeKind {
    /// Every kind, in catalog order.
    pub const ALL: [NodeKind; 11] = [
        NodeKind::Start,
        NodeKind::End,
        NodeKind::Approval,
        NodeKind::Condition,
        NodeKind::Action,
        NodeKind::Email,
        NodeKind::Notification,
        NodeKind::Task,
        NodeKind::Delay,
        NodeKind::Parallel,
        NodeKind::Webhook,
    ];

    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Approval => "approval",
            Self::Condition => "condition",
            Self::Action => "action",
            Self::Email => "email",
            Self::Notification => "notification",
            Self::Task => "task",
            Self::Delay => "delay",
            Self::Parallel => "parallel",
            Self::Webhook => "webhook",
        }
    }

    /// Returns the catalog entry for this kind.
    #[must_use]
    pub fn descriptor(self) -> &'static NodeKindDescriptor {
        // CATALOG is laid out in `NodeKind::ALL` order.
        &CATALOG[self as usize]
    }

    /// Returns the category this kind is grouped under in the palette.
    #[must_use]
    pub fn category(self) -> NodeCategory {
        self.descriptor().category
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StoreError::UnrecognizedKind {
                node_id: None,
                kind: s.to_string(),
            })
    }
}

/// Palette grouping of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Structural markers (start, end).
    Flow,
    /// Steps that do work or wait on a person.
    Action,
    /// Branching, parallelism and timing.
    Logic,
    /// Calls out to external systems.
    Integration,
}

impl NodeCategory {
    /// Categories in palette order.
    pub const ALL: [NodeCategory; 4] = [
        NodeCategory::Flow,
        NodeCategory::Action,
        NodeCategory::Logic,
        NodeCategory::Integration,
    ];

    /// Returns the wire name of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Action => "action",
            Self::Logic => "logic",
            Self::Integration => "integration",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown node category '{s}'"))
    }
}

/// The kind of input widget a configuration field is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum FieldInput {
    Text,
    TextArea,
    Number,
    Email,
    Url,
    Json,
    /// One of a fixed set of wire values.
    Select(&'static [&'static str]),
}

/// One configuration field the properties panel renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Key of the field in the node's config.
    pub name: &'static str,
    /// Label shown next to the input.
    pub label: &'static str,
    pub input: FieldInput,
    /// Shown while the field is unset. Never written back to the config.
    pub placeholder: &'static str,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        label: &'static str,
        input: FieldInput,
        placeholder: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            input,
            placeholder,
        }
    }
}

/// Fields every node kind carries in addition to its own schema.
pub const COMMON_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("label", "Label", FieldInput::Text, "Step name"),
    FieldSpec::new(
        "description",
        "Description",
        FieldInput::TextArea,
        "What happens at this step",
    ),
];

/// Catalog entry for one node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeKindDescriptor {
    pub kind: NodeKind,
    /// Display label used in the palette and as the default node title.
    pub label: &'static str,
    /// Opaque icon reference for the rendering layer.
    pub icon: &'static str,
    pub category: NodeCategory,
    /// One-line palette hint.
    pub summary: &'static str,
    /// Kind-specific configuration fields, in render order.
    pub fields: &'static [FieldSpec],
}

impl NodeKindDescriptor {
    /// Returns the kind-specific field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns every field the properties panel renders for this kind,
    /// common fields first.
    pub fn all_fields(&self) -> impl Iterator<Item = &'static FieldSpec> + use<> {
        COMMON_FIELDS.iter().chain(self.fields.iter())
    }

    /// Returns true if `name` is a common or kind-specific field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        COMMON_FIELDS.iter().any(|field| field.name == name) || self.field(name).is_some()
    }
}

const TRIGGER_MODES: &[&str] = &["manual", "schedule", "event"];
const END_OUTCOMES: &[&str] = &["completed", "approved", "rejected", "cancelled"];
const CONDITION_OPERATORS: &[&str] = &[
    "equals",
    "notEquals",
    "greaterThan",
    "lessThan",
    "contains",
];
const NOTIFICATION_CHANNELS: &[&str] = &["inApp", "sms", "push", "slack"];
const TASK_PRIORITIES: &[&str] = &["low", "medium", "high"];
const DELAY_UNITS: &[&str] = &["minutes", "hours", "days"];
const JOIN_MODES: &[&str] = &["all", "any"];
const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

static CATALOG: [NodeKindDescriptor; 11] = [
    NodeKindDescriptor {
        kind: NodeKind::Start,
        label: "Start",
        icon: "play-circle",
        category: NodeCategory::Flow,
        summary: "Entry point of the workflow",
        fields: &[
            FieldSpec::new(
                "trigger",
                "Trigger",
                FieldInput::Select(TRIGGER_MODES),
                "manual",
            ),
            FieldSpec::new("schedule", "Schedule", FieldInput::Text, "0 6 * * 1-5"),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::End,
        label: "End",
        icon: "stop-circle",
        category: NodeCategory::Flow,
        summary: "Terminates the workflow",
        fields: &[FieldSpec::new(
            "outcome",
            "Outcome",
            FieldInput::Select(END_OUTCOMES),
            "completed",
        )],
    },
    NodeKindDescriptor {
        kind: NodeKind::Approval,
        label: "Approval",
        icon: "user-check",
        category: NodeCategory::Action,
        summary: "Waits for a person to approve or reject",
        fields: &[
            FieldSpec::new("assignee", "Assignee", FieldInput::Text, "Quality manager"),
            FieldSpec::new("timeout", "Timeout (hours)", FieldInput::Number, "48"),
            FieldSpec::new("escalateTo", "Escalate to", FieldInput::Text, "Plant director"),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::Condition,
        label: "Condition",
        icon: "git-branch",
        category: NodeCategory::Logic,
        summary: "Branches on a field comparison",
        fields: &[
            FieldSpec::new("field", "Field", FieldInput::Text, "order.total"),
            FieldSpec::new(
                "operator",
                "Operator",
                FieldInput::Select(CONDITION_OPERATORS),
                "greaterThan",
            ),
            FieldSpec::new("value", "Value", FieldInput::Json, "1000"),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::Action,
        label: "Action",
        icon: "zap",
        category: NodeCategory::Action,
        summary: "Runs a system action",
        fields: &[
            FieldSpec::new("action", "Action", FieldInput::Text, "inventory.reserve"),
            FieldSpec::new("target", "Target", FieldInput::Text, "warehouse-01"),
            FieldSpec::new("parameters", "Parameters", FieldInput::Json, "{}"),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::Email,
        label: "Send Email",
        icon: "mail",
        category: NodeCategory::Action,
        summary: "Sends an email",
        fields: &[
            FieldSpec::new("to", "To", FieldInput::Email, "buyer@example.com"),
            FieldSpec::new("subject", "Subject", FieldInput::Text, "Purchase order approved"),
            FieldSpec::new("body", "Body", FieldInput::TextArea, "Hello,"),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::Notification,
        label: "Notification",
        icon: "bell",
        category: NodeCategory::Action,
        summary: "Notifies a user or channel",
        fields: &[
            FieldSpec::new(
                "channel",
                "Channel",
                FieldInput::Select(NOTIFICATION_CHANNELS),
                "inApp",
            ),
            FieldSpec::new("recipient", "Recipient", FieldInput::Text, "Shift supervisor"),
            FieldSpec::new("message", "Message", FieldInput::TextArea, "Batch ready for QC"),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::Task,
        label: "Task",
        icon: "check-square",
        category: NodeCategory::Action,
        summary: "Creates a task for a person",
        fields: &[
            FieldSpec::new("title", "Title", FieldInput::Text, "Inspect incoming goods"),
            FieldSpec::new("assignee", "Assignee", FieldInput::Text, "Warehouse clerk"),
            FieldSpec::new("dueInDays", "Due in (days)", FieldInput::Number, "3"),
            FieldSpec::new(
                "priority",
                "Priority",
                FieldInput::Select(TASK_PRIORITIES),
                "medium",
            ),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::Delay,
        label: "Delay",
        icon: "clock",
        category: NodeCategory::Logic,
        summary: "Waits before continuing",
        fields: &[
            FieldSpec::new("duration", "Duration", FieldInput::Number, "1"),
            FieldSpec::new("unit", "Unit", FieldInput::Select(DELAY_UNITS), "hours"),
        ],
    },
    NodeKindDescriptor {
        kind: NodeKind::Parallel,
        label: "Parallel",
        icon: "columns",
        category: NodeCategory::Logic,
        summary: "Runs branches at the same time",
        fields: &[FieldSpec::new(
            "join",
            "Join when",
            FieldInput::Select(JOIN_MODES),
            "all",
        )],
    },
    NodeKindDescriptor {
        kind: NodeKind::Webhook,
        label: "Webhook",
        icon: "globe",
        category: NodeCategory::Integration,
        summary: "Calls an external HTTP endpoint",
        fields: &[
            FieldSpec::new("url", "URL", FieldInput::Url, "https://erp.example.com/hooks"),
            FieldSpec::new("method", "Method", FieldInput::Select(HTTP_METHODS), "POST"),
            FieldSpec::new("headers", "Headers", FieldInput::Json, "{}"),
            FieldSpec::new("payload", "Payload", FieldInput::Json, "{}"),
        ],
    },
];

/// Looks up a kind by its wire name.
///
/// Returns `None` for names outside the catalog; callers render nothing for
/// those rather than failing.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static NodeKindDescriptor> {
    CATALOG.iter().find(|descriptor| descriptor.kind.as_str() == name)
}

/// Returns the palette entries for one category, in catalog order.
pub fn list_by_category(
    category: NodeCategory,
) -> impl Iterator<Item = &'static NodeKindDescriptor> {
    CATALOG
        .iter()
        .filter(move |descriptor| descriptor.category == category)
}

/// Returns the whole catalog.
#[must_use]
pub fn catalog() -> &'static [NodeKindDescriptor] {
    &CATALOG
}

/// Returns the categories in palette order.
#[must_use]
pub fn categories() -> &'static [NodeCategory] {
    &NodeCategory::ALL
}
