//! Identifiers assigned by the persistence layer.
//!
//! Ids of nodes and edges inside a graph are plain strings and live in the
//! workflow crate, since loaded graphs may carry ids minted elsewhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

const WORKFLOW_PREFIX: &str = "wf_";

/// A string that is not a valid [`WorkflowId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    pub input: String,
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid workflow id '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Canonical identifier of a saved workflow.
///
/// Displayed as `wf_<ULID>`; serialized as the bare ULID. Ids sort by
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(Ulid);

impl WorkflowId {
    /// Mints a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Ulid> for WorkflowId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{WORKFLOW_PREFIX}{}", self.0)
    }
}

/// Accepts both `wf_<ULID>` and a bare ULID.
impl FromStr for WorkflowId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(WORKFLOW_PREFIX).unwrap_or(s);
        raw.parse::<Ulid>().map(Self).map_err(|e| ParseIdError {
            input: s.to_string(),
            reason: e.to_string(),
        })
    }
}
