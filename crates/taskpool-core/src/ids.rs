//! Task identity.
//!
//! A [`TaskId`] is minted once, when the create flow builds a task, and then
//! follows the task everywhere: it keys the store's map, rides along in the
//! queue, and shows up as the `task_id` field of every log line a worker
//! emits. The pool never inspects it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Store key and log correlation id for one task. Serialized as a bare
/// string so the JSON report stays flat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap an id as given. No format check; see [`TaskId::parse`] for input
    /// coming from outside the process.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id (UUID v4, hyphenated lowercase).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied id only if it is a UUID, normalized to the
    /// form [`TaskId::generate`] produces so lookups hit the same map key.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(raw.trim())
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|e| CoreError::InvalidInput(format!("invalid task id {raw:?}: {e}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
