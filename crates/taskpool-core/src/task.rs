//! Task type.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TaskId, TaskStatus};

/// A Task is one unit of simulated work handed to the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,

    /// Short human readable title.
    pub title: String,

    /// Free-form description. Opaque to the pool.
    pub description: String,

    /// Current task status.
    pub status: TaskStatus,

    /// How long the simulated work takes once a worker picks the task up.
    pub duration: Duration,

    /// When the task was created.
    pub created_at: DateTime<Utc>,

    /// When the task last changed status.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending Task with a fresh id.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            duration,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Builder method to force a status (useful for testing).
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
