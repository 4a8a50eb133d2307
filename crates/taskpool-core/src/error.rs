//! Core domain errors.

use thiserror::Error;

use crate::TaskStatus;

/// Core domain errors for taskpool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The task's current status does not allow the requested transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: TaskStatus, to: TaskStatus },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
