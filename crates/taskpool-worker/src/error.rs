//! Worker pool, store and service errors.

use thiserror::Error;

use taskpool_core::{CoreError, TaskId};

/// Errors returned synchronously by [`Pool`](crate::Pool).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The queue is at capacity. The task was not accepted.
    #[error("Task pool is full")]
    PoolFull,

    /// `start` was called on a pool that is already running.
    #[error("Worker pool already started")]
    AlreadyStarted,

    /// The pool (or its parent lifetime) has been shut down.
    #[error("Worker pool is shut down")]
    ShutDown,

    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Task already exists: {0}")]
    AlreadyExists(TaskId),

    /// Anything the backing storage reports.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors from the task create flow.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
