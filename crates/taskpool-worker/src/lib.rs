//! taskpool Worker Pool
//!
//! A fixed number of tokio workers consume [`Task`]s from one bounded queue,
//! drive each through `Pending -> Running -> Completed | Failed` and report
//! every transition to a [`TaskStore`].
//!
//! Admission is non-blocking: [`Pool::submit`] either enqueues the task or
//! fails with [`PoolError::PoolFull`] right away. Delivery is at-most-once;
//! tasks still queued when the pool shuts down are dropped without being
//! persisted.
//!
//! [`Task`]: taskpool_core::Task

pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod service;
pub mod store;
mod worker;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{PoolError, ServiceError, StoreError};
pub use metrics::{MetricsSnapshot, PoolMetrics};
pub use pool::{Pool, WorkerDeps};
pub use service::TaskService;
pub use store::{InMemoryTaskStore, TaskStore};
