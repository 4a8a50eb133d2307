//! taskpool Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - Storage
//! - Logging
//!
//! The worker pool in `taskpool-worker` drives tasks through the
//! transitions defined in [`lifecycle`].

pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::TaskId;
pub use status::TaskStatus;
pub use task::Task;
