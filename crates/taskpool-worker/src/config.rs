//! Worker pool configuration.

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of workers processing tasks concurrently.
    pub worker_count: usize,

    /// Maximum number of tasks waiting in the queue. Submissions beyond
    /// this are rejected.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: 10,
            queue_capacity: 10,
        }
    }
}
