//! Pool counters and Prometheus text formatting.
//!
//! Workers never propagate errors to callers, so these counters are the
//! only place invalid transitions and failed writes become visible besides
//! the logs.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::pool::Pool;

/// Monotonic counters updated by the pool and its workers.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    submitted: AtomicU64,
    rejected: AtomicU64,
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    abandoned: AtomicU64,
    invalid_transitions: AtomicU64,
    persistence_errors: AtomicU64,
}

/// Point-in-time copy of [`PoolMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub rejected: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    /// Still queued when the pool shut down.
    pub abandoned: u64,
    pub invalid_transitions: u64,
    pub persistence_errors: u64,
}

fn inc(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl PoolMetrics {
    pub(crate) fn record_submitted(&self) {
        inc(&self.submitted);
    }

    pub(crate) fn record_rejected(&self) {
        inc(&self.rejected);
    }

    pub(crate) fn record_started(&self) {
        inc(&self.started);
    }

    pub(crate) fn record_completed(&self) {
        inc(&self.completed);
    }

    pub(crate) fn record_failed(&self) {
        inc(&self.failed);
    }

    pub(crate) fn record_abandoned(&self, count: u64) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_invalid_transition(&self) {
        inc(&self.invalid_transitions);
    }

    pub(crate) fn record_persistence_error(&self) {
        inc(&self.persistence_errors);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            invalid_transitions: self.invalid_transitions.load(Ordering::Relaxed),
            persistence_errors: self.persistence_errors.load(Ordering::Relaxed),
        }
    }
}

/// Collect pool counters and gauges and format them as Prometheus text.
pub fn collect_metrics(pool: &Pool) -> String {
    let mut output = String::new();

    collect_task_metrics(&pool.metrics().snapshot(), &mut output);
    collect_pool_metrics(pool, &mut output);

    output
}

/// Task counters by outcome.
fn collect_task_metrics(snapshot: &MetricsSnapshot, output: &mut String) {
    let counters = [
        ("submitted", snapshot.submitted),
        ("rejected", snapshot.rejected),
        ("started", snapshot.started),
        ("completed", snapshot.completed),
        ("failed", snapshot.failed),
        ("abandoned", snapshot.abandoned),
    ];

    writeln!(
        output,
        "# HELP taskpool_tasks_total Number of tasks seen by the pool by outcome"
    )
    .ok();
    writeln!(output, "# TYPE taskpool_tasks_total counter").ok();
    for (outcome, value) in counters {
        writeln!(output, "taskpool_tasks_total{{outcome=\"{outcome}\"}} {value}").ok();
    }

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP taskpool_worker_errors_total Errors swallowed inside workers by kind"
    )
    .ok();
    writeln!(output, "# TYPE taskpool_worker_errors_total counter").ok();
    writeln!(
        output,
        "taskpool_worker_errors_total{{kind=\"invalid_transition\"}} {}",
        snapshot.invalid_transitions
    )
    .ok();
    writeln!(
        output,
        "taskpool_worker_errors_total{{kind=\"persistence\"}} {}",
        snapshot.persistence_errors
    )
    .ok();
}

/// Queue depth and live workers.
fn collect_pool_metrics(pool: &Pool, output: &mut String) {
    writeln!(output).ok();
    writeln!(
        output,
        "# HELP taskpool_queue_depth Tasks waiting in the queue"
    )
    .ok();
    writeln!(output, "# TYPE taskpool_queue_depth gauge").ok();
    writeln!(output, "taskpool_queue_depth {}", pool.queued()).ok();
    writeln!(
        output,
        "# HELP taskpool_queue_capacity Maximum number of queued tasks"
    )
    .ok();
    writeln!(output, "# TYPE taskpool_queue_capacity gauge").ok();
    writeln!(output, "taskpool_queue_capacity {}", pool.queue_capacity()).ok();
    writeln!(
        output,
        "# HELP taskpool_workers_active Worker tasks that have not exited"
    )
    .ok();
    writeln!(output, "# TYPE taskpool_workers_active gauge").ok();
    writeln!(output, "taskpool_workers_active {}", pool.active_workers()).ok();
}
