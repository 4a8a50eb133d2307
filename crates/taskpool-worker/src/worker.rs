//! Worker consume loop and per-task processing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use taskpool_core::{lifecycle, Task, TaskStatus};

use crate::metrics::PoolMetrics;
use crate::pool::WorkerDeps;

/// Receiving half of the pool queue, shared by all workers.
pub(crate) type SharedQueue = Arc<Mutex<mpsc::Receiver<Task>>>;

/// Worker task. Runs until the shutdown token is cancelled.
///
/// Each iteration waits for either cancellation or the next queued task and
/// processes that task to completion before looking at the queue again, so a
/// worker never holds more than one task.
pub(crate) async fn worker_loop(
    worker_id: usize,
    queue: SharedQueue,
    shutdown: CancellationToken,
    deps: WorkerDeps,
    metrics: Arc<PoolMetrics>,
) {
    debug!(worker_id, "Worker started");

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            task = next_task(&queue) => task,
        };

        // `None` from the queue means every sender is gone.
        let Some(task) = next else {
            break;
        };

        process_task(worker_id, task, &shutdown, &deps, &metrics).await;
    }

    debug!(worker_id, "Worker stopped");
}

/// The lock is released as soon as a task arrives, before processing starts.
async fn next_task(queue: &SharedQueue) -> Option<Task> {
    queue.lock().await.recv().await
}

/// Drive one task from `Pending` to a terminal status.
///
/// Nothing here is reported to the submitter. A task that is not `Pending`
/// is dropped without being persisted, and failed writes are logged and
/// counted but otherwise ignored.
pub(crate) async fn process_task(
    worker_id: usize,
    task: Task,
    shutdown: &CancellationToken,
    deps: &WorkerDeps,
    metrics: &PoolMetrics,
) {
    let running = match lifecycle::start(&task) {
        Ok(running) => running,
        Err(e) => {
            metrics.record_invalid_transition();
            warn!(
                worker_id,
                task_id = %task.id,
                error = %e,
                "Dropping task that cannot be started"
            );
            return;
        }
    };

    metrics.record_started();
    let duration = running.duration;
    info!(
        worker_id,
        task_id = %running.id,
        duration_ms = duration_ms(duration),
        "Task started"
    );
    persist(worker_id, deps, metrics, running.clone()).await;

    // Cancellation wins if both are ready.
    let finished = tokio::select! {
        biased;
        _ = shutdown.cancelled() => lifecycle::fail(running),
        _ = tokio::time::sleep(duration) => lifecycle::complete(running),
    };

    match finished.status {
        TaskStatus::Completed => metrics.record_completed(),
        TaskStatus::Failed => metrics.record_failed(),
        TaskStatus::Pending | TaskStatus::Running => {}
    }
    info!(
        worker_id,
        task_id = %finished.id,
        status = %finished.status,
        "Task finished"
    );

    persist(worker_id, deps, metrics, finished).await;
}

/// Milliseconds for log fields, saturating at `u64::MAX`.
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn persist(worker_id: usize, deps: &WorkerDeps, metrics: &PoolMetrics, task: Task) {
    let task_id = task.id.clone();
    let status = task.status;

    if let Err(e) = deps.store.update(task).await {
        metrics.record_persistence_error();
        warn!(
            worker_id,
            task_id = %task_id,
            status = %status,
            error = %e,
            "Failed to persist task status"
        );
    }
}
