//! Task lifecycle transitions.
//!
//! These are pure functions over [`Task`] values. The worker pool calls them
//! in order: [`start`] when a worker dequeues a task, then exactly one of
//! [`complete`] or [`fail`] depending on whether the work window elapsed or
//! the pool was cancelled first.

use chrono::Utc;

use crate::{CoreError, Task, TaskStatus};

/// Move a pending task to `Running`.
///
/// Returns a copy of `task` with the new status and a fresh `updated_at`.
/// Any status other than `Pending` is rejected and `task` is left as is.
pub fn start(task: &Task) -> Result<Task, CoreError> {
    if !task.status.can_transition_to(TaskStatus::Running) {
        return Err(CoreError::InvalidStateTransition {
            from: task.status,
            to: TaskStatus::Running,
        });
    }

    let mut running = task.clone();
    running.status = TaskStatus::Running;
    running.updated_at = Utc::now();
    Ok(running)
}

/// Mark a task `Completed`. Does not check the current status.
pub fn complete(mut task: Task) -> Task {
    task.status = TaskStatus::Completed;
    task.updated_at = Utc::now();
    task
}

/// Mark a task `Failed`. Does not check the current status.
pub fn fail(mut task: Task) -> Task {
    task.status = TaskStatus::Failed;
    task.updated_at = Utc::now();
    task
}
