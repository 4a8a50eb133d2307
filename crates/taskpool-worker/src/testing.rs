//! Test doubles shared by the unit tests.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use taskpool_core::{Task, TaskId, TaskStatus};

use crate::error::StoreError;
use crate::store::{InMemoryTaskStore, TaskStore};

/// In-memory store that also keeps every `update` call in order.
#[derive(Default)]
pub(crate) struct RecordingStore {
    inner: InMemoryTaskStore,
    updates: Mutex<Vec<(TaskId, TaskStatus)>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inner(&self) -> &InMemoryTaskStore {
        &self.inner
    }

    pub(crate) fn updates(&self) -> Vec<(TaskId, TaskStatus)> {
        self.updates.lock().unwrap().clone()
    }

    /// Statuses written for `id`, in call order.
    pub(crate) fn statuses_for(&self, id: &TaskId) -> Vec<TaskStatus> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(task_id, _)| task_id == id)
            .map(|(_, status)| *status)
            .collect()
    }

    pub(crate) fn last_status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.statuses_for(id).last().copied()
    }
}

#[async_trait]
impl TaskStore for RecordingStore {
    async fn create(&self, task: Task) -> Result<Task, StoreError> {
        self.inner.create(task).await
    }

    async fn update(&self, task: Task) -> Result<Task, StoreError> {
        self.updates
            .lock()
            .unwrap()
            .push((task.id.clone(), task.status));
        self.inner.update(task).await
    }

    async fn get(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.inner.get(id).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    async fn purge(&self, id: &TaskId) -> Result<(), StoreError> {
        self.inner.purge(id).await
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.inner.list().await
    }
}

/// Store whose every call fails.
pub(crate) struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Backend("database unavailable".to_string())
}

#[async_trait]
impl TaskStore for FailingStore {
    async fn create(&self, _task: Task) -> Result<Task, StoreError> {
        Err(unavailable())
    }

    async fn update(&self, _task: Task) -> Result<Task, StoreError> {
        Err(unavailable())
    }

    async fn get(&self, _id: &TaskId) -> Result<Task, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: &TaskId) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn purge(&self, _id: &TaskId) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Err(unavailable())
    }
}

/// Poll `check` every few milliseconds until it holds or `timeout` passes.
pub(crate) async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    check()
}

/// Async flavour of [`wait_until`] for checks that hit a store.
pub(crate) async fn wait_until_async<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    check().await
}
