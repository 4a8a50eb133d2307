//! Task create flow, edits and read path.
//!
//! This is the caller side of the pool: it creates the durable record,
//! hands the task to the pool and purges the record when the pool refuses
//! it, so a rejected submission leaves nothing behind in the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use taskpool_core::{CoreError, Task, TaskId};

use crate::error::ServiceError;
use crate::pool::Pool;
use crate::store::TaskStore;
use crate::worker::duration_ms;

/// Creates tasks and feeds them to a [`Pool`].
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    pool: Arc<Pool>,
}

impl TaskService {
    /// Create a new TaskService.
    pub fn new(store: Arc<dyn TaskStore>, pool: Arc<Pool>) -> Self {
        Self { store, pool }
    }

    /// Persist a new pending task and submit it to the pool.
    ///
    /// Returns the task as created. Its status in the store moves on as
    /// workers process it; poll [`TaskService::get`] to observe that.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        duration: Duration,
    ) -> Result<Task, ServiceError> {
        require("title", title)?;
        require("description", description)?;

        let task = self
            .store
            .create(Task::new(title, description, duration))
            .await?;

        info!(
            task_id = %task.id,
            title = %task.title,
            duration_ms = duration_ms(duration),
            "Creating task"
        );

        if let Err(e) = self.pool.submit(task.clone()) {
            warn!(task_id = %task.id, error = %e, "Submission rejected, removing task");
            if let Err(rollback) = self.store.purge(&task.id).await {
                warn!(task_id = %task.id, error = %rollback, "Failed to remove rejected task");
            }
            return Err(e.into());
        }

        Ok(task)
    }

    pub async fn get(&self, id: &TaskId) -> Result<Task, ServiceError> {
        Ok(self.store.get(id).await?)
    }

    /// Replace title and description of a live task.
    ///
    /// Status and duration are left alone. A worker holding the task writes
    /// its own copy on the next status change, so an edit made while the
    /// task is queued or running is overwritten by that write.
    pub async fn update(
        &self,
        id: &TaskId,
        title: &str,
        description: &str,
    ) -> Result<Task, ServiceError> {
        require("title", title)?;
        require("description", description)?;

        let mut task = self.store.get(id).await?;
        task.title = title.to_string();
        task.description = description.to_string();
        task.updated_at = Utc::now();

        let task = self.store.update(task).await?;
        info!(task_id = %task.id, status = %task.status, "Task updated");
        Ok(task)
    }

    /// Soft delete. The record stays in the store until purged.
    pub async fn delete(&self, id: &TaskId) -> Result<(), ServiceError> {
        self.store.delete(id).await?;
        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Remove the record permanently, deleted or not.
    pub async fn purge(&self, id: &TaskId) -> Result<(), ServiceError> {
        self.store.purge(id).await?;
        info!(task_id = %id, "Task purged");
        Ok(())
    }

    /// All stored tasks, oldest first.
    pub async fn list(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store.list().await?)
    }
}

fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use taskpool_core::TaskStatus;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::{PoolError, StoreError};
    use crate::pool::WorkerDeps;
    use crate::store::InMemoryTaskStore;
    use crate::testing::wait_until_async;

    fn service(workers: usize, capacity: usize, start: bool) -> (TaskService, Arc<Pool>) {
        let store = Arc::new(InMemoryTaskStore::new());
        let pool = Arc::new(Pool::new(&CancellationToken::new(), workers, capacity).unwrap());
        if start {
            pool.start(WorkerDeps::new(store.clone())).unwrap();
        }
        (TaskService::new(store, pool.clone()), pool)
    }

    #[tokio::test]
    async fn test_create_runs_task_to_completion() {
        let (service, pool) = service(1, 1, true);

        let task = service
            .create("report", "build the weekly report", Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        let (svc, id) = (&service, &task.id);
        let completed = wait_until_async(Duration::from_secs(5), || async move {
            svc.get(id).await.unwrap().status == TaskStatus::Completed
        })
        .await;
        assert!(completed);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (service, _pool) = service(1, 1, false);

        let err = service
            .create("  ", "description", Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidInput(_))));

        let err = service.create("title", "", Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidInput(_))));

        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_submission_is_rolled_back() {
        let (service, pool) = service(1, 1, false);

        let kept = service
            .create("first", "fits in the queue", Duration::ZERO)
            .await
            .unwrap();
        let err = service
            .create("second", "does not fit", Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Pool(PoolError::PoolFull)));
        let stored = service.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, kept.id);
        assert_eq!(pool.queued(), 1);
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let (service, _pool) = service(1, 1, false);
        let task = service
            .create("title", "description", Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(service.get(&task.id).await.unwrap(), task);
        service.delete(&task.id).await.unwrap();

        let err = service.get(&task.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_edits_title_and_description() {
        let (service, _pool) = service(1, 1, false);
        let task = service
            .create("draft", "first version", Duration::from_millis(250))
            .await
            .unwrap();

        let updated = service
            .update(&task.id, "final", "second version")
            .await
            .unwrap();

        assert_eq!(updated.title, "final");
        assert_eq!(updated.description, "second version");
        assert_eq!(updated.status, task.status);
        assert_eq!(updated.duration, task.duration);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
        assert_eq!(service.get(&task.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_unknown_task() {
        let (service, _pool) = service(1, 1, false);
        let id = TaskId::generate();

        let err = service.update(&id, "title", "description").await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(ref missing)) if *missing == id));
    }

    #[tokio::test]
    async fn test_update_validates_input() {
        let (service, _pool) = service(1, 1, false);
        let task = service
            .create("title", "description", Duration::ZERO)
            .await
            .unwrap();

        let err = service.update(&task.id, "", "description").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidInput(_))));
        let err = service.update(&task.id, "title", " ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidInput(_))));

        assert_eq!(service.get(&task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_deleted_task_can_still_be_purged() {
        let (service, _pool) = service(1, 1, false);
        let task = service
            .create("title", "description", Duration::ZERO)
            .await
            .unwrap();

        service.delete(&task.id).await.unwrap();
        let err = service.get(&task.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
        let err = service.update(&task.id, "title", "description").await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
        let err = service.delete(&task.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));

        service.purge(&task.id).await.unwrap();
        let err = service.purge(&task.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
    }
}
