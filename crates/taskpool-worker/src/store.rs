//! Persistence collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use taskpool_core::{Task, TaskId};

use crate::error::StoreError;

/// Durable record of tasks. The pool only ever calls [`TaskStore::update`];
/// the remaining methods serve the create flow and the read path.
///
/// Implementations must be safe to call from several workers at once.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task. Fails if the id is taken.
    async fn create(&self, task: Task) -> Result<Task, StoreError>;

    /// Upsert the task's current field values, keyed by its id.
    async fn update(&self, task: Task) -> Result<Task, StoreError>;

    async fn get(&self, id: &TaskId) -> Result<Task, StoreError>;

    /// Soft delete: the task disappears from `get` and `list` but its record
    /// is kept until purged.
    async fn delete(&self, id: &TaskId) -> Result<(), StoreError>;

    /// Remove the record for good, whether or not it was deleted first.
    async fn purge(&self, id: &TaskId) -> Result<(), StoreError>;

    /// All live tasks, oldest first.
    async fn list(&self) -> Result<Vec<Task>, StoreError>;
}

#[derive(Debug)]
struct Record {
    task: Task,
    deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    fn live(&self) -> Option<&Task> {
        self.deleted_at.is_none().then_some(&self.task)
    }
}

/// Task store backed by a map. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    records: RwLock<HashMap<TaskId, Record>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks visible to `get`, soft-deleted ones excluded.
    pub async fn len(&self) -> usize {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.deleted_at.is_none())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> Result<Task, StoreError> {
        let mut records = self.records.write().await;
        // A soft-deleted record still holds its id.
        if records.contains_key(&task.id) {
            return Err(StoreError::AlreadyExists(task.id));
        }
        records.insert(
            task.id.clone(),
            Record {
                task: task.clone(),
                deleted_at: None,
            },
        );
        Ok(task)
    }

    async fn update(&self, task: Task) -> Result<Task, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&task.id) {
            // Workers keep writing status for a task deleted mid-flight; the
            // record stays deleted.
            Some(record) => record.task = task.clone(),
            None => {
                records.insert(
                    task.id.clone(),
                    Record {
                        task: task.clone(),
                        deleted_at: None,
                    },
                );
            }
        }
        Ok(task)
    }

    async fn get(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.records
            .read()
            .await
            .get(id)
            .and_then(Record::live)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) if record.deleted_at.is_none() => {
                record.deleted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn purge(&self, id: &TaskId) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .records
            .read()
            .await
            .values()
            .filter_map(Record::live)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }
}
