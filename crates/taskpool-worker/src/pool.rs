//! Bounded worker pool.
//!
//! [`Pool`] owns one bounded queue, a fixed set of workers and a shutdown
//! token derived from the caller's lifetime. Workers are spawned once by
//! [`Pool::start`] and run until [`Pool::shutdown`] (or the parent token)
//! cancels them.
//!
//! Tasks still waiting in the queue at shutdown are discarded without being
//! run or persisted; only the `abandoned` counter records them. Delivery is
//! at-most-once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use taskpool_core::Task;

use crate::config::Config;
use crate::error::PoolError;
use crate::metrics::PoolMetrics;
use crate::store::TaskStore;
use crate::worker::{worker_loop, SharedQueue};

/// Collaborators handed to every worker.
#[derive(Clone)]
pub struct WorkerDeps {
    /// Receives every status transition.
    pub store: Arc<dyn TaskStore>,
}

impl WorkerDeps {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

/// Fixed-size pool of workers sharing one bounded queue.
pub struct Pool {
    shutdown_token: CancellationToken,
    sender: mpsc::Sender<Task>,
    queue: SharedQueue,
    worker_count: usize,
    started: AtomicBool,
    /// Held while workers are spawned and while the pool is cancelled, so
    /// `shutdown` never closes the tracker halfway through `start`.
    lifecycle: std::sync::Mutex<()>,
    tracker: TaskTracker,
    metrics: Arc<PoolMetrics>,
}

impl Pool {
    /// Create a pool. No worker runs until [`Pool::start`].
    ///
    /// Cancelling `parent` has the same effect on the workers as
    /// [`Pool::shutdown`], without waiting for them.
    pub fn new(
        parent: &CancellationToken,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Result<Self, PoolError> {
        if worker_count == 0 {
            return Err(PoolError::InvalidConfig("worker_count must be at least 1"));
        }
        if queue_capacity == 0 {
            return Err(PoolError::InvalidConfig("queue_capacity must be at least 1"));
        }

        let (sender, receiver) = mpsc::channel(queue_capacity);

        Ok(Self {
            shutdown_token: parent.child_token(),
            sender,
            queue: Arc::new(Mutex::new(receiver)),
            worker_count,
            started: AtomicBool::new(false),
            lifecycle: std::sync::Mutex::new(()),
            tracker: TaskTracker::new(),
            metrics: Arc::new(PoolMetrics::default()),
        })
    }

    /// Create a pool sized by `config`.
    pub fn from_config(parent: &CancellationToken, config: &Config) -> Result<Self, PoolError> {
        Self::new(parent, config.worker_count, config.queue_capacity)
    }

    /// Spawn the workers. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AlreadyStarted`] on every call after the first; no
    ///   additional workers are spawned.
    /// - [`PoolError::ShutDown`] if the pool was shut down before starting.
    pub fn start(&self, deps: WorkerDeps) -> Result<(), PoolError> {
        let _lifecycle = self
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.shutdown_token.is_cancelled() {
            return Err(PoolError::ShutDown);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(PoolError::AlreadyStarted);
        }

        info!(
            workers = self.worker_count,
            queue_capacity = self.queue_capacity(),
            "Starting worker pool"
        );

        for worker_id in 1..=self.worker_count {
            self.tracker.spawn(worker_loop(
                worker_id,
                self.queue.clone(),
                self.shutdown_token.clone(),
                deps.clone(),
                self.metrics.clone(),
            ));
        }

        Ok(())
    }

    /// Enqueue a task without waiting.
    ///
    /// Tasks from a single caller are dequeued in submission order. The
    /// task must be `Pending`; anything else is dropped by the worker that
    /// dequeues it.
    ///
    /// # Errors
    ///
    /// - [`PoolError::PoolFull`] if the queue is at capacity. The queue is
    ///   left untouched.
    /// - [`PoolError::ShutDown`] once the pool has been shut down.
    pub fn submit(&self, task: Task) -> Result<(), PoolError> {
        if self.shutdown_token.is_cancelled() {
            return Err(PoolError::ShutDown);
        }

        let task_id = task.id.clone();
        match self.sender.try_send(task) {
            Ok(()) => {
                self.metrics.record_submitted();
                debug!(task_id = %task_id, "Task submitted");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_rejected();
                warn!(
                    task_id = %task_id,
                    queue_capacity = self.queue_capacity(),
                    "Task pool is full, rejecting task"
                );
                Err(PoolError::PoolFull)
            }
            Err(TrySendError::Closed(_)) => Err(PoolError::ShutDown),
        }
    }

    /// Cancel all workers and wait until every one of them has exited.
    ///
    /// Running tasks end as `Failed`; queued tasks are discarded and counted
    /// as abandoned. Calling this again, or before [`Pool::start`], returns as
    /// soon as no worker is left.
    pub async fn shutdown(&self) {
        let first = !self.shutdown_token.is_cancelled();
        if first {
            info!(queued = self.queued(), "Worker pool shutdown initiated");
        }

        {
            let _lifecycle = self
                .lifecycle
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.shutdown_token.cancel();
            self.tracker.close();
        }
        self.tracker.wait().await;

        let abandoned = self.discard_queued().await;
        if abandoned > 0 {
            self.metrics.record_abandoned(abandoned);
            warn!(abandoned, "Queued tasks abandoned at shutdown");
        }

        if first {
            info!("Worker pool shutdown complete");
        }
    }

    /// Close the queue and drop whatever is left in it. Only called once no
    /// worker holds the receiver.
    async fn discard_queued(&self) -> u64 {
        let mut queue = self.queue.lock().await;
        queue.close();

        let mut abandoned: u64 = 0;
        while let Ok(task) = queue.try_recv() {
            debug!(task_id = %task.id, "Discarding queued task");
            abandoned += 1;
        }
        abandoned
    }

    /// Number of workers spawned by [`Pool::start`].
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn queue_capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Tasks accepted by [`Pool::submit`] that no worker has taken yet.
    /// Zero once the pool is shut down, since nothing will take them.
    pub fn queued(&self) -> usize {
        if self.is_shut_down() {
            return 0;
        }
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Workers that have been spawned and not yet exited.
    pub fn active_workers(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// True once [`Pool::shutdown`] ran or the parent token was cancelled.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        // Workers own clones of the queue; stop them instead of leaking.
        self.shutdown_token.cancel();
    }
}
