//! Fixed-size worker pool for connection handlers.
//!
//! A task submitted while every permit is taken waits for one to free up;
//! nothing is rejected. `shutdown_now` interrupts everything in flight.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct WorkerPool {
    size: usize,
    permits: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            permits: Arc::new(Semaphore::new(size)),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Workers currently running a task.
    pub fn busy(&self) -> usize {
        self.size - self.permits.available_permits()
    }

    /// Queue `task` for the next free worker. Must be called inside a tokio runtime.
    pub fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);

        // reap finished handlers so the set does not grow with churn
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            // closed semaphore means the pool was shut down while we queued
            let Ok(_permit) = permits.acquire_owned().await else { return; };
            task.await;
        });
    }

    /// Stop admitting work and abort every queued or running task.
    pub fn shutdown_now(&self) {
        self.permits.close();
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.permits.is_closed()
    }
}
