use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed number of worker slots shared by detail-fetch tasks.
///
/// Create via [`WorkerPool::new`], then call [`WorkerPool::acquire`] before each
/// unit of work. At most `workers` tasks hold a slot at any time.
#[derive(Debug)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    /// Create a pool with `workers` slots (at least one).
    #[must_use]
    pub fn new(workers: usize) -> Arc<Self> {
        let workers = workers.max(1);
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        })
    }

    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Wait for a free slot.
    ///
    /// The returned permit must be held for the duration of the work. When it
    /// is dropped, the slot becomes available for another task.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed")
    }
}
