//! Phase 2 of a crawl: fetch and normalize every service on a bounded worker pool.

use super::{Endpoints, EntityId, Progress, RateLimitedFetcher, ServiceRecord, Throughput, WorkerPool, normalizer};
use core::pin::Pin;
use core::task::{Context, Poll, ready};
use futures::Stream;
use std::sync::Arc;
use tokio::task::JoinSet;

const LOG_TARGET: &str = " collector";

/// Number of detail fetches in flight at once.
///
/// Each request is small, so the remote's tolerance for request rate is the
/// bottleneck rather than local resources.
pub const DEFAULT_WORKERS: usize = 5;

/// Fans detail fetches out across a [`WorkerPool`].
#[derive(Clone)]
pub struct ConcurrentCollector {
    fetcher: RateLimitedFetcher,
    endpoints: Endpoints,
    workers: usize,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for ConcurrentCollector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConcurrentCollector")
            .field("fetcher", &self.fetcher)
            .field("endpoints", &self.endpoints)
            .field("workers", &self.workers)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl ConcurrentCollector {
    #[must_use]
    pub fn new(fetcher: RateLimitedFetcher, endpoints: Endpoints, workers: usize, progress: Arc<dyn Progress>) -> Self {
        Self {
            fetcher,
            endpoints,
            workers,
            progress,
        }
    }

    /// Submit one fetch-and-normalize task per id.
    ///
    /// Must be called from within a tokio runtime. The returned [`Collection`]
    /// yields records in completion order; ids whose fetch or normalization fails
    /// produce nothing.
    pub fn collect(&self, ids: impl IntoIterator<Item = EntityId>) -> Collection {
        let ids: Vec<_> = ids.into_iter().collect();
        let pool = WorkerPool::new(self.workers);
        let throughput = Arc::new(Throughput::new(ids.len() as u64));

        self.progress.track_throughput(Arc::clone(&throughput));

        let mut tasks = JoinSet::new();
        for id in ids {
            let fetcher = self.fetcher.clone();
            let endpoints = self.endpoints.clone();
            let pool = Arc::clone(&pool);
            let throughput = Arc::clone(&throughput);

            let _ = tasks.spawn(async move {
                let _permit = pool.acquire().await;
                let record = fetch_record(&fetcher, &endpoints, &id).await;
                let completed = throughput.record_completion(record.is_some());
                log::trace!(
                    target: LOG_TARGET,
                    "{completed}/{} done, {:.1} items/s",
                    throughput.total(),
                    throughput.items_per_second()
                );
                record
            });
        }

        log::debug!(target: LOG_TARGET, "Dispatched {} detail fetch(es) on {} worker(s)", tasks.len(), pool.workers());

        Collection { tasks, throughput }
    }
}

async fn fetch_record(fetcher: &RateLimitedFetcher, endpoints: &Endpoints, id: &EntityId) -> Option<ServiceRecord> {
    let Some(body) = fetcher.fetch(&endpoints.detail_url(id)).await.into_body() else {
        log::debug!(target: LOG_TARGET, "Dropping service {id}: detail fetch exhausted its retries");
        return None;
    };

    normalizer::normalize(&body, id)
}

/// A single run of detail fetches, consumed as a [`Stream`] of records.
///
/// Records arrive in completion order, which bears no relation to submission order.
/// Dropping the collection aborts the tasks still outstanding.
#[derive(Debug)]
pub struct Collection {
    tasks: JoinSet<Option<ServiceRecord>>,
    throughput: Arc<Throughput>,
}

impl Collection {
    /// Live completion counters for this run.
    #[must_use]
    pub const fn throughput(&self) -> &Arc<Throughput> {
        &self.throughput
    }
}

impl Stream for Collection {
    type Item = ServiceRecord;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(this.tasks.poll_join_next(cx)) {
                None => return Poll::Ready(None),
                Some(Ok(Some(record))) => return Poll::Ready(Some(record)),
                Some(Ok(None)) => {}
                Some(Err(e)) => {
                    log::error!(target: LOG_TARGET, "Detail fetch task failed: {e}");
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.tasks.len()))
    }
}
