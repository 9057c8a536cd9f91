//! Two-phase crawl orchestration.

use super::{
    ConcurrentCollector, CrawlReport, CrawlState, DEFAULT_MAX_EMPTY_PAGES, DEFAULT_WORKERS, Endpoints, FetchPolicy, IndexPaginator, Progress,
    RateLimitedFetcher, TOSDR_API_BASE,
};
use crate::Result;
use futures_util::StreamExt;
use ohno::bail;
use std::sync::Arc;
use tick::Clock;

const LOG_TARGET: &str = "   crawler";

/// Everything needed to run a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    pub base_url: String,
    pub fetch: FetchPolicy,
    pub workers: usize,
    pub max_empty_pages: u32,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            base_url: TOSDR_API_BASE.to_string(),
            fetch: FetchPolicy::default(),
            workers: DEFAULT_WORKERS,
            max_empty_pages: DEFAULT_MAX_EMPTY_PAGES,
        }
    }
}

/// Runs index discovery followed by concurrent detail collection.
pub struct Crawler {
    paginator: IndexPaginator,
    collector: ConcurrentCollector,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Crawler")
            .field("paginator", &self.paginator)
            .field("collector", &self.collector)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl Crawler {
    pub fn new(settings: &CrawlSettings, progress: impl Progress + 'static) -> Result<Self> {
        Self::with_clock(settings, progress, Clock::new_tokio())
    }

    /// Build a crawler whose fetch pacing runs on `clock`.
    pub fn with_clock(settings: &CrawlSettings, progress: impl Progress + 'static, clock: Clock) -> Result<Self> {
        let progress: Arc<dyn Progress> = Arc::new(progress);
        let endpoints = Endpoints::new(&settings.base_url)?;
        let fetcher = RateLimitedFetcher::with_clock(settings.fetch.clone(), clock)?;

        Ok(Self {
            paginator: IndexPaginator::new(fetcher.clone(), endpoints.clone(), settings.max_empty_pages, Arc::clone(&progress)),
            collector: ConcurrentCollector::new(fetcher, endpoints, settings.workers, Arc::clone(&progress)),
            progress,
        })
    }

    /// Run the whole crawl.
    ///
    /// # Errors
    ///
    /// Fails only when index discovery produces no ids at all; per-service failures
    /// just shrink the report.
    pub async fn run(&self) -> Result<CrawlReport> {
        let mut state = CrawlState::new();

        self.progress.set_phase("Indexing");
        let outcome = self.paginator.discover_into(state.ids_mut()).await;
        if state.ids().is_empty() {
            self.progress.done();
            bail!(
                "unable to retrieve the service index ({:?} after {} page(s))",
                outcome.stop_reason,
                outcome.pages_fetched
            );
        }

        self.progress
            .println(&format!("Index complete: {} unique services", state.ids().len()));

        self.progress.set_phase("Harvesting");
        let mut collection = self.collector.collect(state.sorted_ids());
        while let Some(record) = collection.next().await {
            state.push_record(record);
        }

        let throughput = collection.throughput();
        log::info!(
            target: LOG_TARGET,
            "Harvested {} of {} service(s) in {:.1}s ({:.1} items/s)",
            throughput.kept(),
            throughput.total(),
            throughput.elapsed().as_secs_f64(),
            throughput.items_per_second()
        );

        self.progress.done();

        let report = state.into_report();
        if report.dropped() > 0 {
            log::info!(target: LOG_TARGET, "{} service(s) yielded no usable data", report.dropped());
        }

        Ok(report)
    }
}
