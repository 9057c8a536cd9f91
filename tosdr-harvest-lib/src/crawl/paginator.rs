//! Phase 1 of a crawl: walk the paginated service listing and collect ids.

use super::index_shape::extract_ids;
use super::{Endpoints, EntityId, Progress, RateLimitedFetcher};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

const LOG_TARGET: &str = " paginator";

/// Number of consecutive empty pages after which the listing is considered done.
pub const DEFAULT_MAX_EMPTY_PAGES: u32 = 3;

/// Why the listing walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page could not be fetched after all retries.
    FetchExhausted,

    /// Too many consecutive pages without usable ids.
    EmptyPages,

    /// A page body was not valid JSON.
    MalformedPage,
}

/// Summary of a listing walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Number of pages successfully retrieved.
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

/// Walks `page=1,2,3,...` of the listing endpoint, strictly sequentially.
#[derive(Clone)]
pub struct IndexPaginator {
    fetcher: RateLimitedFetcher,
    endpoints: Endpoints,
    max_empty_pages: u32,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for IndexPaginator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndexPaginator")
            .field("fetcher", &self.fetcher)
            .field("endpoints", &self.endpoints)
            .field("max_empty_pages", &self.max_empty_pages)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl IndexPaginator {
    #[must_use]
    pub fn new(fetcher: RateLimitedFetcher, endpoints: Endpoints, max_empty_pages: u32, progress: Arc<dyn Progress>) -> Self {
        Self {
            fetcher,
            endpoints,
            max_empty_pages: max_empty_pages.max(1),
            progress,
        }
    }

    /// Discover every service id, deduplicated and sorted.
    ///
    /// An empty result means the listing could not be read at all.
    pub async fn discover_ids(&self) -> Vec<EntityId> {
        let mut ids = BTreeSet::new();
        let _ = self.discover_into(&mut ids).await;
        ids.into_iter().collect()
    }

    /// Walk the listing, adding every usable id to `ids`.
    pub async fn discover_into(&self, ids: &mut BTreeSet<EntityId>) -> DiscoveryOutcome {
        let mut page = 1;
        let mut consecutive_empty = 0;

        let stop_reason = loop {
            let url = self.endpoints.page_url(page);
            let Some(body) = self.fetcher.fetch(&url).await.into_body() else {
                log::debug!(target: LOG_TARGET, "Could not retrieve listing page {page}");
                break StopReason::FetchExhausted;
            };

            let payload: Value = match serde_json::from_slice(&body) {
                Ok(payload) => payload,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Listing page {page} is not valid JSON: {e}");
                    break StopReason::MalformedPage;
                }
            };

            let page_ids = extract_ids(&payload);
            if page_ids.is_empty() {
                consecutive_empty += 1;
                log::debug!(target: LOG_TARGET, "Listing page {page} is empty ({consecutive_empty} in a row)");
                if consecutive_empty >= self.max_empty_pages {
                    break StopReason::EmptyPages;
                }
            } else {
                consecutive_empty = 0;
                log::debug!(target: LOG_TARGET, "Listing page {page} yielded {} id(s)", page_ids.len());
                ids.extend(page_ids);
            }

            self.progress.page_scanned(page, ids.len());

            page += 1;
        };

        let pages_fetched = match stop_reason {
            StopReason::FetchExhausted | StopReason::MalformedPage => page - 1,
            StopReason::EmptyPages => page,
        };

        log::info!(
            target: LOG_TARGET,
            "Index walk finished after {pages_fetched} page(s) ({stop_reason:?}): {} unique service(s)",
            ids.len()
        );

        DiscoveryOutcome { pages_fetched, stop_reason }
    }
}
