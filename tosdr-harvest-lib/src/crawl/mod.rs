//! The ToS;DR crawl engine.
//!
//! A crawl runs in two phases against the service API:
//!
//! 1. **Index discovery**: [`IndexPaginator`] walks the paginated listing one page at
//!    a time, accepting several envelope shapes (see [`IndexShape`]), until the fetch
//!    fails or several consecutive pages come back empty. The ids it finds are kept
//!    deduplicated and sorted so the second phase always starts from the same input.
//! 2. **Detail collection**: [`ConcurrentCollector`] submits one task per id to a
//!    fixed-size worker pool. Each task fetches the service detail, runs it through
//!    the [`normalizer`] and either yields a [`ServiceRecord`] or nothing. Records are
//!    streamed back in completion order while [`Throughput`] tracks progress.
//!
//! Every HTTP call goes through [`RateLimitedFetcher`], which adds jitter before each
//! attempt, backs off linearly on 429 responses and gives up quietly after a fixed
//! number of attempts. Only an empty index is fatal; every other failure just means
//! one service is missing from the output.
//!
//! [`Crawler`] ties the phases together around an owned [`CrawlState`].

mod collector;
mod crawl_state;
mod crawler;
mod endpoints;
mod entity_id;
mod fetch_result;
mod fetcher;
pub mod index_shape;
pub mod normalizer;
mod paginator;
mod progress;
mod service_record;
mod throughput;
mod worker_pool;

pub use collector::{Collection, ConcurrentCollector, DEFAULT_WORKERS};
pub use crawl_state::{CrawlReport, CrawlState};
pub use crawler::{CrawlSettings, Crawler};
pub use endpoints::{Endpoints, TOSDR_API_BASE};
pub use entity_id::EntityId;
pub use fetch_result::FetchResult;
pub use fetcher::{DEFAULT_USER_AGENTS, FetchPolicy, RateLimitedFetcher};
pub use index_shape::IndexShape;
pub use paginator::{DEFAULT_MAX_EMPTY_PAGES, DiscoveryOutcome, IndexPaginator, StopReason};
pub use progress::Progress;
pub use service_record::{DocumentLink, ServiceRecord, UNKNOWN_RATING, UNTITLED_DOCUMENT};
pub use throughput::Throughput;
pub use worker_pool::WorkerPool;
