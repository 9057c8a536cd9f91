//! Crawl progress notifications.

use super::Throughput;
use std::sync::Arc;

/// Receives progress from a running crawl.
///
/// Calls come from worker tasks, so implementations must not block.
pub trait Progress: Send + Sync {
    /// A new phase started ("Indexing", "Harvesting").
    fn set_phase(&self, phase: &str);

    /// Listing page `page` was read; `found` counts the distinct ids seen so far.
    fn page_scanned(&self, page: u32, found: usize);

    /// Detail collection started. `throughput` keeps counting as fetches complete.
    fn track_throughput(&self, throughput: Arc<Throughput>);

    /// Print a message line without disrupting the progress indicator.
    fn println(&self, msg: &str);

    /// Finish and clear the progress indicator.
    fn done(&self);
}
