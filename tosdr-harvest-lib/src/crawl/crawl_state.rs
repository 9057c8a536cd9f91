use super::{EntityId, ServiceRecord};
use std::collections::BTreeSet;

/// Mutable state of one crawl, owned by the orchestrating caller.
///
/// Phase 1 grows the id set; phase 2 grows the record list. Only the owner writes
/// to it, so no synchronization is involved.
#[derive(Debug, Default)]
pub struct CrawlState {
    ids: BTreeSet<EntityId>,
    records: Vec<ServiceRecord>,
}

impl CrawlState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn ids_mut(&mut self) -> &mut BTreeSet<EntityId> {
        &mut self.ids
    }

    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<EntityId> {
        &self.ids
    }

    /// The discovered ids in their stable (sorted) order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        self.ids.iter().cloned().collect()
    }

    pub fn push_record(&mut self, record: ServiceRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[ServiceRecord] {
        &self.records
    }

    /// Close the crawl and produce its report.
    #[must_use]
    pub fn into_report(self) -> CrawlReport {
        CrawlReport {
            discovered: self.ids.len(),
            records: self.records,
        }
    }
}

/// Result of a completed crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Number of unique ids found by index discovery.
    pub discovered: usize,

    /// Records in completion order.
    pub records: Vec<ServiceRecord>,
}

impl CrawlReport {
    #[must_use]
    pub fn kept(&self) -> usize {
        self.records.len()
    }

    /// Discovered services that produced no record.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.discovered.saturating_sub(self.records.len())
    }
}
