use std::collections::VecDeque;

use grid_client::{domain::CapacitySummary, ChainIdentifier, LookupQuery};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub kind: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub results: usize,
    pub summary: Option<CapacitySummary>,
}

impl HistoryEntry {
    pub fn capacity(query: &LookupQuery, rows: usize, summary: &CapacitySummary) -> Self {
        Self {
            query: query.to_string(),
            kind: query.kind(),
            at: OffsetDateTime::now_utc(),
            results: rows,
            summary: Some(summary.clone()),
        }
    }

    pub fn status(identifier: &ChainIdentifier, results: usize) -> Self {
        Self {
            query: identifier.to_string(),
            kind: "status",
            at: OffsetDateTime::now_utc(),
            results,
            summary: None,
        }
    }
}

/// Bounded list of recent lookups, oldest evicted first.
///
/// Owned by whoever serves the queries; capacity is clamped to 10..=50.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl QueryHistory {
    pub const MIN_CAPACITY: usize = 10;
    pub const MAX_CAPACITY: usize = 50;

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(Self::MIN_CAPACITY, Self::MAX_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Newest first.
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::with_capacity(20)
    }
}
