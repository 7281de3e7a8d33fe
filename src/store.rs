//! Signal persistence read model
//!
//! The surrounding system reads signals through exactly two queries: the
//! most recent live record (limit 1) and the most recent terminal records
//! (limit N). The engine keeps an in-memory mirror of that shape so the
//! same read path works against a live in-process engine or a remote store.

use crate::types::Signal;

/// Default history page size for terminal-record queries.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Read interface over stored signal records.
pub trait SignalStore {
    /// Most recent record whose status is live (WAITING or ACTIVE), if any.
    fn latest_live(&self) -> Option<Signal>;

    /// Most recent terminal records, newest first, at most `limit`.
    fn recent_closed(&self, limit: usize) -> Vec<Signal>;
}

/// In-memory store the engine keeps in sync with its lifecycle.
///
/// Records are held in insertion order; queries scan from the newest end.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Signal>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the record, or replaces the existing record with the same id
    /// so status transitions update in place.
    pub fn upsert(&mut self, signal: &Signal) {
        match self.records.iter_mut().find(|r| r.id == signal.id) {
            Some(existing) => *existing = signal.clone(),
            None => self.records.push(signal.clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SignalStore for MemoryStore {
    fn latest_live(&self) -> Option<Signal> {
        self.records
            .iter()
            .rev()
            .find(|r| r.status.is_live())
            .cloned()
    }

    fn recent_closed(&self, limit: usize) -> Vec<Signal> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.status.is_terminal())
            .take(limit)
            .cloned()
            .collect()
    }
}
