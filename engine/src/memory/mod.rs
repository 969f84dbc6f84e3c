//! Session memory
//!
//! Bounded FIFO record of recent (event, decision) pairs, providing
//! short-term context for the pipeline. Capacity is fixed at construction;
//! inserting into a full buffer evicts the oldest entry. The orchestrator
//! is the sole owner and writer — event processing is strictly sequential,
//! so no lock is needed here. An implementation exposing this buffer to
//! concurrent external readers must wrap it in a mutex.

use crate::events::Event;
use crate::fusion::Decision;
use std::collections::VecDeque;

/// Default number of (event, decision) pairs retained
pub const DEFAULT_CAPACITY: usize = 10;

/// Bounded recent-history buffer of (event, decision) pairs
#[derive(Debug, Clone)]
pub struct SessionMemory {
    entries: VecDeque<(Event, Decision)>,
    capacity: usize,
}

impl SessionMemory {
    /// Create a session memory holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record a processed event and its decision, evicting the oldest
    /// entry when at capacity
    pub fn record(&mut self, event: Event, decision: Decision) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((event, decision));
    }

    /// Number of retained entries; never exceeds the capacity
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over retained entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &(Event, Decision)> {
        self.entries.iter()
    }

    /// The most recent entry, if any
    pub fn last(&self) -> Option<&(Event, Decision)> {
        self.entries.back()
    }

    /// Clear all retained entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
