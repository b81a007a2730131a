//! Bounded, deduplicating crawl frontier
//!
//! The frontier holds discovered-but-not-yet-fetched URLs in FIFO order,
//! alongside the set of URLs already handed to a worker. Admission is
//! load-shedding: once the queue reaches its capacity further discoveries are
//! dropped, not queued and not retried.

use crate::crawler::conditions::{all_enqueue_met, EnqueueCondition};
use dashmap::DashSet;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Capacity ceiling of the pending queue
pub const FRONTIER_CAPACITY: usize = 2000;

#[derive(Debug, Default)]
struct PendingQueue {
    order: VecDeque<Url>,
    members: HashSet<String>,
}

/// Thread-safe FIFO of pending URLs plus the visited set
#[derive(Debug)]
pub struct Frontier {
    pending: Mutex<PendingQueue>,
    visited: DashSet<String>,
    capacity: usize,
}

impl Frontier {
    /// Creates an empty frontier with the given capacity ceiling
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(PendingQueue::default()),
            visited: DashSet::new(),
            capacity,
        }
    }

    /// Creates a frontier seeded with `seeds`
    ///
    /// Seeds bypass enqueue conditions but are still deduplicated and bounded
    /// by the capacity ceiling.
    pub fn with_seeds(seeds: &[Url], capacity: usize) -> Self {
        let frontier = Self::new(capacity);
        for seed in seeds {
            if !frontier.admit(seed.clone()) {
                tracing::debug!("Seed {} not queued (duplicate or frontier full)", seed);
            }
        }
        frontier
    }

    /// Queues `url` if there is room, it is neither queued nor visited, and
    /// every enqueue condition admits it
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued
    /// * `false` - The URL was dropped
    pub fn try_enqueue(&self, url: Url, conditions: &[Arc<dyn EnqueueCondition>]) -> bool {
        if !all_enqueue_met(conditions, &url) {
            tracing::trace!("Enqueue conditions rejected {}", url);
            return false;
        }

        self.admit(url)
    }

    fn admit(&self, url: Url) -> bool {
        let key = url.as_str().to_string();
        if self.visited.contains(&key) {
            return false;
        }

        let mut pending = self.lock();
        if pending.order.len() >= self.capacity || pending.members.contains(&key) {
            return false;
        }

        pending.members.insert(key);
        pending.order.push_back(url);
        true
    }

    /// Pops the oldest pending URL without blocking
    pub fn try_dequeue(&self) -> Option<Url> {
        let mut pending = self.lock();
        let url = pending.order.pop_front()?;
        pending.members.remove(url.as_str());
        Some(url)
    }

    /// Records `url` as visited
    ///
    /// # Returns
    ///
    /// * `true` - First visit
    /// * `false` - Already visited
    pub fn mark_visited(&self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    /// Returns true if `url` has been visited
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Returns the number of pending URLs
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    /// Advisory: the size may change concurrently
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns the capacity ceiling
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, PendingQueue> {
        // The queue holds no invariants a panicking holder could break halfway
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new(FRONTIER_CAPACITY)
    }
}
