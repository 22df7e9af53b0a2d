//! Bounded in-memory show cache
//!
//! Keeps previously fetched shows around with a simple recency/size hybrid
//! policy: every insertion appends its key to a retention sequence, and once
//! the sweep interval has elapsed since the last sweep, everything but the
//! most recently inserted keys is evicted in one batch.

use crate::model::Show;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default number of insertions that survive a sweep
pub const DEFAULT_RETENTION_SIZE: usize = 100;

/// Default minimum time between two sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(20);

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheState {
    shows: HashMap<u64, Arc<Show>>,
    /// Keys in insertion order, duplicates included
    order: Vec<u64>,
    last_sweep: Instant,
}

/// Thread-safe store of shows keyed by show id
///
/// Shows are handed out as `Arc`s and are treated as immutable once
/// inserted; refreshing a show means inserting a new instance under the same
/// key. The retention sequence and the key set are updated under one lock,
/// so a sweep can never race with a concurrent insertion.
pub struct ShowCache {
    state: Mutex<CacheState>,
    clock: Arc<dyn Clock>,
    retention_size: usize,
    sweep_interval: Duration,
}

impl ShowCache {
    /// Creates a cache with the default retention size and sweep interval
    pub fn new() -> Self {
        Self::with_policy(
            DEFAULT_RETENTION_SIZE,
            DEFAULT_SWEEP_INTERVAL,
            Arc::new(SystemClock),
        )
    }

    pub fn with_policy(
        retention_size: usize,
        sweep_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let last_sweep = clock.now();
        Self {
            state: Mutex::new(CacheState {
                shows: HashMap::new(),
                order: Vec::new(),
                last_sweep,
            }),
            clock,
            retention_size,
            sweep_interval,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a show, possibly sweeping out stale entries first
    ///
    /// Re-inserting an existing key appends it to the retention sequence
    /// again, which protects it from the next sweep.
    pub fn insert(&self, id: u64, show: Arc<Show>) {
        let mut state = self.lock();
        state.order.push(id);

        let now = self.clock.now();
        if now.duration_since(state.last_sweep) > self.sweep_interval {
            let cut = state.order.len().saturating_sub(self.retention_size);
            let stale: Vec<u64> = state.order.drain(..cut).collect();
            let retained: HashSet<u64> = state.order.iter().copied().collect();

            let before = state.shows.len();
            for key in stale {
                if !retained.contains(&key) {
                    state.shows.remove(&key);
                }
            }
            debug!(
                evicted = before.saturating_sub(state.shows.len()),
                retained = retained.len(),
                "Swept show cache"
            );
            state.last_sweep = now;
        }

        state.shows.insert(id, show);
    }

    /// Returns the cached show for `id`, if any
    pub fn get(&self, id: u64) -> Option<Arc<Show>> {
        self.lock().shows.get(&id).cloned()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.lock().shows.contains_key(&id)
    }

    /// Number of distinct shows currently held
    pub fn len(&self) -> usize {
        self.lock().shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().shows.is_empty()
    }
}

impl Default for ShowCache {
    fn default() -> Self {
        Self::new()
    }
}
