use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use crate::{Result, Str};

use super::BloomFilter;

type QueueFullHook = Arc<dyn Fn() + Send + Sync>;

/// Collects the distinct keys each flag was evaluated for.
///
/// A Bloom filter remembers keys already reported, so that a key is tracked once per flag until
/// the filter is cleared.
pub struct UniqueKeysTracker {
    state: Mutex<TrackerState>,
    threshold: usize,
    queue_full_hook: RwLock<Option<QueueFullHook>>,
}

struct TrackerState {
    filter: BloomFilter,
    cache: HashMap<Str, HashSet<Str>>,
    size: usize,
}

impl UniqueKeysTracker {
    /// Default number of tracked keys above which the queue-full hook fires.
    pub const DEFAULT_THRESHOLD: usize = 30_000;

    /// Create a tracker whose filter is sized for `filter_capacity` keys at `filter_error_rate`.
    pub fn new(threshold: usize, filter_capacity: usize, filter_error_rate: f64) -> Result<Self> {
        Ok(UniqueKeysTracker {
            state: Mutex::new(TrackerState {
                filter: BloomFilter::new(filter_capacity, filter_error_rate)?,
                cache: HashMap::new(),
                size: 0,
            }),
            threshold,
            queue_full_hook: RwLock::new(None),
        })
    }

    /// Track that `flag` was evaluated for `key`.
    ///
    /// Returns `false` if the pair was already seen.
    pub fn track(&self, key: &str, flag: &str) -> bool {
        let size = {
            let mut state = self.lock();
            let filter_key = format!("{flag}{key}");
            if state.filter.contains(&filter_key) {
                return false;
            }
            state
                .cache
                .entry(flag.into())
                .or_default()
                .insert(key.into());
            state.filter.add(&filter_key);
            state.size += 1;
            state.size
        };

        if size > self.threshold {
            log::info!(target: "split",
                       size,
                       threshold = self.threshold;
                       "unique keys queue is full, flushing");
            let hook = self
                .queue_full_hook
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(hook) = hook {
                hook();
            }
        }

        true
    }

    /// Take all tracked keys, grouped by flag, and their total count.
    pub fn get_cache_info_and_pop_all(&self) -> (HashMap<Str, HashSet<Str>>, usize) {
        let mut state = self.lock();
        let cache = std::mem::take(&mut state.cache);
        let size = std::mem::replace(&mut state.size, 0);
        (cache, size)
    }

    /// Forget which keys were already reported.
    pub fn clear_filter(&self) {
        self.lock().filter.clear();
    }

    /// Set the callback invoked when more than the threshold of keys is tracked.
    ///
    /// The hook is called without holding the tracker's lock, so it may drain the tracker.
    pub fn set_queue_full_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .queue_full_hook
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
