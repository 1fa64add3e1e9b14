use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{Error, Result};

/// Fixed-capacity least-recently-used cache.
///
/// Entries live in a contiguous arena and are linked by indices, so the cache never allocates
/// after it is full: evicting an entry reuses its slot.
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<Arena<K, V>>,
}

struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Arena<K, V> {
    nodes: Vec<Node<K, V>>,
    index: HashMap<K, usize>,
    /// Most recently touched.
    head: Option<usize>,
    /// Least recently touched.
    tail: Option<usize>,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig("LRU cache capacity must be positive"));
        }
        Ok(LruCache {
            capacity,
            inner: Mutex::new(Arena {
                nodes: Vec::new(),
                index: HashMap::new(),
                head: None,
                tail: None,
            }),
        })
    }

    /// Set `key` to `value` and mark it most recently used.
    ///
    /// Returns the previous value, or `None` if the key was not cached. When the cache is full,
    /// the least recently used entry is evicted.
    pub fn test_and_set(&self, key: K, value: V) -> Option<V> {
        let mut arena = self.lock();

        if let Some(&idx) = arena.index.get(&key) {
            let previous = std::mem::replace(&mut arena.nodes[idx].value, value);
            arena.unlink(idx);
            arena.push_front(idx);
            return Some(previous);
        }

        let idx = if arena.nodes.len() < self.capacity {
            arena.nodes.push(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            arena.nodes.len() - 1
        } else {
            // Full, so tail is always set.
            let idx = arena.tail?;
            arena.unlink(idx);
            let evicted = std::mem::replace(&mut arena.nodes[idx].key, key.clone());
            arena.index.remove(&evicted);
            arena.nodes[idx].value = value;
            idx
        };

        arena.index.insert(key, idx);
        arena.push_front(idx);
        None
    }

    /// Value cached for `key`. Doesn't affect recency.
    pub fn get(&self, key: &K) -> Option<V> {
        let arena = self.lock();
        let idx = *arena.index.get(key)?;
        Some(arena.nodes[idx].value.clone())
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    /// Return `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Arena<K, V>> {
        // The arena is consistent between statements, so a panic elsewhere can't leave it broken.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Arena<K, V> {
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        if let Some(head) = self.head {
            self.nodes[head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}
