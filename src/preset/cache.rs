//! Bounded preset cache with oldest-first eviction

use std::collections::VecDeque;

use ahash::AHashMap;

/// Keeps at most `capacity` entries; inserting a new key into a full cache
/// evicts the key inserted longest ago, regardless of how recently it was read
#[derive(Debug, Clone)]
pub struct PresetCache<T> {
    entries: AHashMap<String, T>,
    order: VecDeque<String>,
    capacity: usize,
}

impl<T> PresetCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Store a value; replacing an existing key keeps its place in line
    pub fn insert(&mut self, key: &str, value: T) {
        if !self.entries.contains_key(key) {
            while self.order.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                    tracing::debug!("Evicted cached preset '{}'", oldest);
                }
            }
            self.order.push_back(key.to_string());
        }
        self.entries.insert(key.to_string(), value);
    }
}
