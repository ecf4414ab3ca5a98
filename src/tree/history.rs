//! Full-snapshot undo history
//!
//! Every change stores the complete serialized state. Undo and redo simply
//! move a cursor and restore whatever snapshot it lands on.

use std::collections::VecDeque;

/// One recorded state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLog {
    /// Human readable description of the change
    pub change: String,
    /// Tag grouping changes that may collapse into one entry
    pub group: String,
    /// Serialized snapshot JSON
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<StateLog>,
    cursor: usize,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the entry matching the current state
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&StateLog> {
        self.entries.get(index)
    }

    pub fn current(&self) -> Option<&StateLog> {
        self.entries.get(self.cursor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateLog> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Record a state. With `collapse`, an entry at the cursor sharing `group`
    /// is overwritten instead of appended to. Redo entries past the cursor are
    /// discarded and the oldest entries are evicted to stay within capacity.
    pub fn save(&mut self, change: &str, group: &str, state: String, collapse: bool) {
        let replace_last = collapse && self.current().is_some_and(|log| log.group == group);

        let preserved = if self.entries.is_empty() {
            0
        } else {
            self.cursor + usize::from(!replace_last)
        };
        self.entries.truncate(preserved);

        let mut evicted = 0;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!("History evicted {} oldest states", evicted);
        }

        self.entries.push_back(StateLog {
            change: change.to_string(),
            group: group.to_string(),
            state,
        });
        self.cursor = self.entries.len() - 1;
    }

    /// Move the cursor to `index`; out-of-range requests leave it untouched
    pub fn move_to(&mut self, index: usize) -> Option<&StateLog> {
        if index >= self.entries.len() {
            return None;
        }
        self.cursor = index;
        self.entries.get(index)
    }

    /// Index `step` entries away from the cursor, if it exists
    pub fn relative(&self, step: isize) -> Option<usize> {
        self.cursor
            .checked_add_signed(step)
            .filter(|&index| index < self.entries.len())
    }

    /// Change capacity, evicting the oldest entries right away if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }
    }
}
