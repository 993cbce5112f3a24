#![forbid(unsafe_code)]

use std::collections::VecDeque;

/// Bounded history of interaction names, oldest first.
#[derive(Debug, Clone)]
pub struct BehaviorLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl BehaviorLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an interaction, evicting the oldest entries on overflow.
    pub fn record(&mut self, name: impl Into<String>) {
        self.entries.push_back(name.into());
        self.trim();
    }

    /// Replace the contents, keeping only the most recent `capacity` entries.
    pub fn restore(&mut self, entries: impl IntoIterator<Item = String>) {
        self.entries = entries.into_iter().collect();
        self.trim();
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}
