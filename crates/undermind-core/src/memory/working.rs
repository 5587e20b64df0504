//! Working Memory
//!
//! Bounded FIFO context window (Miller's Law: 7±2 items). When full, the
//! oldest item is returned to the caller on push so it can be consolidated
//! into the episodic store.

use std::collections::VecDeque;

use super::record::ContextItem;

/// Maximum characters per item when flattening to text for LLM consumption
const TO_TEXT_ITEM_CHARS: usize = 300;

/// Bounded FIFO of the current conversational context
#[derive(Debug)]
pub struct WorkingMemory {
    capacity: usize,
    items: VecDeque<ContextItem>,
}

impl WorkingMemory {
    /// Create with the given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an item; returns the evicted oldest item when already full
    pub fn push(&mut self, item: ContextItem) -> Option<ContextItem> {
        let overflow = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        overflow
    }

    /// Ordered snapshot of the current context
    pub fn get_context(&self) -> Vec<ContextItem> {
        self.items.iter().cloned().collect()
    }

    /// The most recent `n` items
    pub fn get_recent(&self, n: usize) -> Vec<ContextItem> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }

    /// Flatten to a newline-joined, role-prefixed string for LLM consumption
    pub fn to_text(&self) -> String {
        let mut parts = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let content = truncate_chars(&item.content, TO_TEXT_ITEM_CHARS);
            if item.role.is_empty() {
                parts.push(content.to_string());
            } else {
                parts.push(format!("{}: {}", item.role, content));
            }
        }
        parts.join("\n")
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Char-safe prefix of `s` with at most `max` characters
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
