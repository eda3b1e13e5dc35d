use std::collections::VecDeque;
use std::sync::Arc;

use crate::event::Event;

/// Bounded, ordered, append-only history of events kept for resumption.
///
/// Eviction is FIFO: when the buffer is at capacity, the oldest event is
/// dropped to make room. Ids are strictly increasing, so lookups and range
/// scans binary-search the deque.
#[derive(Debug)]
pub struct ReplayBuffer {
    events: VecDeque<Arc<Event>>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, event: Arc<Event>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Whether `id` is still within the retained window.
    pub fn contains(&self, id: u64) -> bool {
        self.events.binary_search_by_key(&id, |event| event.id).is_ok()
    }

    /// All retained events with an id greater than `id`, in id order.
    pub fn after(&self, id: u64) -> Vec<Arc<Event>> {
        let start = self.events.partition_point(|event| event.id <= id);
        self.events.iter().skip(start).cloned().collect()
    }

    pub fn last_id(&self) -> Option<u64> {
        self.events.back().map(|event| event.id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
