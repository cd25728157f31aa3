/*!
 * Bounded FIFO queue for CAN frames in flight.
 *
 * Fixed capacity, non-blocking: `push` fails (and the item is dropped by the
 * caller) when full, `pop` returns `None` when empty. Each instance is used
 * single-producer/single-consumer -- the receive queue is filled by the
 * driver and drained by the dispatcher, the send queue the other way round --
 * so there is no internal locking.
 */

use std::collections::VecDeque;

#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item. Returns false (item dropped) when the queue is full.
    #[must_use]
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() >= self.capacity {
            return false;
        }
        self.items.push_back(item);
        true
    }

    /// Remove and return the oldest item, or `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
