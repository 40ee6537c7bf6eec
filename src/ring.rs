//! Growable circular FIFO buffer.
//!
//! `Ring<T>` backs both the coordinator's idle-resource queue and the
//! reply-slot free list. It is deliberately unsynchronized: exclusive
//! ownership (the coordinator owns its ring outright) or an external lock
//! (the free list wraps its ring in a mutex) provides whatever
//! synchronization a given use needs, and compound sequences such as
//! check-then-dequeue are atomic exactly when the owner makes them so.

use std::fmt;

/// A growable circular FIFO buffer.
///
/// Elements dequeue in the order they were enqueued. When the backing
/// storage fills up, capacity grows to `2 * old + 1` and the elements are
/// moved so the logical head lands at slot 0, keeping enqueue amortized
/// O(1).
pub struct Ring<T> {
    data: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> Ring<T> {
    /// Create an empty ring with no backing storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            head: 0,
            len: 0,
        }
    }

    /// Create an empty ring with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut data = Vec::with_capacity(capacity);
        data.resize_with(capacity, || None);
        Self { data, head: 0, len: 0 }
    }

    /// Number of elements currently in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the ring holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current capacity of the backing storage.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Append `value` at the logical tail, growing storage if full.
    pub fn enqueue(&mut self, value: T) {
        if self.len == self.data.len() {
            self.grow(2 * self.data.len() + 1);
        }
        let tail = (self.head + self.len) % self.data.len();
        self.data[tail] = Some(value);
        self.len += 1;
    }

    /// Remove and return the logical head, or `None` if empty.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.data[self.head].take();
        self.head = (self.head + 1) % self.data.len();
        self.len -= 1;
        value
    }

    /// Return a reference to the logical head without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.data[self.head].as_ref()
    }

    /// Replace the backing storage, moving elements in FIFO order so the
    /// old logical head ends up at slot 0.
    fn grow(&mut self, new_capacity: usize) {
        let mut data = Vec::with_capacity(new_capacity);
        data.resize_with(new_capacity, || None);
        for slot in 0..self.len {
            let index = (self.head + slot) % self.data.len();
            data[slot] = self.data[index].take();
        }
        self.head = 0;
        self.data = data;
    }
}

impl<T> Default for Ring<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("len", &self.len)
            .field("capacity", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeue_preserves_fifo_order() {
        let mut ring = Ring::new();
        for i in 0..10 {
            ring.enqueue(i);
        }
        for i in 0..10 {
            assert_eq!(ring.dequeue(), Some(i));
        }
        assert_eq!(ring.dequeue(), None);
    }

    #[test]
    fn capacity_doubles_plus_one() {
        let mut ring = Ring::new();
        assert_eq!(ring.capacity(), 0);
        ring.enqueue(1);
        assert_eq!(ring.capacity(), 1);
        ring.enqueue(2);
        assert_eq!(ring.capacity(), 3);
        ring.enqueue(3);
        ring.enqueue(4);
        assert_eq!(ring.capacity(), 7);
    }

    #[test]
    fn growth_after_wraparound_preserves_order() {
        let mut ring = Ring::with_capacity(3);
        ring.enqueue(1);
        ring.enqueue(2);
        ring.enqueue(3);
        // advance the head so the live region wraps the backing storage
        assert_eq!(ring.dequeue(), Some(1));
        assert_eq!(ring.dequeue(), Some(2));
        ring.enqueue(4);
        ring.enqueue(5);
        // full again; the next enqueue grows mid-wrap
        ring.enqueue(6);
        assert_eq!(ring.capacity(), 7);
        for i in 3..=6 {
            assert_eq!(ring.dequeue(), Some(i));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn peek_does_not_remove() {
        let mut ring = Ring::new();
        assert_eq!(ring.peek(), None);
        ring.enqueue("a");
        ring.enqueue("b");
        assert_eq!(ring.peek(), Some(&"a"));
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.dequeue(), Some("a"));
        assert_eq!(ring.peek(), Some(&"b"));
    }

    #[test]
    fn with_capacity_defers_growth() {
        let mut ring = Ring::with_capacity(4);
        for i in 0..4 {
            ring.enqueue(i);
        }
        assert_eq!(ring.capacity(), 4);
        ring.enqueue(4);
        assert_eq!(ring.capacity(), 9);
    }
}
