//! # Drop-Oldest Queue
//!
//! A bounded FIFO shared between one producer thread and one consumer thread.
//! Pushing onto a full queue evicts the oldest item instead of blocking.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Queue counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Items accepted by `push`.
    pub pushed: u64,
    /// Items evicted to make room for newer ones.
    pub evicted: u64,
    /// Items handed to the consumer.
    pub popped: u64,
}

/// Bounded FIFO with drop-oldest overflow.
///
/// The lock is held only for the `VecDeque` operation itself, never across
/// user code, so neither side can stall the other for longer than one
/// push or pop.
#[derive(Debug)]
pub struct DropOldestQueue<T> {
    /// The queued items.
    items: Mutex<VecDeque<T>>,
    /// Maximum number of queued items.
    capacity: usize,
    /// Items accepted.
    pushed: AtomicU64,
    /// Items evicted.
    evicted: AtomicU64,
    /// Items popped.
    popped: AtomicU64,
}

impl<T> DropOldestQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            pushed: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            popped: AtomicU64::new(0),
        }
    }

    /// Appends `item`, evicting and returning the oldest item if the queue
    /// was full. Never blocks on the consumer.
    pub fn push(&self, item: T) -> Option<T> {
        let evicted = {
            let mut items = self.items.lock();
            let evicted = if items.len() >= self.capacity {
                items.pop_front()
            } else {
                None
            };
            items.push_back(item);
            evicted
        };

        self.pushed.fetch_add(1, Ordering::Relaxed);
        if evicted.is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        evicted
    }

    /// Removes the oldest queued item without waiting.
    pub fn try_pop(&self) -> Option<T> {
        let item = self.items.lock().pop_front();
        if item.is_some() {
            self.popped.fetch_add(1, Ordering::Relaxed);
        }
        item
    }

    /// Discards every queued item, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let dropped = items.len();
        items.clear();
        dropped
    }

    /// Returns the number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_below_capacity() {
        let queue = DropOldestQueue::new(2);

        assert!(queue.push(1).is_none());
        assert!(queue.push(2).is_none());
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_five_pushes_keep_last_two() {
        let queue = DropOldestQueue::new(2);

        for frame in 1..=5 {
            queue.push(frame);
        }

        let observed: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(observed, vec![4, 5]);

        let stats = queue.stats();
        assert_eq!(stats.pushed, 5);
        assert_eq!(stats.evicted, 3);
        assert_eq!(stats.popped, 2);
    }

    #[test]
    fn test_push_returns_evicted_item() {
        let queue = DropOldestQueue::new(1);

        assert_eq!(queue.push("a"), None);
        assert_eq!(queue.push("b"), Some("a"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear() {
        let queue = DropOldestQueue::new(3);
        queue.push(1);
        queue.push(2);

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_consumer_sees_increasing_subsequence() {
        let queue = Arc::new(DropOldestQueue::new(2));

        let producer_queue = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            for frame in 0..10_000u32 {
                producer_queue.push(frame);
            }
        });

        let mut observed = Vec::new();
        while !producer.is_finished() || !queue.is_empty() {
            if let Some(frame) = queue.try_pop() {
                observed.push(frame);
            }
        }
        producer.join().unwrap();

        assert!(observed.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(observed.last().copied(), Some(9_999));
    }
}
