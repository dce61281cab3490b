//! Bounded FIFO queues.
//!
//! These queues are the only flow-control mechanism in the controller. They
//! never block: producers check [`BoundedQueue::is_full`] and consumers check
//! [`BoundedQueue::is_empty`] before moving data, and retry on a later tick
//! when the queue state changes.
//!
//! # Example
//!
//! ```
//! use stepwire::queue::ByteQueue;
//!
//! let mut q = ByteQueue::new(2).unwrap();
//! assert!(q.enqueue(1));
//! assert!(q.enqueue(2));
//! assert!(!q.enqueue(3)); // full, rejected
//! assert_eq!(q.dequeue(), Some(1));
//! ```

use std::collections::VecDeque;

use crate::error::{Result, StepwireError};

/// Default queue depth for each direction.
pub const DEFAULT_DEPTH: usize = 16;

/// Fixed-capacity FIFO with full/empty signaling.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    depth: usize,
}

/// Queue of raw wire bytes.
pub type ByteQueue = BoundedQueue<u8>;

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `depth` items.
    ///
    /// A depth of zero would be both full and empty at once and is rejected.
    pub fn new(depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(StepwireError::ZeroDepth);
        }
        Ok(Self {
            items: VecDeque::with_capacity(depth),
            depth,
        })
    }

    /// Append an item. Returns `false` and leaves the queue untouched if full.
    pub fn enqueue(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push_back(item);
        true
    }

    /// Remove the oldest item.
    #[inline]
    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Look at the oldest item without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.depth
    }

    /// Current item count, always in `0..=capacity()`.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.depth
    }

    /// Free slots.
    #[inline]
    pub fn available(&self) -> usize {
        self.depth - self.items.len()
    }

    /// Drop all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove and return every queued item in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_creation() {
        let q = ByteQueue::new(4).unwrap();
        assert_eq!(q.capacity(), 4);
        assert_eq!(q.len(), 0);
        assert_eq!(q.available(), 4);
        assert!(q.is_empty());
        assert!(!q.is_full());
    }

    #[test]
    fn test_zero_depth_rejected() {
        assert!(matches!(
            ByteQueue::new(0),
            Err(StepwireError::ZeroDepth)
        ));
    }

    #[test]
    fn test_fifo_order() {
        let mut q = ByteQueue::new(8).unwrap();
        for b in [3u8, 1, 4, 1, 5] {
            assert!(q.enqueue(b));
        }
        assert_eq!(q.peek(), Some(&3));

        let out: Vec<u8> = std::iter::from_fn(|| q.dequeue()).collect();
        assert_eq!(out, vec![3, 1, 4, 1, 5]);
    }

    #[test]
    fn test_enqueue_when_full_is_rejected() {
        let mut q = ByteQueue::new(3).unwrap();
        assert!(q.enqueue(1));
        assert!(q.enqueue(2));
        assert!(q.enqueue(3));
        assert!(q.is_full());
        assert!(!q.is_empty());

        assert!(!q.enqueue(4));
        assert_eq!(q.len(), 3);
        assert_eq!(q.available(), 0);
        assert_eq!(q.drain().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_dequeue_when_empty() {
        let mut q = ByteQueue::new(1).unwrap();
        assert_eq!(q.dequeue(), None);
        assert_eq!(q.peek(), None);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn test_count_stays_in_bounds_under_mixed_traffic() {
        let mut q = ByteQueue::new(5).unwrap();
        for i in 0..100u8 {
            if i % 3 == 0 {
                q.dequeue();
            } else {
                q.enqueue(i);
            }
            assert!(q.len() <= q.capacity());
            assert_eq!(q.is_full(), q.len() == 5);
            assert_eq!(q.is_empty(), q.len() == 0);
        }
    }

    #[test]
    fn test_depth_one_alternates() {
        let mut q = BoundedQueue::new(1).unwrap();
        assert!(q.enqueue("a"));
        assert!(q.is_full() && !q.is_empty());
        assert!(!q.enqueue("b"));
        assert_eq!(q.dequeue(), Some("a"));
        assert!(q.is_empty() && !q.is_full());
    }

    #[test]
    fn test_clear() {
        let mut q = ByteQueue::new(4).unwrap();
        q.enqueue(9);
        q.enqueue(9);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.available(), 4);
    }
}
