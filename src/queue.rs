//! Bounded feed queue
//!
//! Decouples the two poll loops (producers) from the consumer. Capacity is
//! enforced with a semaphore: a push into a full queue blocks the producing
//! task until the consumer pops, so backpressure slows producers down and
//! no entry is ever dropped.
//!
//! Entries are ordered by `(priority, seq)`: with priority mode the feeder
//! gives forward-sourced entries a lower priority number so they dequeue
//! sooner; the monotonic sequence number breaks ties in arrival order and
//! is the whole order when priorities are equal.

use crate::error::{Error, Result};
use crate::types::ResourceItem;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify, Semaphore};

/// An entry in the feed queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Dequeue priority; lower dequeues sooner
    pub priority: u8,
    /// Arrival sequence number
    pub seq: u64,
    /// The item itself
    pub item: ResourceItem,
}

impl QueueEntry {
    fn key(&self) -> (u8, u64) {
        (self.priority, self.seq)
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
struct Inner {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    next_seq: u64,
}

/// Capacity-limited, priority-ordered buffer between workers and consumer
#[derive(Debug)]
pub struct FeedQueue {
    inner: Mutex<Inner>,
    capacity: Semaphore,
    available: Notify,
    closed: AtomicBool,
}

impl FeedQueue {
    /// Create a queue with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: Semaphore::new(capacity),
            available: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Push an item, blocking while the queue is at capacity
    pub async fn push(&self, priority: u8, item: ResourceItem) -> Result<()> {
        let permit = self
            .capacity
            .acquire()
            .await
            .map_err(|_| Error::QueueClosed)?;
        // The permit is returned by the consumer on pop.
        permit.forget();

        {
            let mut inner = self.inner.lock().await;
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.heap.push(Reverse(QueueEntry {
                priority,
                seq,
                item,
            }));
        }
        self.available.notify_one();
        Ok(())
    }

    /// Pop the highest-priority entry, waiting until one is available
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<QueueEntry> {
        loop {
            let notified = self.available.notified();
            if let Some(entry) = self.try_pop().await {
                return Some(entry);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            notified.await;
        }
    }

    /// Pop with a bounded wait; `None` if nothing arrived in time
    pub async fn pop_timeout(&self, wait: Duration) -> Option<QueueEntry> {
        tokio::time::timeout(wait, self.pop()).await.ok().flatten()
    }

    /// Pop without waiting
    pub async fn try_pop(&self) -> Option<QueueEntry> {
        let mut inner = self.inner.lock().await;
        let entry = inner.heap.pop().map(|Reverse(entry)| entry);
        if entry.is_some() {
            self.capacity.add_permits(1);
        }
        entry
    }

    /// Close the queue: pending and future pushes fail, pops drain the rest
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.capacity.close();
        self.available.notify_waiters();
    }

    /// Number of queued entries
    pub async fn len(&self) -> usize {
        self.inner.lock().await.heap.len()
    }

    /// Whether the queue is currently empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_when_priorities_equal() {
        let queue = FeedQueue::new(10);
        for i in 0..5 {
            queue.push(0, json!({ "n": i })).await.unwrap();
        }
        for i in 0..5 {
            let entry = queue.pop().await.unwrap();
            assert_eq!(entry.item["n"], i);
        }
    }

    #[tokio::test]
    async fn test_lower_priority_number_dequeues_first() {
        let queue = FeedQueue::new(10);
        queue.push(10, json!("backlog-1")).await.unwrap();
        queue.push(0, json!("fresh")).await.unwrap();
        queue.push(10, json!("backlog-2")).await.unwrap();

        assert_eq!(queue.pop().await.unwrap().item, json!("fresh"));
        assert_eq!(queue.pop().await.unwrap().item, json!("backlog-1"));
        assert_eq!(queue.pop().await.unwrap().item, json!("backlog-2"));
    }

    #[tokio::test]
    async fn test_push_blocks_at_capacity() {
        let queue = Arc::new(FeedQueue::new(101));
        for i in 0..101 {
            queue.push(0, json!(i)).await.unwrap();
        }

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(0, json!(101)).await })
        };

        // The 102nd push must not complete while the queue is full.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());

        // One pop frees a slot and unblocks the producer.
        assert_eq!(queue.pop().await.unwrap().item, json!(0));
        producer.await.unwrap().unwrap();
        assert_eq!(queue.len().await, 101);
    }

    #[tokio::test]
    async fn test_pop_timeout_on_empty_queue() {
        let queue = FeedQueue::new(4);
        let entry = queue.pop_timeout(Duration::from_millis(20)).await;
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_pop_wakes_on_push() {
        let queue = Arc::new(FeedQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.push(0, json!("late")).await.unwrap();

        let entry = consumer.await.unwrap().unwrap();
        assert_eq!(entry.item, json!("late"));
    }

    #[tokio::test]
    async fn test_close_fails_push_and_drains_pop() {
        let queue = FeedQueue::new(4);
        queue.push(0, json!("a")).await.unwrap();
        queue.close();

        assert!(matches!(
            queue.push(0, json!("b")).await,
            Err(Error::QueueClosed)
        ));
        assert_eq!(queue.pop().await.unwrap().item, json!("a"));
        assert!(queue.pop().await.is_none());
    }
}
