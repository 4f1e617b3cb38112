// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! A bounded async queue with drop-oldest overflow policy: under a writer
//! stall, the most recent frame is kept and the oldest queued one is
//! discarded, rather than blocking the producer or dropping the newest.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Notify;

struct Inner<T> {
    items: parking_lot::Mutex<VecDeque<T>>,
    notify: Notify,
    capacity: usize,
    dropped: std::sync::atomic::AtomicU64,
}

pub struct DropOldestQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for DropOldestQueue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Send + 'static> DropOldestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                items: parking_lot::Mutex::new(VecDeque::with_capacity(capacity)),
                notify: Notify::new(),
                capacity: capacity.max(1),
                dropped: std::sync::atomic::AtomicU64::new(0),
            }),
        }
    }

    /// Push an item. If the queue is at capacity, drop the oldest entry
    /// first and count it.
    pub fn push(&self, item: T) {
        {
            let mut items = self.inner.items.lock();
            if items.len() >= self.inner.capacity {
                items.pop_front();
                self.inner.dropped.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            items.push_back(item);
        }
        self.inner.notify.notify_one();
    }

    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Wait for and pop the next item.
    pub async fn pop(&self) -> T {
        loop {
            if let Some(item) = self.inner.items.lock().pop_front() {
                return item;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Non-blocking pop, `None` if empty.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drops_oldest_entry_on_overflow() {
        let q: DropOldestQueue<u32> = DropOldestQueue::new(2);
        q.push(1);
        q.push(2);
        q.push(3); // drops 1
        assert_eq!(q.dropped_total(), 1);
        assert_eq!(q.pop().await, 2);
        assert_eq!(q.pop().await, 3);
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn pop_waits_for_a_push() {
        let q: DropOldestQueue<u32> = DropOldestQueue::new(4);
        let q2 = q.clone();
        let handle = tokio::spawn(async move { q2.pop().await });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        q.push(42);
        assert_eq!(handle.await.unwrap(), 42);
    }
}
