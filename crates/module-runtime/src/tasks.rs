// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Bounded shutdown for a module's background tasks (timer, writer,
//! stdin reader, ...): each is registered with its own join timeout, so
//! tearing one down can never hang the others or the caller indefinitely.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::RuntimeError;

struct Entry {
    name: &'static str,
    timeout: Duration,
    handle: JoinHandle<Result<(), RuntimeError>>,
}

/// A set of spawned tasks, joined in registration order on [`Self::shutdown_all`].
/// The caller signals cancellation (typically via a shared `CancellationToken`)
/// before calling `shutdown_all`; this type only owns the join/timeout bookkeeping.
#[derive(Default)]
pub struct TaskGroup {
    entries: Vec<Entry>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-running task, allowing up to `timeout` to join it.
    pub fn spawn<F>(&mut self, name: &'static str, timeout: Duration, future: F)
    where
        F: Future<Output = Result<(), RuntimeError>> + Send + 'static,
    {
        self.entries.push(Entry { name, timeout, handle: tokio::spawn(future) });
    }

    /// Like [`Self::spawn`], for a task whose future can't itself fail (a
    /// timer loop that only ever returns `()`).
    pub fn spawn_unit<F>(&mut self, name: &'static str, timeout: Duration, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn(name, timeout, async move {
            future.await;
            Ok(())
        });
    }

    /// Join every registered task, each within its own timeout budget, in
    /// registration order. Always visits every task even after an earlier
    /// one errors or times out, since a later task may still be mid-flush.
    pub async fn shutdown_all(mut self) -> Vec<(&'static str, Result<(), RuntimeError>)> {
        let mut results = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            let name = entry.name;
            let result = match tokio::time::timeout(entry.timeout, entry.handle).await {
                Ok(Ok(inner)) => inner,
                Ok(Err(_join_err)) => Err(RuntimeError::Other(format!("{name} task panicked"))),
                Err(_timeout) => Err(RuntimeError::Other(format!("{name} did not shut down within its timeout budget"))),
            };
            results.push((name, result));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn joins_every_task_and_reports_per_task_results() {
        let mut group = TaskGroup::new();
        group.spawn_unit("quick", Duration::from_secs(1), async {});
        group.spawn("failing", Duration::from_secs(1), async { Err(RuntimeError::Other("boom".into())) });

        let results = group.shutdown_all().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[tokio::test]
    async fn a_task_that_outlives_its_timeout_is_reported_not_awaited_forever() {
        let mut group = TaskGroup::new();
        group.spawn_unit("slow", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let results = group.shutdown_all().await;
        assert!(results[0].1.is_err());
    }
}
