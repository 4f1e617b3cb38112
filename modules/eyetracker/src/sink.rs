// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Sidecar CSV writer shared by the gaze, IMU, and event streams: a
//! [`daq_module_runtime::DropOldestQueue`] feeding a writer task that
//! flushes every `N` rows (N=128 for IMU, N=64 for events, N=32 for
//! gaze).

use std::path::PathBuf;

use daq_module_runtime::{DropOldestQueue, RuntimeError};
use serde::Serialize;

enum QueueItem<T> {
    Row(T),
    Shutdown,
}

/// One running sidecar writer. `push` is non-blocking (drop-oldest on
/// overflow, per C3); `stop` drains the queue and performs a final flush.
pub struct SidecarWriter<T: Send + 'static> {
    queue: DropOldestQueue<QueueItem<T>>,
    task: Option<tokio::task::JoinHandle<Result<(), RuntimeError>>>,
}

impl<T> SidecarWriter<T>
where
    T: Serialize + Send + Sync + 'static,
{
    /// `flush_every`: row count between flushes (32 gaze / 128 IMU / 64
    /// events). `capacity`: bounded-queue depth, generously sized relative
    /// to the flush cadence so only a genuine writer stall triggers drops.
    pub fn start(path: PathBuf, flush_every: usize, capacity: usize) -> Self {
        let queue: DropOldestQueue<QueueItem<T>> = DropOldestQueue::new(capacity);
        let task_queue = queue.clone();
        let task = tokio::spawn(async move { run_writer(task_queue, path, flush_every).await });
        Self { queue, task: Some(task) }
    }

    pub fn push(&self, row: T) {
        self.queue.push(QueueItem::Row(row));
    }

    pub fn dropped_total(&self) -> u64 {
        self.queue.dropped_total()
    }

    /// A cheap, cloneable handle capture loops can push through without
    /// borrowing the `SidecarWriter` itself (which `stop` consumes by value).
    pub fn clone_handle(&self) -> SidecarHandle<T> {
        SidecarHandle { queue: self.queue.clone() }
    }

    /// Signal the writer to drain and flush, then join it.
    pub async fn stop(mut self) -> Result<(), RuntimeError> {
        self.queue.push(QueueItem::Shutdown);
        match self.task.take() {
            Some(task) => match tokio::time::timeout(std::time::Duration::from_secs(5), task).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(RuntimeError::Other("sidecar writer task panicked".to_string())),
                Err(_) => Err(RuntimeError::Other("sidecar writer did not drain within budget".to_string())),
            },
            None => Ok(()),
        }
    }
}

/// Cloneable push-only handle into a running [`SidecarWriter`].
pub struct SidecarHandle<T: Send + 'static> {
    queue: DropOldestQueue<QueueItem<T>>,
}

impl<T: Send + 'static> Clone for SidecarHandle<T> {
    fn clone(&self) -> Self {
        Self { queue: self.queue.clone() }
    }
}

impl<T: Send + 'static> SidecarHandle<T> {
    pub fn push(&self, row: T) {
        self.queue.push(QueueItem::Row(row));
    }
}

async fn run_writer<T: Serialize + Send + 'static>(
    queue: DropOldestQueue<QueueItem<T>>,
    path: PathBuf,
    flush_every: usize,
) -> Result<(), RuntimeError> {
    let mut writer =
        csv::Writer::from_path(&path).map_err(|e| RuntimeError::Other(format!("creating sidecar CSV {}: {e}", path.display())))?;
    let mut since_flush = 0usize;
    loop {
        match queue.pop().await {
            QueueItem::Row(row) => {
                if writer.serialize(&row).is_err() {
                    tracing::warn!(path = %path.display(), "failed writing sidecar CSV row, continuing");
                    continue;
                }
                since_flush += 1;
                if since_flush >= flush_every {
                    let _ = writer.flush();
                    since_flush = 0;
                }
            }
            QueueItem::Shutdown => {
                let _ = writer.flush();
                return Ok(());
            }
        }
    }
}
