// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The recording pipeline: capture callback -> latest-frame slot -> fixed
//! rate timer -> bounded drop-oldest queue -> writer task, with a
//! per-file timing CSV recorded alongside the media.
//!
//! One pipeline exists per active source (camera, microphone, eye-tracker
//! world stream, ...); `T` is the module-specific payload type (raw PCM
//! samples, a decoded video frame, an event row, ...).

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use daq_core::Clock;
use daq_protocol::csv_schema::TimingRow;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::queue::DropOldestQueue;
use crate::tasks::TaskGroup;

/// A frame as captured, before the timer assigns it a display slot.
pub struct CapturedFrame<T> {
    pub payload: Arc<T>,
    pub capture_monotonic: Instant,
    pub capture_unix: Duration,
    pub camera_frame_index: Option<u64>,
    pub available_camera_fps: f64,
}

impl<T> Clone for CapturedFrame<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            capture_monotonic: self.capture_monotonic,
            capture_unix: self.capture_unix,
            camera_frame_index: self.camera_frame_index,
            available_camera_fps: self.available_camera_fps,
        }
    }
}

/// A single-element mailbox: the capture callback overwrites it, the
/// timer consumes it.
pub struct LatestFrameSlot<T> {
    slot: parking_lot::Mutex<Option<CapturedFrame<T>>>,
}

impl<T> Default for LatestFrameSlot<T> {
    fn default() -> Self {
        Self { slot: parking_lot::Mutex::new(None) }
    }
}

impl<T> LatestFrameSlot<T> {
    pub fn store(&self, frame: CapturedFrame<T>) {
        *self.slot.lock() = Some(frame);
    }

    fn take(&self) -> Option<CapturedFrame<T>> {
        self.slot.lock().take()
    }
}

/// A frame as it reaches the writer: the timer's view, with its assigned
/// display slot and duplication bookkeeping filled in.
pub struct Frame<T> {
    pub captured: CapturedFrame<T>,
    pub enqueued_monotonic: Instant,
    pub display_frame_index: u64,
    pub dropped_frames_total: u64,
    pub duplicates_total: u64,
    pub requested_fps: f64,
    pub is_duplicate: bool,
}

enum QueueItem<T> {
    Frame(Frame<T>),
    Shutdown,
}

/// Where a pipeline's frames ultimately go: an encoder's stdin, a WAV
/// writer, or a row-appending CSV. Implemented outside this crate per
/// media type.
#[async_trait::async_trait]
pub trait FrameSink<T>: Send {
    async fn write_frame(&mut self, frame: &Frame<T>) -> Result<(), RuntimeError>;

    /// Flush and close. Called exactly once, even if the pipeline is
    /// dropped after an earlier write error.
    async fn finish(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

pub struct PipelineConfig {
    pub fps: f64,
    pub timing_csv_path: PathBuf,
}

impl PipelineConfig {
    fn queue_capacity(&self) -> usize {
        ((2.0 * self.fps).ceil() as usize).max(30)
    }
}

/// One running capture/write pipeline. `start` spawns the timer and writer
/// tasks; `stop` tears both down within bounded shutdown budgets.
pub struct RecordingPipeline<T: Send + Sync + 'static> {
    slot: Arc<LatestFrameSlot<T>>,
    queue: DropOldestQueue<QueueItem<T>>,
    shutdown: CancellationToken,
    fps: f64,
    timing_csv_path: PathBuf,
    tasks: Option<TaskGroup>,
    skipped_frames: Arc<AtomicU64>,
}

const TIMER_SHUTDOWN_BUDGET: Duration = Duration::from_secs(2);
const WRITER_SHUTDOWN_BUDGET: Duration = Duration::from_secs(5);

impl<T: Send + Sync + 'static> RecordingPipeline<T> {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            slot: Arc::new(LatestFrameSlot::default()),
            queue: DropOldestQueue::new(config.queue_capacity()),
            shutdown: CancellationToken::new(),
            fps: config.fps,
            timing_csv_path: config.timing_csv_path.clone(),
            tasks: None,
            skipped_frames: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn slot(&self) -> Arc<LatestFrameSlot<T>> {
        Arc::clone(&self.slot)
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames.load(Ordering::SeqCst)
    }

    /// Spawn the timer and writer tasks. `sink` does the actual media
    /// write; `clock` lets tests fast-forward.
    pub fn start<C: Clock>(&mut self, mut sink: Box<dyn FrameSink<T>>, clock: C) {
        let fps = self.fps;
        let slot = Arc::clone(&self.slot);
        let queue = self.queue.clone();
        let shutdown = self.shutdown.clone();
        let skipped = Arc::clone(&self.skipped_frames);

        let mut tasks = TaskGroup::new();
        tasks.spawn_unit("timer", TIMER_SHUTDOWN_BUDGET, async move {
            run_timer(slot, queue, shutdown, fps, skipped).await;
        });

        let queue = self.queue.clone();
        let timing_csv_path = self.timing_csv_path.clone();
        tasks.spawn("writer", WRITER_SHUTDOWN_BUDGET, async move { run_writer(queue, sink, clock, timing_csv_path).await });
        self.tasks = Some(tasks);
    }

    /// Stop semantics: signal the timer, join it (2s budget), then join
    /// the writer (5s budget) after it has drained the sentinel. A timer
    /// that panics or overruns its budget is logged-worthy but doesn't
    /// fail the stop: its only job is to stop pushing frames, and nothing
    /// it does afterward affects what the writer already wrote. The writer's
    /// own result is always propagated.
    pub async fn stop(&mut self) -> Result<(), RuntimeError> {
        self.shutdown.cancel();
        let Some(tasks) = self.tasks.take() else {
            return Ok(());
        };
        let mut writer_result = Ok(());
        for (name, result) in tasks.shutdown_all().await {
            if name == "writer" {
                writer_result = result;
            }
        }
        writer_result
    }
}

async fn run_timer<T: Send + Sync + 'static>(
    slot: Arc<LatestFrameSlot<T>>,
    queue: DropOldestQueue<QueueItem<T>>,
    shutdown: CancellationToken,
    fps: f64,
    skipped_frames: Arc<AtomicU64>,
) {
    let interval = Duration::from_secs_f64(1.0 / fps);
    let mut next = Instant::now() + interval;
    let mut last: Option<CapturedFrame<T>> = None;
    let mut display_index: u64 = 0;
    let mut duplicates_total: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep_until(next.into()) => {}
        }

        // Clock recovery: if we overshot, catch `next` up to the future
        // without emitting multiple frames for the same slot.
        let now = Instant::now();
        let mut target = next + interval;
        while target <= now {
            target += interval;
        }
        next = target;

        display_index += 1;
        let dropped_frames_total = queue.dropped_total();

        match slot.take() {
            Some(captured) => {
                last = Some(captured.clone());
                queue.push(QueueItem::Frame(Frame {
                    captured,
                    enqueued_monotonic: Instant::now(),
                    display_frame_index: display_index,
                    dropped_frames_total,
                    duplicates_total,
                    requested_fps: fps,
                    is_duplicate: false,
                }));
            }
            None => match &last {
                Some(prev) => {
                    duplicates_total += 1;
                    queue.push(QueueItem::Frame(Frame {
                        captured: prev.clone(),
                        enqueued_monotonic: Instant::now(),
                        display_frame_index: display_index,
                        dropped_frames_total,
                        duplicates_total,
                        requested_fps: fps,
                        is_duplicate: true,
                    }));
                }
                None => {
                    skipped_frames.fetch_add(1, Ordering::SeqCst);
                }
            },
        }
    }
    queue.push(QueueItem::Shutdown);
}

async fn run_writer<T: Send + Sync + 'static, C: Clock>(
    queue: DropOldestQueue<QueueItem<T>>,
    mut sink: Box<dyn FrameSink<T>>,
    clock: C,
    timing_csv_path: PathBuf,
) -> Result<(), RuntimeError> {
    let mut timing = csv::Writer::from_path(&timing_csv_path)
        .map_err(|e| RuntimeError::Other(format!("opening timing CSV {}: {e}", timing_csv_path.display())))?;
    let mut frame_number: u64 = 0;
    let mut last_write: Option<Instant> = None;
    let result = loop {
        match queue.pop().await {
            QueueItem::Shutdown => break Ok(()),
            QueueItem::Frame(frame) => {
                frame_number += 1;
                let expected_delta = 1.0 / frame.requested_fps;
                let actual_delta = last_write.map(|t| t.elapsed().as_secs_f64()).unwrap_or(expected_delta);
                let write_start = Instant::now();
                let write_result = sink.write_frame(&frame).await;
                let write_duration = write_start.elapsed().as_secs_f64();

                if let Err(e) = write_result {
                    break Err(e);
                }
                last_write = Some(Instant::now());

                let unix = clock.unix_time().as_secs_f64();
                let row = TimingRow {
                    frame_number,
                    write_time_unix: unix,
                    write_time_iso: daq_protocol::time::now_iso8601(),
                    expected_delta,
                    actual_delta,
                    delta_error: actual_delta - expected_delta,
                    queue_delay: frame.enqueued_monotonic.elapsed().as_secs_f64(),
                    capture_latency: (frame.enqueued_monotonic - frame.captured.capture_monotonic).as_secs_f64(),
                    write_duration,
                    queue_backlog_after: queue.len() as u32,
                    camera_frame_index: frame.captured.camera_frame_index,
                    display_frame_index: frame.display_frame_index,
                    camera_timestamp_unix: Some(frame.captured.capture_unix.as_secs_f64()),
                    camera_timestamp_diff: Some(actual_delta),
                    gaze_timestamp_unix: None,
                    gaze_timestamp_diff: None,
                    available_camera_fps: frame.captured.available_camera_fps,
                    dropped_frames_total: frame.dropped_frames_total,
                    duplicates_total: frame.duplicates_total,
                    is_duplicate: frame.is_duplicate as u8,
                };
                if let Err(e) = timing.serialize(&row) {
                    break Err(RuntimeError::Other(format!("writing timing CSV row: {e}")));
                }
            }
        }
    };
    let _ = timing.flush();
    let finish_result = sink.finish().await;
    result.and(finish_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::SystemClock;
    use std::sync::atomic::AtomicUsize;

    struct CountingSink {
        writes: Arc<AtomicUsize>,
        finished: Arc<AtomicBoolFlag>,
    }

    struct AtomicBoolFlag(std::sync::atomic::AtomicBool);

    #[async_trait::async_trait]
    impl FrameSink<u32> for CountingSink {
        async fn write_frame(&mut self, _frame: &Frame<u32>) -> Result<(), RuntimeError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn finish(&mut self) -> Result<(), RuntimeError> {
            self.finished.0.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pipeline_duplicates_when_no_new_frame_and_flushes_on_stop() {
        let config = PipelineConfig { fps: 50.0, timing_csv_path: PathBuf::from("/tmp/unused_timing.csv") };
        let mut pipeline: RecordingPipeline<u32> = RecordingPipeline::new(&config);
        let slot = pipeline.slot();
        slot.store(CapturedFrame {
            payload: Arc::new(7u32),
            capture_monotonic: Instant::now(),
            capture_unix: Duration::from_secs(0),
            camera_frame_index: Some(0),
            available_camera_fps: 50.0,
        });

        let writes = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBoolFlag(std::sync::atomic::AtomicBool::new(false)));
        let sink = CountingSink { writes: Arc::clone(&writes), finished: Arc::clone(&finished) };
        pipeline.start(Box::new(sink), SystemClock);

        tokio::time::sleep(Duration::from_millis(120)).await;
        pipeline.stop().await.unwrap();

        assert!(writes.load(Ordering::SeqCst) >= 3);
        assert!(finished.0.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn skips_ticks_before_any_frame_ever_captured() {
        let config = PipelineConfig { fps: 100.0, timing_csv_path: PathBuf::from("/tmp/unused_timing.csv") };
        let mut pipeline: RecordingPipeline<u32> = RecordingPipeline::new(&config);
        let writes = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBoolFlag(std::sync::atomic::AtomicBool::new(false)));
        let sink = CountingSink { writes: Arc::clone(&writes), finished };
        pipeline.start(Box::new(sink), SystemClock);
        tokio::time::sleep(Duration::from_millis(50)).await;
        pipeline.stop().await.unwrap();
        assert_eq!(writes.load(Ordering::SeqCst), 0);
        assert!(pipeline.skipped_frames() > 0);
    }
}
