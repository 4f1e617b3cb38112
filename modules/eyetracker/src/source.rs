// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The eye tracker's RTSP world-camera/gaze stream, IMU, and event feeds
//! are external collaborators; this crate only defines the seams and
//! synthetic generators standing in for them.

use std::sync::atomic::{AtomicU64, Ordering};

/// One gaze sample paired with its nearest world-camera frame.
pub struct GazeSample {
    pub gaze_x: f64,
    pub gaze_y: f64,
    pub confidence: f64,
    pub norm_pos_x: f64,
    pub norm_pos_y: f64,
    pub world_frame_index: u64,
    pub world_timestamp_unix: f64,
    pub is_fixation: bool,
    pub is_blink: bool,
    pub is_saccade: bool,
}

#[async_trait::async_trait]
pub trait GazeSource: Send + Sync {
    async fn next_sample(&self) -> GazeSample;
}

pub struct SyntheticGazeSource {
    tick: AtomicU64,
}

impl Default for SyntheticGazeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticGazeSource {
    pub fn new() -> Self {
        Self { tick: AtomicU64::new(0) }
    }
}

#[async_trait::async_trait]
impl GazeSource for SyntheticGazeSource {
    async fn next_sample(&self) -> GazeSample {
        let n = self.tick.fetch_add(1, Ordering::SeqCst);
        let t = n as f64 * 0.02; // ~50 Hz gaze
        GazeSample {
            gaze_x: 960.0 + 200.0 * (t).sin(),
            gaze_y: 540.0 + 100.0 * (t * 1.3).cos(),
            confidence: 0.9,
            norm_pos_x: 0.5 + 0.1 * t.sin(),
            norm_pos_y: 0.5 + 0.1 * (t * 1.3).cos(),
            world_frame_index: n / 2, // world camera runs at half gaze rate
            world_timestamp_unix: daq_core::SystemClock.unix_time().as_secs_f64(),
            is_fixation: n % 25 < 20,
            is_blink: n % 100 == 0,
            is_saccade: n % 25 >= 20 && n % 100 != 0,
        }
    }
}

/// One IMU reading.
pub struct ImuSample {
    pub accel: (f64, f64, f64),
    pub gyro: (f64, f64, f64),
    pub mag: (f64, f64, f64),
    pub quat: (f64, f64, f64, f64),
}

#[async_trait::async_trait]
pub trait ImuSource: Send + Sync {
    async fn next_sample(&self) -> ImuSample;
}

pub struct SyntheticImuSource {
    tick: AtomicU64,
}

impl Default for SyntheticImuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticImuSource {
    pub fn new() -> Self {
        Self { tick: AtomicU64::new(0) }
    }
}

#[async_trait::async_trait]
impl ImuSource for SyntheticImuSource {
    async fn next_sample(&self) -> ImuSample {
        let n = self.tick.fetch_add(1, Ordering::SeqCst) as f64;
        ImuSample {
            accel: (0.01 * n.sin(), 0.01 * n.cos(), 9.81),
            gyro: (0.001 * n.sin(), 0.0, 0.0),
            mag: (20.0, 5.0, -40.0),
            quat: (1.0, 0.0, 0.0, 0.0),
        }
    }
}

/// One discrete eye-tracker event: fixation/saccade/blink onsets and
/// offsets, plus marker/stimulus-triggered events.
pub struct EyeTrackerEvent {
    pub event_type: String,
    pub duration_ms: f64,
    pub confidence: f64,
}

#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    async fn next_event(&self) -> EyeTrackerEvent;
}

pub struct SyntheticEventSource {
    tick: AtomicU64,
}

impl Default for SyntheticEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticEventSource {
    pub fn new() -> Self {
        Self { tick: AtomicU64::new(0) }
    }
}

#[async_trait::async_trait]
impl EventSource for SyntheticEventSource {
    async fn next_event(&self) -> EyeTrackerEvent {
        let n = self.tick.fetch_add(1, Ordering::SeqCst);
        let event_type = match n % 3 {
            0 => "fixation_start",
            1 => "fixation_end",
            _ => "saccade",
        };
        EyeTrackerEvent { event_type: event_type.to_string(), duration_ms: 120.0 + (n % 5) as f64 * 10.0, confidence: 0.95 }
    }
}
