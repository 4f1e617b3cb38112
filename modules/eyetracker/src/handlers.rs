// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Eye tracker module command handlers: three independent capture loops
//! (gaze, IMU, events) each feeding a [`crate::sink::SidecarWriter`] at its
//! own cadence. A `start_recording` spins up all three; a `stop_recording`
//! aborts the capture loops and drains each sidecar writer so every
//! buffered row reaches disk before the CSV files are closed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use daq_core::Clock;
use daq_module_runtime::{ModuleHandlers, RuntimeError, System};
use daq_protocol::csv_schema::{EyeTrackerEventRow, GazeRow, ImuRow, StandardPrefix};
use daq_protocol::Command;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::sink::{SidecarHandle, SidecarWriter};
use crate::source::{EventSource, GazeSource, ImuSource};

/// Queue depths, generous relative to their flush cadence.
const GAZE_FLUSH_EVERY: usize = 32;
const IMU_FLUSH_EVERY: usize = 128;
const EVENT_FLUSH_EVERY: usize = 64;
const GAZE_QUEUE_CAPACITY: usize = 256;
const IMU_QUEUE_CAPACITY: usize = 512;
const EVENT_QUEUE_CAPACITY: usize = 256;

struct RunningRecording {
    gaze_task: JoinHandle<()>,
    imu_task: JoinHandle<()>,
    event_task: JoinHandle<()>,
    gaze_writer: SidecarWriter<GazeRow>,
    imu_writer: SidecarWriter<ImuRow>,
    event_writer: SidecarWriter<EyeTrackerEventRow>,
    gaze_path: PathBuf,
    imu_path: PathBuf,
    event_path: PathBuf,
}

pub struct EyeTrackerModule {
    gaze_source: Arc<dyn GazeSource>,
    imu_source: Arc<dyn ImuSource>,
    event_source: Arc<dyn EventSource>,
    output_dir: PathBuf,
    started_at: Instant,
    running: parking_lot::Mutex<Option<RunningRecording>>,
}

impl EyeTrackerModule {
    pub fn new(
        gaze_source: Arc<dyn GazeSource>,
        imu_source: Arc<dyn ImuSource>,
        event_source: Arc<dyn EventSource>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            gaze_source,
            imu_source,
            event_source,
            output_dir,
            started_at: Instant::now(),
            running: parking_lot::Mutex::new(None),
        }
    }

    fn output_root(&self, sys: &System) -> PathBuf {
        sys.session_dir().unwrap_or_else(|| self.output_dir.clone()).join("EyeTracker")
    }

    pub async fn stop_if_recording(&self) -> Option<Result<Value, RuntimeError>> {
        let running = self.running.lock().take()?;
        running.gaze_task.abort();
        running.imu_task.abort();
        running.event_task.abort();

        let (gaze_result, imu_result, event_result) =
            tokio::join!(running.gaze_writer.stop(), running.imu_writer.stop(), running.event_writer.stop());
        for result in [gaze_result, imu_result, event_result] {
            if let Err(e) = result {
                tracing::warn!(error = %e, "eye tracker sidecar writer did not shut down cleanly");
            }
        }

        Some(Ok(json!({
            "gaze_file": running.gaze_path,
            "imu_file": running.imu_path,
            "event_file": running.event_path,
        })))
    }
}

#[async_trait::async_trait]
impl ModuleHandlers for EyeTrackerModule {
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        if self.running.lock().is_some() {
            return Err(RuntimeError::Other("already recording".to_string()));
        }

        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;

        let trial_number = cmd.get_u64("trial_number").unwrap_or(0) as u32;
        let trial_label = cmd.get_str("trial_label").unwrap_or("recording").to_string();
        let stem = format!("trial_{trial_number:04}_{trial_label}");
        let gaze_path = dir.join(format!("{stem}_gaze.csv"));
        let imu_path = dir.join(format!("{stem}_imu.csv"));
        let event_path = dir.join(format!("{stem}_events.csv"));

        let gaze_writer = SidecarWriter::start(gaze_path.clone(), GAZE_FLUSH_EVERY, GAZE_QUEUE_CAPACITY);
        let imu_writer = SidecarWriter::start(imu_path.clone(), IMU_FLUSH_EVERY, IMU_QUEUE_CAPACITY);
        let event_writer = SidecarWriter::start(event_path.clone(), EVENT_FLUSH_EVERY, EVENT_QUEUE_CAPACITY);

        let gaze_task = spawn_gaze_loop(
            Arc::clone(&self.gaze_source),
            gaze_writer.clone_handle(),
            trial_number,
            trial_label.clone(),
            self.started_at,
        );
        let imu_task = spawn_imu_loop(
            Arc::clone(&self.imu_source),
            imu_writer.clone_handle(),
            trial_number,
            trial_label.clone(),
            self.started_at,
        );
        let event_task = spawn_event_loop(
            Arc::clone(&self.event_source),
            event_writer.clone_handle(),
            trial_number,
            trial_label,
            self.started_at,
        );

        self.running.lock().replace(RunningRecording {
            gaze_task,
            imu_task,
            event_task,
            gaze_writer,
            imu_writer,
            event_writer,
            gaze_path: gaze_path.clone(),
            imu_path: imu_path.clone(),
            event_path: event_path.clone(),
        });

        Ok(json!({"gaze_file": gaze_path, "imu_file": imu_path, "event_file": event_path}))
    }

    async fn stop_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
        match self.stop_if_recording().await {
            Some(result) => result,
            None => Err(RuntimeError::Other("not recording".to_string())),
        }
    }

    async fn status_snapshot(&self, _sys: &System) -> Value {
        let running = self.running.lock();
        match running.as_ref() {
            Some(r) => json!({
                "recording": true,
                "session_elapsed_s": self.started_at.elapsed().as_secs_f64(),
                "gaze_dropped_total": r.gaze_writer.dropped_total(),
                "imu_dropped_total": r.imu_writer.dropped_total(),
                "event_dropped_total": r.event_writer.dropped_total(),
            }),
            None => json!({"recording": false}),
        }
    }

    async fn custom_command(&self, _sys: &System, _cmd: &Command) -> Result<Option<Value>, RuntimeError> {
        Ok(None)
    }
}

fn spawn_gaze_loop(
    source: Arc<dyn GazeSource>,
    writer: SidecarHandle<GazeRow>,
    trial_number: u32,
    trial_label: String,
    started_at: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let sample = source.next_sample().await;
            let now_unix = daq_core::SystemClock.unix_time().as_secs_f64();
            let row = GazeRow {
                prefix: StandardPrefix {
                    trial: trial_number,
                    module: "EyeTracker".to_string(),
                    device_id: "eyetracker-0".to_string(),
                    label: trial_label.clone(),
                    record_time_unix: now_unix,
                    record_time_mono: started_at.elapsed().as_secs_f64(),
                },
                gaze_x: sample.gaze_x,
                gaze_y: sample.gaze_y,
                gaze_x_left: sample.gaze_x,
                gaze_y_left: sample.gaze_y,
                gaze_x_right: sample.gaze_x,
                gaze_y_right: sample.gaze_y,
                pupil_diameter_left: 3.5,
                pupil_diameter_right: 3.5,
                pupil_diameter_left_mm: 3.5,
                pupil_diameter_right_mm: 3.5,
                confidence: sample.confidence,
                gaze_3d_x: 0.0,
                gaze_3d_y: 0.0,
                gaze_3d_z: 0.0,
                eye_left_3d_x: 0.0,
                eye_left_3d_y: 0.0,
                eye_left_3d_z: 0.0,
                eye_right_3d_x: 0.0,
                eye_right_3d_y: 0.0,
                eye_right_3d_z: 0.0,
                world_timestamp_unix: sample.world_timestamp_unix,
                world_frame_index: sample.world_frame_index,
                fixation_id: None,
                is_fixation: u8::from(sample.is_fixation),
                is_blink: u8::from(sample.is_blink),
                is_saccade: u8::from(sample.is_saccade),
                gaze_timestamp_unix: now_unix,
                gaze_timestamp_diff: 0.0,
                norm_pos_x: sample.norm_pos_x,
                norm_pos_y: sample.norm_pos_y,
            };
            writer.push(row);
            tokio::time::sleep(Duration::from_millis(20)).await; // ~50 Hz
        }
    })
}

fn spawn_imu_loop(
    source: Arc<dyn ImuSource>,
    writer: SidecarHandle<ImuRow>,
    trial_number: u32,
    trial_label: String,
    started_at: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let sample = source.next_sample().await;
            let row = ImuRow {
                prefix: StandardPrefix {
                    trial: trial_number,
                    module: "EyeTracker".to_string(),
                    device_id: "eyetracker-0".to_string(),
                    label: trial_label.clone(),
                    record_time_unix: daq_core::SystemClock.unix_time().as_secs_f64(),
                    record_time_mono: started_at.elapsed().as_secs_f64(),
                },
                accel_x: sample.accel.0,
                accel_y: sample.accel.1,
                accel_z: sample.accel.2,
                gyro_x: sample.gyro.0,
                gyro_y: sample.gyro.1,
                gyro_z: sample.gyro.2,
                mag_x: sample.mag.0,
                mag_y: sample.mag.1,
                mag_z: sample.mag.2,
                quat_w: sample.quat.0,
                quat_x: sample.quat.1,
                quat_y: sample.quat.2,
                quat_z: sample.quat.3,
            };
            writer.push(row);
            tokio::time::sleep(Duration::from_millis(5)).await; // ~200 Hz
        }
    })
}

fn spawn_event_loop(
    source: Arc<dyn EventSource>,
    writer: SidecarHandle<EyeTrackerEventRow>,
    trial_number: u32,
    trial_label: String,
    started_at: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = source.next_event().await;
            let row = EyeTrackerEventRow {
                prefix: StandardPrefix {
                    trial: trial_number,
                    module: "EyeTracker".to_string(),
                    device_id: "eyetracker-0".to_string(),
                    label: trial_label.clone(),
                    record_time_unix: daq_core::SystemClock.unix_time().as_secs_f64(),
                    record_time_mono: started_at.elapsed().as_secs_f64(),
                },
                event_type: event.event_type,
                event_label: String::new(),
                event_timestamp_unix: daq_core::SystemClock.unix_time().as_secs_f64(),
                event_timestamp_mono: started_at.elapsed().as_secs_f64(),
                duration_ms: event.duration_ms,
                trigger_source: "gaze".to_string(),
                marker_id: None,
                stimulus_id: None,
                response_code: None,
                confidence: event.confidence,
                screen_x: None,
                screen_y: None,
                aoi_id: None,
                aoi_label: String::new(),
                session_phase: "trial".to_string(),
                block_number: trial_number,
                repetition_number: 1,
                notes: String::new(),
            };
            writer.push(row);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SyntheticEventSource, SyntheticGazeSource, SyntheticImuSource};
    use daq_core::ConfigFile;
    use daq_protocol::StatusWriter;

    fn test_system() -> System {
        System::new(ConfigFile::default(), StatusWriter::new(Vec::new()))
    }

    fn test_module(dir: &std::path::Path) -> EyeTrackerModule {
        EyeTrackerModule::new(
            Arc::new(SyntheticGazeSource::new()),
            Arc::new(SyntheticImuSource::new()),
            Arc::new(SyntheticEventSource::new()),
            dir.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn start_recording_creates_three_sidecar_files() {
        let dir = tempfile::tempdir().unwrap();
        let module = test_module(dir.path());
        let sys = test_system();
        let cmd = daq_protocol::command!("start_recording", "trial_number" => 1u64, "trial_label" => "baseline");

        module.start_recording(&sys, &cmd).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let result = module.stop_if_recording().await.unwrap().unwrap();

        for key in ["gaze_file", "imu_file", "event_file"] {
            let path = PathBuf::from(result[key].as_str().unwrap());
            assert!(path.exists(), "{key} should exist at {}", path.display());
        }
    }

    #[tokio::test]
    async fn double_start_recording_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let module = test_module(dir.path());
        let sys = test_system();
        let cmd = daq_protocol::command!("start_recording", "trial_number" => 1u64, "trial_label" => "baseline");

        module.start_recording(&sys, &cmd).await.unwrap();
        let err = module.start_recording(&sys, &cmd).await.unwrap_err();
        assert!(err.to_string().contains("already recording"));
        module.stop_if_recording().await;
    }

    #[tokio::test]
    async fn status_snapshot_reports_not_recording_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let module = test_module(dir.path());
        let sys = test_system();
        let snapshot = module.status_snapshot(&sys).await;
        assert_eq!(snapshot["recording"], json!(false));
    }
}
