// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Camera module command handlers: wires a [`crate::source::FrameSource`]
//! into a [`RecordingPipeline`] and a [`crate::sink::Mp4FrameSink`], plus
//! `take_snapshot` and the `toggle_preview` custom command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use daq_core::Clock;
use daq_module_runtime::{CapturedFrame, ModuleHandlers, PipelineConfig, RecordingPipeline, RuntimeError, System};
use daq_protocol::Command;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::sink::{write_ppm_snapshot, Mp4FrameSink};
use crate::source::FrameSource;

struct RunningRecording {
    pipeline: RecordingPipeline<Vec<u8>>,
    capture_task: JoinHandle<()>,
    mp4_path: PathBuf,
}

pub struct CameraModule {
    source: Arc<dyn FrameSource>,
    fps: f64,
    output_dir: PathBuf,
    preview_enabled: std::sync::atomic::AtomicBool,
    running: parking_lot::Mutex<Option<RunningRecording>>,
}

impl CameraModule {
    pub fn new(source: Arc<dyn FrameSource>, fps: f64, output_dir: PathBuf) -> Self {
        Self {
            source,
            fps,
            output_dir,
            preview_enabled: std::sync::atomic::AtomicBool::new(false),
            running: parking_lot::Mutex::new(None),
        }
    }

    fn output_root(&self, sys: &System) -> PathBuf {
        sys.session_dir().unwrap_or_else(|| self.output_dir.clone()).join("Camera")
    }

    /// Flush and close any in-flight recording. Called both from
    /// `stop_recording` and as part of shutdown cleanup.
    pub async fn stop_if_recording(&self) -> Option<Result<Value, RuntimeError>> {
        let running = self.running.lock().take()?;
        running.capture_task.abort();
        let RunningRecording { mut pipeline, mp4_path, .. } = running;
        Some(pipeline.stop().await.map(|_| json!({"file": mp4_path})))
    }
}

#[async_trait::async_trait]
impl ModuleHandlers for CameraModule {
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        if self.running.lock().is_some() {
            return Err(RuntimeError::Other("already recording".to_string()));
        }

        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;

        let trial_number = cmd.get_u64("trial_number").unwrap_or(0);
        let trial_label = cmd.get_str("trial_label").unwrap_or("recording");
        let mp4_path = dir.join(format!("trial_{trial_number:04}_{trial_label}.mp4"));
        let timing_csv_path = dir.join(format!("trial_{trial_number:04}_{trial_label}_timing.csv"));

        let sink = Mp4FrameSink::create(&mp4_path, self.source.width(), self.source.height(), self.fps)?;

        let config = PipelineConfig { fps: self.fps, timing_csv_path };
        let mut pipeline: RecordingPipeline<Vec<u8>> = RecordingPipeline::new(&config);
        let slot = pipeline.slot();
        let source = Arc::clone(&self.source);
        let fps = self.fps;

        let capture_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps));
            let mut frame_index: u64 = 0;
            loop {
                ticker.tick().await;
                let pixels = source.read_frame().await;
                slot.store(CapturedFrame {
                    payload: Arc::new(pixels),
                    capture_monotonic: Instant::now(),
                    capture_unix: daq_core::SystemClock.unix_time(),
                    camera_frame_index: Some(frame_index),
                    available_camera_fps: fps,
                });
                frame_index += 1;
            }
        });

        pipeline.start(Box::new(sink), daq_core::SystemClock);
        self.running.lock().replace(RunningRecording { pipeline, capture_task, mp4_path: mp4_path.clone() });

        Ok(json!({"file": mp4_path, "width": self.source.width(), "height": self.source.height(), "fps": self.fps}))
    }

    async fn stop_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
        match self.stop_if_recording().await {
            Some(result) => result,
            None => Err(RuntimeError::Other("not recording".to_string())),
        }
    }

    async fn status_snapshot(&self, _sys: &System) -> Value {
        json!({
            "width": self.source.width(),
            "height": self.source.height(),
            "fps": self.fps,
            "recording": self.running.lock().is_some(),
            "preview_enabled": self.preview_enabled.load(std::sync::atomic::Ordering::SeqCst),
        })
    }

    async fn take_snapshot(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;
        let save_path = cmd
            .get_str("save_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| dir.join(format!("snapshot_{}.ppm", daq_core::SystemClock.unix_time().as_millis())));

        let pixels = self.source.read_frame().await;
        write_ppm_snapshot(&save_path, self.source.width(), self.source.height(), &pixels)?;
        Ok(json!({"file": save_path}))
    }

    async fn custom_command(&self, sys: &System, cmd: &Command) -> Result<Option<Value>, RuntimeError> {
        match cmd.name.as_str() {
            "toggle_preview" => {
                let enabled = cmd.get_bool("enabled").unwrap_or(true);
                self.preview_enabled.store(enabled, std::sync::atomic::Ordering::SeqCst);
                let camera_id = cmd.get_str("camera_id").unwrap_or("cameras-0");
                let _ = sys.status.send("preview_toggled", json!({"camera_id": camera_id, "enabled": enabled}));
                Ok(Some(Value::Null))
            }
            _ => Ok(None),
        }
    }
}
