// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Audio module command handlers: wires a [`crate::source::AudioSource`]
//! into a [`RecordingPipeline`] and a [`crate::sink::WavFrameSink`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use daq_core::Clock;
use daq_module_runtime::{CapturedFrame, ModuleHandlers, PipelineConfig, RecordingPipeline, RuntimeError, System};
use daq_protocol::Command;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::sink::WavFrameSink;
use crate::source::AudioSource;

/// How many chunks per second the capture loop polls the source at. 50 Hz
/// (20 ms chunks) matches a typical level-meter refresh without producing
/// an unreasonable number of tiny WAV writes.
const CHUNK_HZ: f64 = 50.0;

struct RunningRecording {
    pipeline: RecordingPipeline<Vec<i16>>,
    capture_task: JoinHandle<()>,
    wav_path: PathBuf,
}

pub struct AudioModule {
    source: Arc<dyn AudioSource>,
    output_dir: PathBuf,
    toggles: parking_lot::Mutex<HashMap<String, bool>>,
    running: parking_lot::Mutex<Option<RunningRecording>>,
}

impl AudioModule {
    pub fn new(source: Arc<dyn AudioSource>, output_dir: PathBuf) -> Self {
        Self { source, output_dir, toggles: parking_lot::Mutex::new(HashMap::new()), running: parking_lot::Mutex::new(None) }
    }

    fn output_root(&self, sys: &System) -> PathBuf {
        sys.session_dir().unwrap_or_else(|| self.output_dir.clone()).join("Audio")
    }

    /// Flush and close any in-flight recording. Called both from
    /// `stop_recording` and as part of shutdown cleanup so a `quit` while
    /// recording still leaves a finalised WAV file behind.
    pub async fn stop_if_recording(&self) -> Option<Result<Value, RuntimeError>> {
        let running = self.running.lock().take()?;
        running.capture_task.abort();
        let RunningRecording { mut pipeline, wav_path, .. } = running;
        Some(pipeline.stop().await.map(|_| json!({"file": wav_path})))
    }
}

#[async_trait::async_trait]
impl ModuleHandlers for AudioModule {
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        if self.running.lock().is_some() {
            return Err(RuntimeError::Other("already recording".to_string()));
        }

        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;

        let trial_number = cmd.get_u64("trial_number").unwrap_or(0);
        let trial_label = cmd.get_str("trial_label").unwrap_or("recording");
        let wav_path = dir.join(format!("trial_{trial_number:04}_{trial_label}.wav"));
        let timing_csv_path = dir.join(format!("trial_{trial_number:04}_{trial_label}_timing.csv"));

        let sink = WavFrameSink::create(&wav_path, self.source.sample_rate())?;

        let config = PipelineConfig { fps: CHUNK_HZ, timing_csv_path };
        let mut pipeline: RecordingPipeline<Vec<i16>> = RecordingPipeline::new(&config);
        let slot = pipeline.slot();
        let source = Arc::clone(&self.source);

        let capture_task = tokio::spawn(async move {
            let chunk_frames = (source.sample_rate() as f64 / CHUNK_HZ).round() as usize;
            let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / CHUNK_HZ));
            loop {
                ticker.tick().await;
                let samples = source.read_chunk(chunk_frames.max(1)).await;
                slot.store(CapturedFrame {
                    payload: Arc::new(samples),
                    capture_monotonic: Instant::now(),
                    capture_unix: daq_core::SystemClock.unix_time(),
                    camera_frame_index: None,
                    available_camera_fps: CHUNK_HZ,
                });
            }
        });

        pipeline.start(Box::new(sink), daq_core::SystemClock);
        *self.running.lock() = Some(RunningRecording { pipeline, capture_task, wav_path: wav_path.clone() });

        Ok(json!({"file": wav_path, "sample_rate": self.source.sample_rate()}))
    }

    async fn stop_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
        match self.stop_if_recording().await {
            Some(result) => result,
            None => Err(RuntimeError::Other("not recording".to_string())),
        }
    }

    async fn status_snapshot(&self, _sys: &System) -> Value {
        json!({
            "sample_rate": self.source.sample_rate(),
            "recording": self.running.lock().is_some(),
            "toggled_devices": self.toggles.lock().clone(),
        })
    }

    async fn custom_command(&self, sys: &System, cmd: &Command) -> Result<Option<Value>, RuntimeError> {
        match cmd.name.as_str() {
            "toggle_device" => {
                let device_id = cmd.get_str("device_id").ok_or_else(|| RuntimeError::Other("missing device_id".to_string()))?;
                let enabled = cmd.get_bool("enabled").unwrap_or(true);
                self.toggles.lock().insert(device_id.to_string(), enabled);
                let _ = sys.status.send("device_toggled", json!({"device_id": device_id, "enabled": enabled}));
                Ok(Some(Value::Null))
            }
            _ => Ok(None),
        }
    }
}
