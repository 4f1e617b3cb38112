// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Response-time (DRT) module command handlers: polls a
//! [`crate::source::StimulusSource`] at a fixed presentation rate and
//! appends one CSV row per trial, wired or wireless variant depending on
//! [`StimulusSource::battery_percent`]. No [`daq_module_runtime::RecordingPipeline`]
//! here, same reasoning as the GPS module: a steady trickle of discrete
//! events, not a framed media stream.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use daq_core::Clock;
use daq_module_runtime::{ModuleHandlers, RuntimeError, System};
use daq_protocol::csv_schema::{ResponseTimeRow, ResponseTimeWirelessRow, StandardPrefix};
use daq_protocol::Command;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::source::StimulusSource;

/// Stimuli presented per second.
const STIMULUS_HZ: f64 = 0.5;

struct RunningRecording {
    capture_task: JoinHandle<()>,
    csv_path: PathBuf,
}

pub struct DrtModule {
    source: Arc<dyn StimulusSource>,
    output_dir: PathBuf,
    started_at: Instant,
    device_enabled: std::sync::atomic::AtomicBool,
    running: parking_lot::Mutex<Option<RunningRecording>>,
}

impl DrtModule {
    pub fn new(source: Arc<dyn StimulusSource>, output_dir: PathBuf) -> Self {
        Self {
            source,
            output_dir,
            started_at: Instant::now(),
            device_enabled: std::sync::atomic::AtomicBool::new(true),
            running: parking_lot::Mutex::new(None),
        }
    }

    fn output_root(&self, sys: &System) -> PathBuf {
        sys.session_dir().unwrap_or_else(|| self.output_dir.clone()).join("Drt")
    }

    pub async fn stop_if_recording(&self) -> Option<Result<Value, RuntimeError>> {
        let running = self.running.lock().take()?;
        running.capture_task.abort();
        Some(Ok(json!({"file": running.csv_path})))
    }
}

#[async_trait::async_trait]
impl ModuleHandlers for DrtModule {
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        if self.running.lock().is_some() {
            return Err(RuntimeError::Other("already recording".to_string()));
        }

        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;

        let trial_number = cmd.get_u64("trial_number").unwrap_or(0) as u32;
        let trial_label = cmd.get_str("trial_label").unwrap_or("recording").to_string();
        let csv_path = dir.join(format!("trial_{trial_number:04}_{trial_label}.csv"));

        let wireless = self.source.battery_percent().is_some();
        let source = Arc::clone(&self.source);
        let label = trial_label;
        let started_at = self.started_at;
        let csv_path_clone = csv_path.clone();

        let capture_task = tokio::spawn(async move {
            let write_result = if wireless {
                write_loop::<ResponseTimeWirelessRow>(source, &csv_path_clone, trial_number, label, started_at).await
            } else {
                write_loop::<ResponseTimeRow>(source, &csv_path_clone, trial_number, label, started_at).await
            };
            if let Err(e) = write_result {
                tracing::warn!(error = %e, "DRT capture loop ended with error");
            }
        });

        self.running.lock().replace(RunningRecording { capture_task, csv_path: csv_path.clone() });
        Ok(json!({"file": csv_path}))
    }

    async fn stop_recording(&self, _sys: &System, _cmd: &Command) -> Result<Value, RuntimeError> {
        match self.stop_if_recording().await {
            Some(result) => result,
            None => Err(RuntimeError::Other("not recording".to_string())),
        }
    }

    async fn status_snapshot(&self, _sys: &System) -> Value {
        json!({
            "recording": self.running.lock().is_some(),
            "device_enabled": self.device_enabled.load(std::sync::atomic::Ordering::SeqCst),
            "battery_percent": self.source.battery_percent(),
        })
    }

    async fn custom_command(&self, sys: &System, cmd: &Command) -> Result<Option<Value>, RuntimeError> {
        match cmd.name.as_str() {
            "toggle_device" => {
                let enabled = cmd.get_bool("enabled").unwrap_or(true);
                self.device_enabled.store(enabled, std::sync::atomic::Ordering::SeqCst);
                let device_id = cmd.get_str("device_id").unwrap_or("drt-0");
                let _ = sys.status.send("device_toggled", json!({"device_id": device_id, "enabled": enabled}));
                Ok(Some(Value::Null))
            }
            _ => Ok(None),
        }
    }
}

async fn write_loop<R>(
    source: Arc<dyn StimulusSource>,
    csv_path: &std::path::Path,
    trial_number: u32,
    trial_label: String,
    started_at: Instant,
) -> Result<(), RuntimeError>
where
    R: RowBuilder + serde::Serialize,
{
    let mut writer = csv::Writer::from_path(csv_path)
        .map_err(|e| RuntimeError::Other(format!("creating DRT CSV {}: {e}", csv_path.display())))?;
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / STIMULUS_HZ));
    loop {
        ticker.tick().await;
        let response = source.present_and_wait().await;
        let record_time_unix = daq_core::SystemClock.unix_time().as_secs_f64();
        let record_time_mono = started_at.elapsed().as_secs_f64();
        let prefix = StandardPrefix {
            trial: trial_number,
            module: "Drt".to_string(),
            device_id: "drt-0".to_string(),
            label: trial_label.clone(),
            record_time_unix,
            record_time_mono,
        };
        let row = R::build(prefix, record_time_unix, &response);
        if writer.serialize(&row).is_err() || writer.flush().is_err() {
            tracing::warn!("failed writing DRT CSV row, continuing");
        }
    }
}

trait RowBuilder {
    fn build(prefix: StandardPrefix, stimulus_onset_unix: f64, response: &crate::source::StimulusResponse) -> Self;
}

impl RowBuilder for ResponseTimeRow {
    fn build(prefix: StandardPrefix, stimulus_onset_unix: f64, response: &crate::source::StimulusResponse) -> Self {
        ResponseTimeRow {
            prefix,
            stimulus_onset_unix,
            reaction_time_ms: response.reaction_time_ms,
            button_pressed: response.button_pressed as u8,
            timeout: response.timeout as u8,
        }
    }
}

impl RowBuilder for ResponseTimeWirelessRow {
    fn build(prefix: StandardPrefix, stimulus_onset_unix: f64, response: &crate::source::StimulusResponse) -> Self {
        ResponseTimeWirelessRow {
            prefix,
            stimulus_onset_unix,
            reaction_time_ms: response.reaction_time_ms,
            button_pressed: response.button_pressed as u8,
            timeout: response.timeout as u8,
            battery_percent: response.battery_percent.unwrap_or(0),
        }
    }
}
