// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Goggles (VOG) module command handlers: polls a
//! [`crate::source::LensSource`] and appends one CSV row per lens-state
//! transition, wired or wireless variant depending on
//! [`LensSource::battery_percent`]. `switch_lens` is only meaningful on a
//! wireless device; on a wired device it fails with `400
//! NOT_WIRELESS_DEVICE`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use daq_core::Clock;
use daq_module_runtime::{ModuleHandlers, RuntimeError, System};
use daq_protocol::csv_schema::{GogglesRow, GogglesWirelessRow, StandardPrefix};
use daq_protocol::Command;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::source::LensSource;

struct RunningRecording {
    capture_task: JoinHandle<()>,
    csv_path: PathBuf,
}

pub struct VogModule {
    source: Arc<dyn LensSource>,
    output_dir: PathBuf,
    started_at: Instant,
    running: parking_lot::Mutex<Option<RunningRecording>>,
}

impl VogModule {
    pub fn new(source: Arc<dyn LensSource>, output_dir: PathBuf) -> Self {
        Self { source, output_dir, started_at: Instant::now(), running: parking_lot::Mutex::new(None) }
    }

    fn output_root(&self, sys: &System) -> PathBuf {
        sys.session_dir().unwrap_or_else(|| self.output_dir.clone()).join("Vog")
    }

    fn is_wireless(&self) -> bool {
        self.source.battery_percent().is_some()
    }

    pub async fn stop_if_recording(&self) -> Option<Result<Value, RuntimeError>> {
        let running = self.running.lock().take()?;
        running.capture_task.abort();
        Some(Ok(json!({"file": running.csv_path})))
    }
}

#[async_trait::async_trait]
impl ModuleHandlers for VogModule {
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        if self.running.lock().is_some() {
            return Err(RuntimeError::Other("already recording".to_string()));
        }

        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;

        let trial_number = cmd.get_u64("trial_number").unwrap_or(0) as u32;
        let trial_label = cmd.get_str("trial_label").unwrap_or("recording").to_string();
        let csv_path = dir.join(format!("trial_{trial_number:04}_{trial_label}.csv"));

        let wireless = self.is_wireless();
        let source = Arc::clone(&self.source);
        let label = trial_label;
        let started_at = self.started_at;
        let csv_path_clone = csv_path.clone();

        let capture_task = tokio::spawn(async move {
            let write_result = if wireless {
                write_loop_wireless(source, &csv_path_clone, trial_number, label, started_at).await
            } else {
                write_loop_simple(source, &csv_path_clone, trial_number, label, started_at).await
            };
            if let Err(e) = write_result {
                tracing::warn!(error = %e, "VOG capture loop ended with error");
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
            "wireless": self.is_wireless(),
            "battery_percent": self.source.battery_percent(),
        })
    }

    async fn custom_command(&self, sys: &System, cmd: &Command) -> Result<Option<Value>, RuntimeError> {
        match cmd.name.as_str() {
            "switch_lens" => {
                if !self.is_wireless() {
                    return Err(RuntimeError::Other("NOT_WIRELESS_DEVICE: switch_lens requires a wireless goggles device".to_string()));
                }
                let lens = cmd.get_str("lens").unwrap_or("A").to_string();
                let _ = sys.status.send("lens_switched", json!({"lens": lens}));
                Ok(Some(Value::Null))
            }
            _ => Ok(None),
        }
    }
}

async fn write_loop_simple(
    source: Arc<dyn LensSource>,
    csv_path: &std::path::Path,
    trial_number: u32,
    trial_label: String,
    started_at: Instant,
) -> Result<(), RuntimeError> {
    let mut writer = csv::Writer::from_path(csv_path)
        .map_err(|e| RuntimeError::Other(format!("creating VOG CSV {}: {e}", csv_path.display())))?;
    loop {
        let event = source.next_event().await;
        let row = GogglesRow {
            prefix: StandardPrefix {
                trial: trial_number,
                module: "Vog".to_string(),
                device_id: "vog-0".to_string(),
                label: trial_label.clone(),
                record_time_unix: daq_core::SystemClock.unix_time().as_secs_f64(),
                record_time_mono: started_at.elapsed().as_secs_f64(),
            },
            lens_state: event.event_type.clone(),
            event_type: event.event_type,
        };
        if writer.serialize(&row).is_err() || writer.flush().is_err() {
            tracing::warn!("failed writing VOG CSV row, continuing");
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

async fn write_loop_wireless(
    source: Arc<dyn LensSource>,
    csv_path: &std::path::Path,
    trial_number: u32,
    trial_label: String,
    started_at: Instant,
) -> Result<(), RuntimeError> {
    let mut writer = csv::Writer::from_path(csv_path)
        .map_err(|e| RuntimeError::Other(format!("creating VOG CSV {}: {e}", csv_path.display())))?;
    loop {
        let event = source.next_event().await;
        let row = GogglesWirelessRow {
            prefix: StandardPrefix {
                trial: trial_number,
                module: "Vog".to_string(),
                device_id: "vog-0".to_string(),
                label: trial_label.clone(),
                record_time_unix: daq_core::SystemClock.unix_time().as_secs_f64(),
                record_time_mono: started_at.elapsed().as_secs_f64(),
            },
            lens: event.lens,
            event_type: event.event_type,
            battery_percent: event.battery_percent.unwrap_or(0),
            signal_strength: event.signal_strength.unwrap_or(0),
            firmware_version: event.firmware_version.unwrap_or_default(),
        };
        if writer.serialize(&row).is_err() || writer.flush().is_err() {
            tracing::warn!("failed writing VOG CSV row, continuing");
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}
