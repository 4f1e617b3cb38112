// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! GPS module command handlers: polls an [`crate::source::NmeaSource`] at a
//! fixed rate and appends one CSV row per fix, rather than wiring a
//! [`daq_module_runtime::RecordingPipeline`] — there is no media frame to
//! write, just a steady trickle of parsed fixes, so a plain interval loop
//! plus a buffered CSV writer is the whole pipeline this module needs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use daq_core::Clock;
use daq_module_runtime::{ModuleHandlers, RuntimeError, System};
use daq_protocol::csv_schema::{GpsRow, StandardPrefix};
use daq_protocol::Command;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::source::NmeaSource;

/// How often the synthetic/serial source is polled for a new fix.
const FIX_HZ: f64 = 1.0;

struct RunningRecording {
    capture_task: JoinHandle<()>,
    csv_path: PathBuf,
}

pub struct GpsModule {
    source: Arc<dyn NmeaSource>,
    output_dir: PathBuf,
    started_at: Instant,
    running: parking_lot::Mutex<Option<RunningRecording>>,
}

impl GpsModule {
    pub fn new(source: Arc<dyn NmeaSource>, output_dir: PathBuf) -> Self {
        Self { source, output_dir, started_at: Instant::now(), running: parking_lot::Mutex::new(None) }
    }

    fn output_root(&self, sys: &System) -> PathBuf {
        sys.session_dir().unwrap_or_else(|| self.output_dir.clone()).join("Gps")
    }

    /// Stop any in-flight recording and flush its CSV. Called both from
    /// `stop_recording` and as part of shutdown cleanup.
    pub async fn stop_if_recording(&self) -> Option<Result<Value, RuntimeError>> {
        let running = self.running.lock().take()?;
        running.capture_task.abort();
        Some(Ok(json!({"file": running.csv_path})))
    }
}

#[async_trait::async_trait]
impl ModuleHandlers for GpsModule {
    async fn start_recording(&self, sys: &System, cmd: &Command) -> Result<Value, RuntimeError> {
        if self.running.lock().is_some() {
            return Err(RuntimeError::Other("already recording".to_string()));
        }

        let dir = self.output_root(sys);
        std::fs::create_dir_all(&dir).map_err(RuntimeError::Io)?;

        let trial_number = cmd.get_u64("trial_number").unwrap_or(0) as u32;
        let trial_label = cmd.get_str("trial_label").unwrap_or("recording").to_string();
        let csv_path = dir.join(format!("trial_{trial_number:04}_{trial_label}.csv"));

        let mut writer = csv::Writer::from_path(&csv_path)
            .map_err(|e| RuntimeError::Other(format!("creating GPS CSV {}: {e}", csv_path.display())))?;

        let source = Arc::clone(&self.source);
        let label = trial_label;
        let started_at = self.started_at;
        let capture_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / FIX_HZ));
            loop {
                ticker.tick().await;
                let fix = source.next_fix().await;
                let record_time_unix = daq_core::SystemClock.unix_time().as_secs_f64();
                let record_time_mono = started_at.elapsed().as_secs_f64();
                let row = GpsRow {
                    prefix: StandardPrefix {
                        trial: trial_number,
                        module: "Gps".to_string(),
                        device_id: "gps-0".to_string(),
                        label: label.clone(),
                        record_time_unix,
                        record_time_mono,
                    },
                    latitude_deg: fix.latitude_deg,
                    longitude_deg: fix.longitude_deg,
                    altitude_m: fix.altitude_m,
                    speed_knots: 0.0,
                    course_deg: 0.0,
                    fix_valid: if fix.fix_valid { 1 } else { 0 },
                    fix_quality: fix.fix_quality,
                    num_satellites: fix.num_satellites,
                    hdop: fix.hdop,
                    vdop: 0.0,
                    pdop: 0.0,
                    geoid_separation_m: fix.geoid_separation_m,
                    utc_time: fix.utc_time,
                    utc_date: String::new(),
                    mode_2d3d: if fix.fix_valid { 3 } else { 1 },
                    dgps_age_s: None,
                    dgps_station_id: None,
                    magnetic_variation_deg: None,
                    true_track_deg: None,
                    nmea_sentence: fix.nmea_sentence,
                };
                if writer.serialize(&row).is_err() || writer.flush().is_err() {
                    tracing::warn!("failed writing GPS CSV row, continuing");
                }
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
            "fix_rate_hz": FIX_HZ,
        })
    }
}
