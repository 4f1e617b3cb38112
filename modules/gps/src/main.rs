// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! `daq-gps`: the GPS/NMEA capture module child process.

mod handlers;
mod parse;
mod source;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use daq_core::ConfigFile;
use daq_module_runtime::{run_headless, run_slave, Runtime, RuntimeError, Supervisor, System};
use daq_protocol::status::well_known;
use daq_protocol::StatusWriter;

use handlers::GpsModule;
use source::SyntheticNmeaSource;

/// Wraps source acquisition and mode dispatch so [`Supervisor`] can retry
/// the whole sequence on an `Initialization` error (no device yet). The
/// synthetic source shipped here never fails to construct, but a
/// hardware-backed `NmeaSource` would be the one to raise it.
struct GpsRuntime {
    module: GpsModule,
    sys: System,
    status: StatusWriter,
    mode: String,
    devices: usize,
    auto_start_recording: bool,
}

#[async_trait::async_trait]
impl Runtime for GpsRuntime {
    async fn run(&self) -> Result<(), RuntimeError> {
        self.status.send(well_known::INITIALIZED, serde_json::json!({"devices": self.devices}))?;
        match self.mode.as_str() {
            "headless" => run_headless(&self.module, &self.sys, self.auto_start_recording).await,
            _ => run_slave(&self.module, &self.sys).await,
        }
        Ok(())
    }

    async fn cleanup(&self) {
        let _ = self.module.stop_if_recording().await;
    }
}

#[derive(Debug, Parser)]
#[command(name = "daq-gps", about = "GPS capture module")]
struct Cli {
    #[arg(long)]
    config: PathBuf,

    #[arg(long = "session-dir")]
    session_dir: Option<PathBuf>,

    /// Accepted for interface parity with GUI-capable modules; GPS has no
    /// window of its own.
    #[arg(long)]
    geometry: Option<String>,

    #[arg(long, default_value = "slave")]
    mode: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Free-form logs go to stderr; stdout is reserved for the status
    // protocol the parent orchestrator reads.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "daq_gps=info".into()))
        .init();

    let config = ConfigFile::load(&cli.config)?;
    let status = StatusWriter::stdout();
    let sys = System::new(config.clone(), status.clone());
    if let Some(dir) = cli.session_dir {
        sys.set_session_dir(dir);
    }

    let output_dir = PathBuf::from(config.get_str("output_dir", "."));
    let auto_start_recording = config.get_bool("auto_start_recording", false);
    let origin_lat = config.get_f64("origin_lat", 45.0);
    let origin_lon = config.get_f64("origin_lon", -122.0);

    let source = Arc::new(SyntheticNmeaSource::new(origin_lat, origin_lon));
    let module = GpsModule::new(source, output_dir);
    let retry_interval = Duration::from_millis(config.get_int("discovery_retry_interval_ms", 2000i64) as u64);

    let runtime = GpsRuntime { module, sys, status, mode: cli.mode, devices: 1, auto_start_recording };
    let supervisor = Supervisor::new(retry_interval);
    supervisor.run(&runtime, &runtime.sys.shutdown).await;

    Ok(())
}
