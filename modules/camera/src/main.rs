// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! `daq-camera`: the USB/CSI camera capture module child process.

mod handlers;
mod sink;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use daq_core::ConfigFile;
use daq_module_runtime::{run_headless, run_slave, System};
use daq_protocol::status::well_known;
use daq_protocol::StatusWriter;

use handlers::CameraModule;
use source::SyntheticFrameSource;

#[derive(Debug, Parser)]
#[command(name = "daq-camera", about = "Camera capture module")]
struct Cli {
    #[arg(long)]
    config: PathBuf,

    #[arg(long = "session-dir")]
    session_dir: Option<PathBuf>,

    /// Initial `WxH+X+Y` preview window geometry, if the launching
    /// orchestrator already has one cached for this module.
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
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "daq_camera=info".into()))
        .init();

    let config = ConfigFile::load(&cli.config)?;
    let status = StatusWriter::stdout();
    let sys = System::new(config.clone(), status.clone());
    if let Some(dir) = cli.session_dir {
        sys.set_session_dir(dir);
    }
    if let Some(raw) = cli.geometry.as_deref().and_then(daq_core::WindowGeometry::parse) {
        sys.set_window_geometry(raw);
    }

    let width = config.get_int("width", 1280i64) as u32;
    let height = config.get_int("height", 720i64) as u32;
    let fps = config.get_f64("fps", 30.0);
    let output_dir = PathBuf::from(config.get_str("output_dir", "."));
    let auto_start_recording = config.get_bool("auto_start_recording", false);

    let source = Arc::new(SyntheticFrameSource::new(width, height));
    let module = CameraModule::new(source, fps, output_dir);

    status.send(well_known::INITIALIZED, serde_json::json!({"devices": 1, "width": width, "height": height, "fps": fps}))?;

    match cli.mode.as_str() {
        "headless" => run_headless(&module, &sys, auto_start_recording).await,
        _ => run_slave(&module, &sys).await,
    }

    // Cleanup runs regardless of how the shutdown was triggered.
    let _ = module.stop_if_recording().await;

    Ok(())
}
