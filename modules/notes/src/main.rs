// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! `daq-notes`: the free-text operator-note capture module child process.

mod handlers;

use std::path::PathBuf;

use clap::Parser;
use daq_core::ConfigFile;
use daq_module_runtime::{run_headless, run_slave, System};
use daq_protocol::status::well_known;
use daq_protocol::StatusWriter;

use handlers::NotesModule;

#[derive(Debug, Parser)]
#[command(name = "daq-notes", about = "Operator notes capture module")]
struct Cli {
    #[arg(long)]
    config: PathBuf,

    #[arg(long = "session-dir")]
    session_dir: Option<PathBuf>,

    /// Accepted for interface parity with GUI-capable modules; Notes has
    /// no window of its own.
    #[arg(long)]
    geometry: Option<String>,

    #[arg(long, default_value = "slave")]
    mode: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "daq_notes=info".into()))
        .init();

    let config = ConfigFile::load(&cli.config)?;
    let status = StatusWriter::stdout();
    let sys = System::new(config.clone(), status.clone());
    if let Some(dir) = cli.session_dir {
        sys.set_session_dir(dir);
    }

    let output_dir = PathBuf::from(config.get_str("output_dir", "."));
    let auto_start_recording = config.get_bool("auto_start_recording", false);

    let module = NotesModule::new(output_dir);

    status.send(well_known::INITIALIZED, serde_json::json!({"devices": 0}))?;

    match cli.mode.as_str() {
        "headless" => run_headless(&module, &sys, auto_start_recording).await,
        _ => run_slave(&module, &sys).await,
    }

    let _ = module.stop_if_recording().await;

    Ok(())
}
