// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Session command handlers: `daqctl session start|stop|show`.

use std::path::PathBuf;

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

pub async fn start(client: &DaemonClient, session_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let session = client.start_session(session_dir).await?;
    print_value(format, &session, |v| {
        println!("session started: {}", v["session_label"].as_str().unwrap_or("?"));
    })
}

pub async fn stop(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let result = client.stop_session().await?;
    print_value(format, &result, |_| println!("session stopped"))
}

pub async fn show(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let session = client.get_session().await?;
    print_value(format, &session, |v| {
        if !v["active"].as_bool().unwrap_or(false) {
            println!("no active session");
            return;
        }
        println!("session: {}", v["session_label"].as_str().unwrap_or("?"));
        println!("  dir: {}", v["session_dir"].as_str().unwrap_or("?"));
        println!("  trial counter: {}", v["trial_counter"].as_u64().unwrap_or(0));
        println!("  trial active: {}", v["trial_active"].as_bool().unwrap_or(false));
    })
}
