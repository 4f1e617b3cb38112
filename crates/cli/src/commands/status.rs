// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Status command handler.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

pub async fn handle(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await?;
    print_value(format, &status, |v| {
        println!("uptime: {}s", v["uptime_seconds"].as_u64().unwrap_or(0));
        println!("session active: {}", v["session_active"].as_bool().unwrap_or(false));
        let modules = v["modules"].as_array().cloned().unwrap_or_default();
        if modules.is_empty() {
            println!("no modules registered");
        }
        for module in &modules {
            println!("  {}: {}", module["name"].as_str().unwrap_or("?"), module["state"].as_str().unwrap_or("?"));
        }
    })
}
