// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Window arrangement command: `daqctl windows arrange <layout>`.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

pub async fn arrange(client: &DaemonClient, layout: &str, screen_width: u32, screen_height: u32, format: OutputFormat) -> Result<()> {
    let result = client.arrange_windows(layout, screen_width, screen_height).await?;
    print_value(format, &result, |v| {
        for entry in v["arranged"].as_array().cloned().unwrap_or_default() {
            let ok = entry["ok"].as_bool().unwrap_or(false);
            if ok {
                println!("  ✓ {}", entry["module"].as_str().unwrap_or("?"));
            } else {
                println!("  ✗ {}: {}", entry["module"].as_str().unwrap_or("?"), entry["error"].as_str().unwrap_or("unknown"));
            }
        }
    })
}
