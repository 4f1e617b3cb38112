// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Device command handlers: `daqctl device list|connect|disconnect`.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

pub async fn list(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let result = client.list_devices().await?;
    print_value(format, &result, |v| {
        let devices = v["devices"].as_array().cloned().unwrap_or_default();
        if devices.is_empty() {
            println!("no devices discovered");
        }
        for device in &devices {
            println!(
                "{} [{}] {} connected={}",
                device["device_id"].as_str().unwrap_or("?"),
                device["module_id"].as_str().unwrap_or("?"),
                device["display_name"].as_str().unwrap_or("?"),
                device["connected"].as_bool().unwrap_or(false),
            );
        }
    })
}

pub async fn connect(client: &DaemonClient, id: &str, format: OutputFormat) -> Result<()> {
    let result = client.connect_device(id).await?;
    print_value(format, &result, |_| println!("{id} connected"))
}

pub async fn disconnect(client: &DaemonClient, id: &str, format: OutputFormat) -> Result<()> {
    let result = client.disconnect_device(id).await?;
    print_value(format, &result, |_| println!("{id} disconnected"))
}

pub async fn scanning_status(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let result = client.scanning_status().await?;
    print_value(format, &result, |v| println!("devices known: {}", v["device_count"].as_u64().unwrap_or(0)))
}
