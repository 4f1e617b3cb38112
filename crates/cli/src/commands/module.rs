// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Module command handlers: `daqctl module list|show|start|stop`.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

pub async fn list(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let result = client.list_modules().await?;
    print_value(format, &result, |v| {
        for module in v["modules"].as_array().cloned().unwrap_or_default() {
            println!("{}: {}", module["name"].as_str().unwrap_or("?"), module["state"].as_str().unwrap_or("?"));
        }
    })
}

pub async fn show(client: &DaemonClient, name: &str, format: OutputFormat) -> Result<()> {
    let result = client.module_detail(name).await?;
    print_value(format, &result, |v| {
        println!("{}: {}", v["name"].as_str().unwrap_or(name), v["state"].as_str().unwrap_or("?"));
    })
}

pub async fn start(client: &DaemonClient, name: &str, format: OutputFormat) -> Result<()> {
    let result = client.start_module(name).await?;
    print_value(format, &result, |v| println!("{} started: {}", name, v["state"].as_str().unwrap_or("?")))
}

pub async fn stop(client: &DaemonClient, name: &str, format: OutputFormat) -> Result<()> {
    let result = client.stop_module(name).await?;
    print_value(format, &result, |v| println!("{} stopped: {}", name, v["state"].as_str().unwrap_or("?")))
}

pub async fn instances(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let result = client.list_instances().await?;
    print_value(format, &result, |v| {
        for instance in v["instances"].as_array().cloned().unwrap_or_default() {
            println!("{}: {}", instance["module_name"].as_str().unwrap_or("?"), instance["state"].as_str().unwrap_or("?"));
        }
    })
}
