// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Log command handlers: `daqctl logs paths|master|module|tail`.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

pub async fn paths(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let result = client.logs_paths().await?;
    print_value(format, &result, |v| {
        println!("log dir: {}", v["log_dir"].as_str().unwrap_or("?"));
        println!("master: {}", v["master"].as_str().unwrap_or("?"));
        for module in v["modules"].as_array().cloned().unwrap_or_default() {
            println!("  {}", module.as_str().unwrap_or("?"));
        }
    })
}

pub async fn master(client: &DaemonClient) -> Result<()> {
    print!("{}", client.logs_master().await?);
    Ok(())
}

pub async fn module(client: &DaemonClient, name: &str) -> Result<()> {
    print!("{}", client.logs_module(name).await?);
    Ok(())
}

pub async fn tail(client: &DaemonClient, path: &str) -> Result<()> {
    print!("{}", client.logs_tail(path).await?);
    Ok(())
}
