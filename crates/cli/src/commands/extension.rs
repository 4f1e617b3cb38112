// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Per-module extension query: `daqctl extension <family> <key>`.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

pub async fn query(client: &DaemonClient, family: &str, key: &str, format: OutputFormat) -> Result<()> {
    let result = client.extension_query(family, key).await?;
    print_value(format, &result, |v| {
        if v["available"].as_bool().unwrap_or(false) {
            println!("{family}/{key}: {}", v["data"]);
        } else {
            println!("{family}/{key}: unavailable ({})", v["reason"].as_str().unwrap_or("unknown"));
        }
    })
}
