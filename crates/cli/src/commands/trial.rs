// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Trial command handlers: `daqctl trial start|stop|status`.
//!
//! `start`/`stop` print the per-module acknowledgement breakdown so a
//! caller can tell a best-effort partial success, where the response's
//! `success` field is `true` iff *all* modules acknowledged, from a clean
//! all-modules-acknowledged trial.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{print_value, OutputFormat};

fn print_outcome(v: &serde_json::Value) {
    let success = v["success"].as_bool().unwrap_or(false);
    println!("trial {}: {}", if success { "succeeded" } else { "partial" }, v["trial_label"].as_str().unwrap_or("?"));
    for name in v["acknowledged"].as_array().cloned().unwrap_or_default() {
        println!("  ✓ {}", name.as_str().unwrap_or("?"));
    }
    for entry in v["failed"].as_array().cloned().unwrap_or_default() {
        let pair = entry.as_array().cloned().unwrap_or_default();
        let name = pair.first().and_then(|v| v.as_str()).unwrap_or("?");
        let reason = pair.get(1).and_then(|v| v.as_str()).unwrap_or("unknown");
        println!("  ✗ {name}: {reason}");
    }
}

pub async fn start(client: &DaemonClient, trial_label: Option<String>, format: OutputFormat) -> Result<()> {
    let outcome = client.start_trial(trial_label).await?;
    print_value(format, &outcome, print_outcome)
}

pub async fn stop(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let outcome = client.stop_trial().await?;
    print_value(format, &outcome, print_outcome)
}

pub async fn status(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let status = client.trial_status().await?;
    print_value(format, &status, |v| {
        println!("trial counter: {}", v["trial_counter"].as_u64().unwrap_or(0));
        println!("trial active: {}", v["trial_active"].as_bool().unwrap_or(false));
        if let Some(label) = v["trial_label"].as_str() {
            println!("trial label: {label}");
        }
    })
}
