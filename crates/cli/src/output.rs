// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

use clap::ValueEnum;
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a JSON value either pretty-printed or via a caller-supplied
/// text renderer, depending on `format`.
pub fn print_value(format: OutputFormat, value: &Value, text: impl FnOnce(&Value)) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}
