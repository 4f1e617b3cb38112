// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Wall-clock ISO-8601 stamping shared by command and status messages.

/// Local time in ISO-8601, matching Python's `datetime.now().isoformat()`
/// (no trailing `Z`, naive local time) which the original system used.
pub fn now_iso8601() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
