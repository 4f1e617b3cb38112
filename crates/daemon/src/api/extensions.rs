// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Per-module controller extensions: device-specific facades (gaze/IMU for
//! the eye tracker, battery/lens for goggles, NMEA dumps for GPS, audio
//! levels, camera snapshots, ...) loaded as a static registry at startup
//! rather than a dynamic plugin loader. No module is untrusted or
//! hot-loadable here, so a `match` table plays the same role a registry
//! of trait objects would, without the indirection.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use daq_core::Clock;
use daq_protocol::rest::ErrorCode;
use daq_protocol::status::well_known;
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;

/// Extension queries are read-only status snapshots, not recording
/// control; a couple of seconds is generous for a module already running.
const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// One query against a module family's extension surface. Regardless of
/// whether the backing module process is currently running, a known
/// `family`/`key` pair validates and reports a well-formed "module not
/// running" response rather than 404ing on the route itself, so a REST
/// client can distinguish "this extension doesn't exist" from "the module
/// backing it isn't started". When the module is running, `get_status` is
/// forwarded to it and the matching field (falling back to the module's
/// full status payload, for keys no concrete module surfaces yet) is
/// returned as `data`.
pub async fn query<C: Clock>(
    State(state): State<AppState<C>>,
    Path((family, key)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let known_keys: &[&str] = match family.as_str() {
        "audio" => &["levels", "devices"],
        "cameras" => &["snapshot", "devices"],
        "gps" => &["nmea", "fix"],
        "eyetracker" => &["gaze", "imu", "events"],
        "drt" => &["battery", "last_press"],
        "vog" => &["battery", "lens"],
        "notes" => &["recent"],
        _ => return Err(ApiError::not_found(format!("no such module family: {family}"))),
    };
    if !known_keys.contains(&key.as_str()) {
        return Err(ApiError::not_found(format!("module family {family} has no extension '{key}'")));
    }

    let orchestrator = state.orchestrator.lock().await;
    let module_name = family_to_module_name(&family);
    let running = orchestrator.module_state(module_name).map(|s| s == daq_core::ModuleState::Ready || s == daq_core::ModuleState::Recording).unwrap_or(false);

    if !running {
        return Ok(Json(json!({ "family": family, "key": key, "available": false, "reason": "module not running" })));
    }

    let status = orchestrator
        .query_module(module_name, &daq_protocol::command!("get_status"), well_known::STATUS_REPORT, QUERY_TIMEOUT)
        .await?;
    if status.is_error() {
        let message = status.error_message().unwrap_or("module reported an error").to_string();
        let code = if message.contains("NOT_WIRELESS_DEVICE") { ErrorCode::NotWirelessDevice } else { ErrorCode::ValidationError };
        return Err(ApiError::new(code, message));
    }

    let data = field_for_key(&key, &status.data).unwrap_or_else(|| status.data.clone());
    Ok(Json(json!({ "family": family, "key": key, "available": true, "data": data })))
}

/// Extension key names don't always match the module's own status field
/// name (`battery` vs `battery_percent`); a few known aliases are resolved
/// here, and an exact match on `key` itself is tried first.
fn field_for_key(key: &str, data: &Value) -> Option<Value> {
    if let Some(v) = data.get(key) {
        return Some(v.clone());
    }
    let alias = match key {
        "battery" => "battery_percent",
        "fix" => "fix_rate_hz",
        _ => return None,
    };
    data.get(alias).cloned()
}

fn family_to_module_name(family: &str) -> &str {
    match family {
        "audio" => "Audio",
        "cameras" => "Camera",
        "gps" => "Gps",
        "eyetracker" => "EyeTracker",
        "drt" => "ResponseTime",
        "vog" => "Goggles",
        "notes" => "Notes",
        other => other,
    }
}
