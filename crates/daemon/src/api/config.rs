// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Runtime configuration routes: inspect and patch the daemon's own
//! runtime-safe settings, trigger a reload from its on-disk config file,
//! and read/write a single module's `key=value` config file (or one
//! preference key within it) without restarting that module.

use axum::extract::{Path, State};
use axum::Json;
use daq_core::{Clock, ConfigFile, ConfigValue};
use daq_protocol::rest::ErrorCode;
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;
use crate::orchestrator::Orchestrator;

fn io_error(e: std::io::Error) -> ApiError {
    ApiError::new(ErrorCode::InternalError, e.to_string())
}

fn body_as_object(body: &Value) -> Result<&serde_json::Map<String, Value>, ApiError> {
    body.as_object().ok_or_else(|| ApiError::validation("request body must be a JSON object"))
}

fn module_config_path<C: Clock>(orchestrator: &Orchestrator<C>, name: &str) -> Result<std::path::PathBuf, ApiError> {
    orchestrator.descriptor(name).map(|d| d.config_path.clone()).ok_or_else(|| ApiError::not_found(format!("no such module: {name}")))
}

pub async fn get_config<C: Clock>(State(state): State<AppState<C>>) -> Json<Value> {
    let orchestrator = state.orchestrator.lock().await;
    Json(orchestrator.config().runtime_json())
}

pub async fn put_config<C: Clock>(State(state): State<AppState<C>>, Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    let patch = body_as_object(&body)?;
    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator.config_mut().apply_runtime_json(patch);
    Ok(Json(orchestrator.config().runtime_json()))
}

pub async fn reload_config<C: Clock>(State(state): State<AppState<C>>) -> Result<Json<Value>, ApiError> {
    let mut orchestrator = state.orchestrator.lock().await;
    orchestrator.config_mut().reload().map_err(io_error)?;
    Ok(Json(orchestrator.config().runtime_json()))
}

pub async fn get_module_config<C: Clock>(State(state): State<AppState<C>>, Path(name): Path<String>) -> Result<Json<Value>, ApiError> {
    let orchestrator = state.orchestrator.lock().await;
    let path = module_config_path(&orchestrator, &name)?;
    let file = ConfigFile::load(&path).map_err(io_error)?;
    Ok(Json(Value::Object(file.to_json_map())))
}

pub async fn put_module_config<C: Clock>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let patch = body_as_object(&body)?;
    let orchestrator = state.orchestrator.lock().await;
    let path = module_config_path(&orchestrator, &name)?;
    let mut file = ConfigFile::load(&path).map_err(io_error)?;
    for (key, value) in patch {
        file.set_value(key.clone(), ConfigValue::from_json(value));
    }
    file.save(&path).map_err(io_error)?;
    Ok(Json(Value::Object(file.to_json_map())))
}

pub async fn get_module_preference<C: Clock>(
    State(state): State<AppState<C>>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let orchestrator = state.orchestrator.lock().await;
    let path = module_config_path(&orchestrator, &name)?;
    let file = ConfigFile::load(&path).map_err(io_error)?;
    match file.get(&key) {
        Some(v) => Ok(Json(json!({ "key": key, "value": v.to_json() }))),
        None => Err(ApiError::not_found(format!("module {name} has no preference '{key}'"))),
    }
}

pub async fn put_module_preference<C: Clock>(
    State(state): State<AppState<C>>,
    Path((name, key)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let value = body.get("value").ok_or_else(|| ApiError::missing_field("body must have a 'value' field"))?;
    let orchestrator = state.orchestrator.lock().await;
    let path = module_config_path(&orchestrator, &name)?;
    let mut file = ConfigFile::load(&path).map_err(io_error)?;
    file.set_value(key.clone(), ConfigValue::from_json(value));
    file.save(&path).map_err(io_error)?;
    let stored = file.get(&key).map(ConfigValue::to_json).unwrap_or(Value::Null);
    Ok(Json(json!({ "key": key, "value": stored })))
}
