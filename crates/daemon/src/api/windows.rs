// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Window arrangement route: bulk grid/cascade/tile layout of GUI module
//! windows, `/windows/arrange`.

use axum::extract::State;
use axum::Json;
use daq_core::Clock;
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;
use crate::orchestrator::WindowLayout;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Grid,
    Cascade,
    TileHorizontal,
    TileVertical,
}

impl From<LayoutKind> for WindowLayout {
    fn from(k: LayoutKind) -> Self {
        match k {
            LayoutKind::Grid => WindowLayout::Grid,
            LayoutKind::Cascade => WindowLayout::Cascade,
            LayoutKind::TileHorizontal => WindowLayout::TileHorizontal,
            LayoutKind::TileVertical => WindowLayout::TileVertical,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArrangeBody {
    pub layout: LayoutKind,
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
}

fn default_screen_width() -> u32 {
    1920
}

fn default_screen_height() -> u32 {
    1080
}

pub async fn arrange<C: Clock>(State(state): State<AppState<C>>, Json(body): Json<ArrangeBody>) -> Result<Json<Value>, ApiError> {
    let mut orchestrator = state.orchestrator.lock().await;
    let results = orchestrator.arrange_windows(body.layout.into(), body.screen_width, body.screen_height).await;
    let arranged: Vec<Value> = results
        .into_iter()
        .map(|(name, result)| match result {
            Ok(()) => json!({ "module": name, "ok": true }),
            Err(e) => json!({ "module": name, "ok": false, "error": e.to_string() }),
        })
        .collect();
    Ok(Json(json!({ "arranged": arranged })))
}
