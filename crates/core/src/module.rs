// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Module descriptor and instance model: a sensor module family's static
//! description plus the running-child state machine for one instance of it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

crate::define_id! {
    pub struct ModuleInstanceId("mi--");
}

/// Immutable-at-runtime description of a sensor module family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub display_name: String,
    pub module_id: String,
    /// How to spawn the child: the executable path plus base arguments.
    pub entry_point: String,
    pub entry_args: Vec<String>,
    pub config_path: PathBuf,
    pub supports_snapshot: bool,
    pub has_gui: bool,
}

/// Window geometry as reported by `geometry_changed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl WindowGeometry {
    /// Parse the toolkit's `WxH+X+Y` geometry string. Offsets may be
    /// positive (`+X`) or negative (`-X`) in either axis.
    pub fn parse(spec: &str) -> Option<Self> {
        let offset_start = spec.find(['+', '-'])?;
        let (wh, offsets) = spec.split_at(offset_start);
        let (w, h) = wh.split_once('x')?;
        let width: u32 = w.parse().ok()?;
        let height: u32 = h.parse().ok()?;

        // offsets looks like "+100+100", "-10-20", or "+100-50".
        let second_sign = offsets[1..].find(['+', '-']).map(|i| i + 1)?;
        let (x_str, y_str) = offsets.split_at(second_sign);
        let x: i32 = x_str.parse().ok()?;
        let y: i32 = y_str.parse().ok()?;
        Some(Self { width, height, x, y })
    }
}

/// Lifecycle state of a running module instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    Starting,
    Initialising,
    Ready,
    Recording,
    Stopping,
    Stopped,
    Crashed,
}

/// The live child embodying a module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleInstance {
    pub instance_id: ModuleInstanceId,
    pub module_name: String,
    pub state: ModuleState,
    pub pid: Option<u32>,
    pub session_dir: Option<PathBuf>,
    pub window_geometry: Option<WindowGeometry>,
    pub last_status_timestamp: Option<String>,
}

impl ModuleInstance {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            instance_id: ModuleInstanceId::new(),
            module_name: module_name.into(),
            state: ModuleState::Starting,
            pid: None,
            session_dir: None,
            window_geometry: None,
            last_status_timestamp: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state == ModuleState::Recording
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self.state,
            ModuleState::Starting | ModuleState::Initialising | ModuleState::Ready | ModuleState::Recording
        )
    }
}
