// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Device model: discovered hardware endpoints and their classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Stable identifier for a discovered device, derived from bus
    /// address/serial by the discovery driver that found it.
    pub struct DeviceId("dev-");
}

/// Physical transport a device was discovered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceInterface {
    Usb,
    Serial,
    Network,
    Xbee,
    Csi,
}

/// Which sensor subsystem a device belongs to.
///
/// A typed enum plus the classification table in `daq-discovery`, rather
/// than substring checks against device names, decide which family a newly
/// discovered device falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    Audio,
    EyeTracker,
    Gps,
    Camera,
    ResponseTime,
    Goggles,
    Notes,
}

impl DeviceFamily {
    pub fn module_id(&self) -> &'static str {
        match self {
            DeviceFamily::Audio => "audio",
            DeviceFamily::EyeTracker => "eyetracker",
            DeviceFamily::Gps => "gps",
            DeviceFamily::Camera => "cameras",
            DeviceFamily::ResponseTime => "drt",
            DeviceFamily::Goggles => "vog",
            DeviceFamily::Notes => "notes",
        }
    }
}

/// Refinement within a device family (e.g. wired vs wireless response-time
/// button, or the two VOG goggle lens controllers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Wired,
    Wireless,
}

impl DeviceType {
    pub fn is_wireless(&self) -> bool {
        matches!(self, DeviceType::Wireless)
    }
}

/// A discovered or connected hardware endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub device_id: DeviceId,
    pub display_name: String,
    pub module_id: String,
    pub interface: DeviceInterface,
    pub port: String,
    #[serde(default)]
    pub baudrate: Option<u32>,
    pub device_type: DeviceType,
    pub connected: bool,
    pub connecting: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Consecutive discovery sweeps with no sighting; removed at N=2.
    #[serde(default)]
    pub missed_sweeps: u32,
}

impl Device {
    pub fn is_wireless(&self) -> bool {
        self.device_type.is_wireless()
    }
}
