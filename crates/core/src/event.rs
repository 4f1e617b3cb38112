// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Orchestrator-facing events.
//!
//! Discovery drivers and module-process handles push [`Event`]s onto the
//! daemon's event bus; the orchestrator core folds them into session/device
//! state. Kept deliberately small and non-durable: session/device state is
//! not required to survive a daemon restart, only recorded media is, and
//! that durability comes from the pipeline's own flush/fsync discipline.

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::module::WindowGeometry;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    /// A discovery driver observed a device this sweep.
    DeviceDiscovered(Device),
    /// A previously known device disappeared for N consecutive sweeps.
    DeviceRemoved { device_id: crate::device::DeviceId },
    /// A module instance emitted a status line.
    ModuleStatus {
        module_name: String,
        status: String,
        data: serde_json::Value,
    },
    /// A module's window geometry changed.
    GeometryChanged {
        module_name: String,
        geometry: WindowGeometry,
    },
    /// A child process exited (gracefully or otherwise).
    ModuleExited {
        module_name: String,
        graceful: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_round_trips_through_json() {
        let ev = Event::ModuleExited { module_name: "Audio".into(), graceful: true };
        let json = serde_json::to_string(&ev).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }
}
