// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The device registry: the authoritative device table, fed by discovery
//! sweeps from any number of [`crate::DiscoveryDriver`]s.
//!
//! Policy: classify by family, dedupe by `device_id`, promote
//! `connecting -> connected` only once the owning module's instance reports
//! the device usable, and retire a device after `MISSED_SWEEPS_TO_REMOVE`
//! consecutive sweeps with no sighting.

use std::collections::HashMap;

use daq_core::device::DeviceId;
use daq_core::Device;

/// Consecutive no-sighting sweeps before a device is retired.
pub const MISSED_SWEEPS_TO_REMOVE: u32 = 2;

/// What changed as a result of folding one sweep (or one module
/// acknowledgement) into the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    Discovered(Device),
    Removed(DeviceId),
    Connected(DeviceId),
}

#[derive(Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Fold one discovery sweep (a full snapshot from one driver) into the
    /// table: new devices appear as `Discovered`, sighted-again devices
    /// reset their miss counter, and devices not present in this snapshot
    /// but belonging to this driver's interface increment their miss
    /// counter, emitting `Removed` once they cross the threshold.
    pub fn apply_sweep(&mut self, sighted: Vec<Device>, interface: daq_core::device::DeviceInterface) -> Vec<RegistryEvent> {
        let mut events = Vec::new();
        let sighted_ids: std::collections::HashSet<DeviceId> = sighted.iter().map(|d| d.device_id.clone()).collect();

        for mut device in sighted {
            device.missed_sweeps = 0;
            match self.devices.get_mut(&device.device_id) {
                Some(existing) => {
                    existing.missed_sweeps = 0;
                    // Preserve connection state across re-sightings; only
                    // metadata/port may have changed.
                    existing.display_name = device.display_name;
                    existing.port = device.port;
                    existing.baudrate = device.baudrate;
                    existing.metadata = device.metadata;
                }
                None => {
                    events.push(RegistryEvent::Discovered(device.clone()));
                    self.devices.insert(device.device_id.clone(), device);
                }
            }
        }

        let mut to_remove = Vec::new();
        for (id, device) in self.devices.iter_mut() {
            if device.interface != interface || sighted_ids.contains(id) {
                continue;
            }
            device.missed_sweeps += 1;
            if device.missed_sweeps >= MISSED_SWEEPS_TO_REMOVE {
                to_remove.push(id.clone());
            }
        }
        for id in to_remove {
            self.devices.remove(&id);
            events.push(RegistryEvent::Removed(id));
        }

        events
    }

    pub fn begin_connecting(&mut self, id: &DeviceId) {
        if let Some(d) = self.devices.get_mut(id) {
            d.connecting = true;
        }
    }

    /// Promote `connecting -> connected` once the owning module instance
    /// reports the device usable. No-op if the device isn't known.
    pub fn mark_connected(&mut self, id: &DeviceId) -> Option<RegistryEvent> {
        let d = self.devices.get_mut(id)?;
        d.connecting = false;
        d.connected = true;
        Some(RegistryEvent::Connected(id.clone()))
    }

    pub fn mark_disconnected(&mut self, id: &DeviceId) {
        if let Some(d) = self.devices.get_mut(id) {
            d.connected = false;
            d.connecting = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::device::{DeviceInterface, DeviceType};
    use std::collections::BTreeMap as Map;

    fn device(id: &str, iface: DeviceInterface) -> Device {
        Device {
            device_id: DeviceId::from_string(id),
            display_name: "d".into(),
            module_id: "audio".into(),
            interface: iface,
            port: "p".into(),
            baudrate: None,
            device_type: DeviceType::Wired,
            connected: false,
            connecting: false,
            metadata: Map::new(),
            missed_sweeps: 0,
        }
    }

    #[test]
    fn new_device_emits_discovered_once() {
        let mut reg = DeviceRegistry::new();
        let events = reg.apply_sweep(vec![device("dev-1", DeviceInterface::Usb)], DeviceInterface::Usb);
        assert_eq!(events, vec![RegistryEvent::Discovered(device("dev-1", DeviceInterface::Usb))]);
        let events = reg.apply_sweep(vec![device("dev-1", DeviceInterface::Usb)], DeviceInterface::Usb);
        assert!(events.is_empty());
    }

    #[test]
    fn device_removed_after_two_consecutive_missed_sweeps() {
        let mut reg = DeviceRegistry::new();
        reg.apply_sweep(vec![device("dev-1", DeviceInterface::Usb)], DeviceInterface::Usb);

        let events = reg.apply_sweep(vec![], DeviceInterface::Usb);
        assert!(events.is_empty(), "first miss should not remove yet");

        let events = reg.apply_sweep(vec![], DeviceInterface::Usb);
        assert_eq!(events, vec![RegistryEvent::Removed(DeviceId::from_string("dev-1"))]);
        assert!(reg.get(&DeviceId::from_string("dev-1")).is_none());
    }

    #[test]
    fn resighting_resets_miss_counter() {
        let mut reg = DeviceRegistry::new();
        reg.apply_sweep(vec![device("dev-1", DeviceInterface::Usb)], DeviceInterface::Usb);
        reg.apply_sweep(vec![], DeviceInterface::Usb); // 1 miss
        reg.apply_sweep(vec![device("dev-1", DeviceInterface::Usb)], DeviceInterface::Usb); // resighted
        let events = reg.apply_sweep(vec![], DeviceInterface::Usb); // 1 miss again, not 2
        assert!(events.is_empty());
        assert!(reg.get(&DeviceId::from_string("dev-1")).is_some());
    }

    #[test]
    fn connecting_then_connected_tri_state() {
        let mut reg = DeviceRegistry::new();
        reg.apply_sweep(vec![device("dev-1", DeviceInterface::Usb)], DeviceInterface::Usb);
        let id = DeviceId::from_string("dev-1");
        reg.begin_connecting(&id);
        assert!(reg.get(&id).unwrap().connecting);
        let event = reg.mark_connected(&id).unwrap();
        assert_eq!(event, RegistryEvent::Connected(id.clone()));
        assert!(reg.get(&id).unwrap().connected);
        assert!(!reg.get(&id).unwrap().connecting);
    }

    #[test]
    fn other_interfaces_are_unaffected_by_a_sweep() {
        let mut reg = DeviceRegistry::new();
        reg.apply_sweep(vec![device("dev-1", DeviceInterface::Serial)], DeviceInterface::Serial);
        // A USB sweep with no devices must not age out the serial device.
        reg.apply_sweep(vec![], DeviceInterface::Usb);
        reg.apply_sweep(vec![], DeviceInterface::Usb);
        assert!(reg.get(&DeviceId::from_string("dev-1")).is_some());
    }
}
