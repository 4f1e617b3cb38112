// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Discovery drivers: one independent polling loop per transport.
//!
//! Real hardware enumeration (`/proc/asound/cards`, USB sysfs, serial TTY
//! probing, mDNS, XBee network scans) is outside this core's scope.
//! [`DeviceSource`] is the seam a real build plugs an adapter into;
//! [`StaticSource`] is the in-repo implementation, used directly by tests
//! and by any caller that wants to drive the registry from a fixed or
//! externally-fed device list (e.g. a config-file-based simulation).

use std::time::Duration;

use daq_core::Device;
use tokio::sync::mpsc;

/// One poll of a transport, returning every device currently visible on
/// it (not just deltas — the registry does the diffing).
#[async_trait::async_trait]
pub trait DeviceSource: Send + Sync {
    async fn poll(&self) -> Vec<Device>;
}

/// A source backed by a caller-supplied snapshot, swappable at runtime.
/// Stands in for the USB/serial/network/XBee adapters a production build
/// would provide.
pub struct StaticSource {
    snapshot: parking_lot::Mutex<Vec<Device>>,
}

impl StaticSource {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { snapshot: parking_lot::Mutex::new(devices) }
    }

    pub fn set(&self, devices: Vec<Device>) {
        *self.snapshot.lock() = devices;
    }
}

#[async_trait::async_trait]
impl DeviceSource for StaticSource {
    async fn poll(&self) -> Vec<Device> {
        self.snapshot.lock().clone()
    }
}

/// Drives one [`DeviceSource`] on a fixed cadence, forwarding each sweep's
/// snapshot to a channel the registry reads from. USB polling is typically
/// 5ms-500ms; serial/network/XBee drivers use a coarser cadence.
pub struct DiscoveryDriver {
    source: std::sync::Arc<dyn DeviceSource>,
    cadence: Duration,
}

impl DiscoveryDriver {
    pub fn new(source: std::sync::Arc<dyn DeviceSource>, cadence: Duration) -> Self {
        Self { source, cadence }
    }

    /// Spawn the polling loop. Each sweep's full snapshot is sent on `tx`;
    /// the task exits when `shutdown` fires or the receiver is dropped.
    pub fn spawn(self, tx: mpsc::Sender<Vec<Device>>, shutdown: tokio_util::sync::CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.cadence);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tick.tick() => {
                        let snapshot = self.source.poll().await;
                        if tx.send(snapshot).await.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::device::{DeviceInterface, DeviceType};
    use daq_core::{Device, DeviceId};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn sample_device(id: &str) -> Device {
        Device {
            device_id: DeviceId::from_string(id),
            display_name: "Test Device".into(),
            module_id: "audio".into(),
            interface: DeviceInterface::Usb,
            port: "usb-1".into(),
            baudrate: None,
            device_type: DeviceType::Wired,
            connected: false,
            connecting: false,
            metadata: BTreeMap::new(),
            missed_sweeps: 0,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn driver_forwards_each_sweep_until_shutdown() {
        let source = Arc::new(StaticSource::new(vec![sample_device("dev-001")]));
        let driver = DiscoveryDriver::new(source, Duration::from_millis(5));
        let (tx, mut rx) = mpsc::channel(8);
        let shutdown = tokio_util::sync::CancellationToken::new();
        let handle = driver.spawn(tx, shutdown.clone());

        let sweep = rx.recv().await.unwrap();
        assert_eq!(sweep.len(), 1);

        shutdown.cancel();
        let _ = handle.await;
    }
}
