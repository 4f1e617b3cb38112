// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Typed device classification.
//!
//! A device is classified by a small ordered table of rules keyed on
//! `(interface, vid_pid, name_prefix)`, each mapping to a
//! `(DeviceFamily, DeviceType)` pair. The first matching rule wins; no
//! match leaves classification to the caller (typically "unknown, keep
//! for operator visibility but don't auto-select").

use daq_core::device::{DeviceFamily, DeviceInterface, DeviceType};

/// One row of the classification table.
pub struct ClassificationRule {
    pub interface: DeviceInterface,
    /// `(vendor_id, product_id)`, when known from USB/serial descriptors.
    pub vid_pid: Option<(u16, u16)>,
    /// Case-insensitive prefix match against the device's raw name, used
    /// when a VID/PID is not available (e.g. ALSA card line parsing).
    pub name_prefix: Option<&'static str>,
    pub family: DeviceFamily,
    pub device_type: DeviceType,
}

/// Built-in classification table, ordered most-specific (VID/PID) first.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        interface: DeviceInterface::Usb,
        vid_pid: Some((0x2833, 0x0001)), // Pupil Labs-style eye tracker headset
        name_prefix: None,
        family: DeviceFamily::EyeTracker,
        device_type: DeviceType::Wired,
    },
    ClassificationRule {
        interface: DeviceInterface::Usb,
        vid_pid: None,
        name_prefix: Some("usb"),
        family: DeviceFamily::Audio,
        device_type: DeviceType::Wired,
    },
    ClassificationRule {
        interface: DeviceInterface::Csi,
        vid_pid: None,
        name_prefix: None,
        family: DeviceFamily::Camera,
        device_type: DeviceType::Wired,
    },
    ClassificationRule {
        interface: DeviceInterface::Serial,
        vid_pid: None,
        name_prefix: Some("gps"),
        family: DeviceFamily::Gps,
        device_type: DeviceType::Wired,
    },
    ClassificationRule {
        interface: DeviceInterface::Xbee,
        vid_pid: None,
        name_prefix: Some("drt"),
        family: DeviceFamily::ResponseTime,
        device_type: DeviceType::Wireless,
    },
    ClassificationRule {
        interface: DeviceInterface::Xbee,
        vid_pid: None,
        name_prefix: Some("vog"),
        family: DeviceFamily::Goggles,
        device_type: DeviceType::Wireless,
    },
    ClassificationRule {
        interface: DeviceInterface::Serial,
        vid_pid: None,
        name_prefix: Some("drt"),
        family: DeviceFamily::ResponseTime,
        device_type: DeviceType::Wired,
    },
    ClassificationRule {
        interface: DeviceInterface::Network,
        vid_pid: None,
        name_prefix: None,
        family: DeviceFamily::EyeTracker,
        device_type: DeviceType::Wired,
    },
];

/// Classify a raw sighting. `raw_name` is whatever label the discovery
/// driver read off the bus (an ALSA card line, a serial port description,
/// an mDNS service name, ...).
pub fn classify(
    interface: DeviceInterface,
    vid_pid: Option<(u16, u16)>,
    raw_name: &str,
) -> Option<(DeviceFamily, DeviceType)> {
    let lower = raw_name.to_ascii_lowercase();
    RULES
        .iter()
        .find(|rule| {
            rule.interface == interface
                && (rule.vid_pid.is_none() || rule.vid_pid == vid_pid)
                && rule.name_prefix.map(|p| lower.contains(p)).unwrap_or(true)
        })
        .map(|rule| (rule.family, rule.device_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_usb_audio_card_by_name_prefix() {
        let result = classify(DeviceInterface::Usb, None, "USB Audio CODEC");
        assert_eq!(result, Some((DeviceFamily::Audio, DeviceType::Wired)));
    }

    #[test]
    fn classifies_known_vid_pid_over_name() {
        let result = classify(DeviceInterface::Usb, Some((0x2833, 0x0001)), "whatever");
        assert_eq!(result, Some((DeviceFamily::EyeTracker, DeviceType::Wired)));
    }

    #[test]
    fn xbee_wireless_response_device_by_prefix() {
        let result = classify(DeviceInterface::Xbee, None, "DRT-42");
        assert_eq!(result, Some((DeviceFamily::ResponseTime, DeviceType::Wireless)));
    }

    #[test]
    fn unmatched_device_returns_none() {
        assert_eq!(classify(DeviceInterface::Serial, None, "unknown widget"), None);
    }
}
