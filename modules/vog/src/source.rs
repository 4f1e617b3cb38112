// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The occlusion-goggles lens controller (wired or XBee-wireless) is an
//! external collaborator; this crate only defines the seam and a synthetic
//! event generator standing in for it.

use std::sync::atomic::{AtomicU64, Ordering};

/// One lens-state transition as reported by the goggles.
pub struct LensEvent {
    /// `"A"`, `"B"`, or `"X"`.
    pub lens: String,
    pub event_type: String,
    pub signal_strength: Option<i8>,
    pub battery_percent: Option<u8>,
    pub firmware_version: Option<String>,
}

#[async_trait::async_trait]
pub trait LensSource: Send + Sync {
    /// Block until the next lens-state transition (open/close/blink/switch).
    async fn next_event(&self) -> LensEvent;

    fn battery_percent(&self) -> Option<u8>;
}

/// Cycles through open -> close -> open, occasionally switching lens
/// channel, standing in for a real goggle controller.
pub struct SyntheticLensSource {
    wireless: bool,
    tick: AtomicU64,
    battery: AtomicU64,
}

impl SyntheticLensSource {
    pub fn new(wireless: bool) -> Self {
        Self { wireless, tick: AtomicU64::new(0), battery: AtomicU64::new(100) }
    }
}

#[async_trait::async_trait]
impl LensSource for SyntheticLensSource {
    async fn next_event(&self) -> LensEvent {
        let n = self.tick.fetch_add(1, Ordering::SeqCst);
        if self.wireless && n % 15 == 0 {
            let _ = self.battery.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| Some(b.saturating_sub(1)));
        }
        let lens = match n % 6 {
            0..=3 => "A",
            4 => "B",
            _ => "X",
        };
        let event_type = if n % 2 == 0 { "close" } else { "open" };
        LensEvent {
            lens: lens.to_string(),
            event_type: event_type.to_string(),
            signal_strength: self.wireless.then_some(-40 - (n % 20) as i8),
            battery_percent: self.battery_percent(),
            firmware_version: self.wireless.then(|| "1.2.0".to_string()),
        }
    }

    fn battery_percent(&self) -> Option<u8> {
        self.wireless.then_some(self.battery.load(Ordering::SeqCst) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn alternates_open_and_close() {
        let source = SyntheticLensSource::new(false);
        let first = source.next_event().await;
        let second = source.next_event().await;
        assert_ne!(first.event_type, second.event_type);
    }

    #[tokio::test]
    async fn wired_source_has_no_signal_or_battery() {
        let source = SyntheticLensSource::new(false);
        let event = source.next_event().await;
        assert!(event.signal_strength.is_none());
        assert!(event.battery_percent.is_none());
    }
}
