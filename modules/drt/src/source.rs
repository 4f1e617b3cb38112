// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The response-time button (wired, via serial/TTY, or wireless, via XBee)
//! is an external collaborator; this crate only defines the seam and a
//! synthetic generator standing in for it.

use std::sync::atomic::{AtomicU64, Ordering};

/// One stimulus-response trial as reported by the device.
pub struct StimulusResponse {
    pub reaction_time_ms: i64,
    pub button_pressed: bool,
    pub timeout: bool,
    pub battery_percent: Option<u8>,
}

#[async_trait::async_trait]
pub trait StimulusSource: Send + Sync {
    /// Present a stimulus and wait for the device's response (or its
    /// internal timeout). One call per stimulus presentation.
    async fn present_and_wait(&self) -> StimulusResponse;

    /// `Some(percent)` for a wireless device, `None` for a wired one.
    fn battery_percent(&self) -> Option<u8>;
}

/// Alternates plausible button presses with the occasional timeout
/// (`reaction_time_ms = -1`), draining a synthetic battery if wireless.
pub struct SyntheticStimulusSource {
    wireless: bool,
    tick: AtomicU64,
    battery: AtomicU64,
}

impl SyntheticStimulusSource {
    pub fn new(wireless: bool) -> Self {
        Self { wireless, tick: AtomicU64::new(0), battery: AtomicU64::new(100) }
    }
}

#[async_trait::async_trait]
impl StimulusSource for SyntheticStimulusSource {
    async fn present_and_wait(&self) -> StimulusResponse {
        let n = self.tick.fetch_add(1, Ordering::SeqCst);
        // Every 7th trial times out, standing in for a missed response.
        let timeout = n % 7 == 6;
        if self.wireless && n % 20 == 0 {
            let _ = self.battery.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| Some(b.saturating_sub(1)));
        }
        StimulusResponse {
            reaction_time_ms: if timeout { -1 } else { 200 + (n as i64 % 400) },
            button_pressed: !timeout,
            timeout,
            battery_percent: self.battery_percent(),
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
    async fn wired_source_reports_no_battery() {
        let source = SyntheticStimulusSource::new(false);
        assert!(source.battery_percent().is_none());
        let resp = source.present_and_wait().await;
        assert!(resp.battery_percent.is_none());
    }

    #[tokio::test]
    async fn wireless_source_reports_battery_in_range() {
        let source = SyntheticStimulusSource::new(true);
        let resp = source.present_and_wait().await;
        assert!(resp.battery_percent.unwrap() <= 100);
    }

    #[tokio::test]
    async fn timeout_reaction_time_is_negative_one() {
        let source = SyntheticStimulusSource::new(false);
        for _ in 0..6 {
            source.present_and_wait().await;
        }
        let resp = source.present_and_wait().await;
        assert!(resp.timeout);
        assert_eq!(resp.reaction_time_ms, -1);
    }
}
