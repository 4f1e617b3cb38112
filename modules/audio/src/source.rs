// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! The sound-card adapter is an external collaborator; this crate only
//! defines the seam it plugs into and a synthetic source that lets the
//! rest of the module run and be tested without one.

/// One chunk of mono 16-bit PCM samples per call, at whatever rate the
/// caller polls it.
#[async_trait::async_trait]
pub trait AudioSource: Send + Sync {
    fn sample_rate(&self) -> u32;

    async fn read_chunk(&self, frames: usize) -> Vec<i16>;
}

/// A fixed-frequency tone, used in place of a real sound-card input. Useful
/// for exercising the pipeline end to end: deterministic, non-silent, and
/// free of any platform audio dependency.
pub struct ToneSource {
    sample_rate: u32,
    frequency_hz: f64,
    amplitude: i16,
    phase: parking_lot::Mutex<f64>,
}

impl ToneSource {
    pub fn new(sample_rate: u32, frequency_hz: f64) -> Self {
        Self { sample_rate, frequency_hz, amplitude: i16::MAX / 4, phase: parking_lot::Mutex::new(0.0) }
    }
}

#[async_trait::async_trait]
impl AudioSource for ToneSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn read_chunk(&self, frames: usize) -> Vec<i16> {
        let step = std::f64::consts::TAU * self.frequency_hz / self.sample_rate as f64;
        let mut phase = self.phase.lock();
        let mut samples = Vec::with_capacity(frames);
        for _ in 0..frames {
            samples.push((phase.sin() * self.amplitude as f64) as i16);
            *phase += step;
            if *phase > std::f64::consts::TAU {
                *phase -= std::f64::consts::TAU;
            }
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tone_source_emits_requested_frame_count() {
        let source = ToneSource::new(48_000, 440.0);
        let chunk = source.read_chunk(960).await;
        assert_eq!(chunk.len(), 960);
        assert!(chunk.iter().any(|&s| s != 0));
    }
}
