// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! V4L2/CSI camera input is an external collaborator; this crate only
//! defines the seam and a synthetic frame generator standing in for it.
//! Frames are raw interleaved RGB24, the format `ffmpeg`'s `rawvideo`
//! demuxer expects on stdin without a container of its own.

use std::sync::atomic::{AtomicU64, Ordering};

#[async_trait::async_trait]
pub trait FrameSource: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// One RGB24 frame, `width * height * 3` bytes.
    async fn read_frame(&self) -> Vec<u8>;
}

/// A drifting vertical colour-bar pattern, one call per frame. Deterministic
/// and cheap, and varies enough between frames to make dropped/duplicate
/// frames visible in a written file.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    frame_index: AtomicU64,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, frame_index: AtomicU64::new(0) }
    }
}

#[async_trait::async_trait]
impl FrameSource for SyntheticFrameSource {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    async fn read_frame(&self) -> Vec<u8> {
        let n = self.frame_index.fetch_add(1, Ordering::SeqCst);
        let shift = (n % self.width as u64) as u32;
        let mut buf = Vec::with_capacity((self.width * self.height * 3) as usize);
        for _y in 0..self.height {
            for x in 0..self.width {
                let bar = ((x + shift) / (self.width.max(1) / 8).max(1)) % 8;
                let (r, g, b) = bar_colour(bar);
                buf.push(r);
                buf.push(g);
                buf.push(b);
            }
        }
        buf
    }
}

fn bar_colour(bar: u32) -> (u8, u8, u8) {
    match bar % 8 {
        0 => (255, 255, 255),
        1 => (255, 255, 0),
        2 => (0, 255, 255),
        3 => (0, 255, 0),
        4 => (255, 0, 255),
        5 => (255, 0, 0),
        6 => (0, 0, 255),
        _ => (0, 0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthetic_source_emits_expected_byte_count() {
        let source = SyntheticFrameSource::new(64, 48);
        let frame = source.read_frame().await;
        assert_eq!(frame.len(), 64 * 48 * 3);
    }

    #[tokio::test]
    async fn successive_frames_differ() {
        let source = SyntheticFrameSource::new(64, 48);
        let first = source.read_frame().await;
        let second = source.read_frame().await;
        assert_ne!(first, second);
    }
}
