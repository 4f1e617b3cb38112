// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Writes captured chunks to a 16-bit PCM mono WAV file at the configured
//! sample rate.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use daq_module_runtime::{Frame, FrameSink, RuntimeError};

pub struct WavFrameSink {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
}

impl WavFrameSink {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self, RuntimeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)
            .map_err(|e| RuntimeError::Other(format!("creating WAV {}: {e}", path.display())))?;
        Ok(Self { writer: Some(writer), path: path.to_path_buf() })
    }
}

#[async_trait::async_trait]
impl FrameSink<Vec<i16>> for WavFrameSink {
    async fn write_frame(&mut self, frame: &Frame<Vec<i16>>) -> Result<(), RuntimeError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| RuntimeError::Other("WAV writer already closed".to_string()))?;
        for &sample in frame.captured.payload.iter() {
            writer
                .write_sample(sample)
                .map_err(|e| RuntimeError::Other(format!("writing WAV sample: {e}")))?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), RuntimeError> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| RuntimeError::Other(format!("finalising WAV {}: {e}", self.path.display())))?;
        }
        Ok(())
    }
}
