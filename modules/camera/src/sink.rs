// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Writes captured frames to an MP4 file by piping raw RGB24 bytes through
//! an `ffmpeg` child process: H.264 via `libx264 -preset ultrafast -crf 23`
//! at a constant frame rate equal to `requested_fps`. `ffmpeg` itself is an
//! external collaborator; this crate only shells out to it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use daq_module_runtime::{Frame, FrameSink, RuntimeError};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

pub struct Mp4FrameSink {
    child: Option<Child>,
    path: PathBuf,
}

impl Mp4FrameSink {
    pub fn create(path: &Path, width: u32, height: u32, fps: f64) -> Result<Self, RuntimeError> {
        let child = Command::new("ffmpeg")
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pixel_format",
                "rgb24",
                "-video_size",
                &format!("{width}x{height}"),
                "-framerate",
                &format!("{fps}"),
                "-i",
                "-",
                "-c:v",
                "libx264",
                "-preset",
                "ultrafast",
                "-crf",
                "23",
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RuntimeError::Other(format!("spawning ffmpeg for {}: {e}", path.display())))?;
        Ok(Self { child: Some(child), path: path.to_path_buf() })
    }
}

#[async_trait::async_trait]
impl FrameSink<Vec<u8>> for Mp4FrameSink {
    async fn write_frame(&mut self, frame: &Frame<Vec<u8>>) -> Result<(), RuntimeError> {
        let child = self.child.as_mut().ok_or_else(|| RuntimeError::Other("ffmpeg already closed".to_string()))?;
        let stdin = child.stdin.as_mut().ok_or_else(|| RuntimeError::Other("ffmpeg stdin unavailable".to_string()))?;
        stdin
            .write_all(&frame.captured.payload)
            .await
            .map_err(|e| RuntimeError::Other(format!("writing frame to ffmpeg: {e}")))?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), RuntimeError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        drop(child.stdin.take());
        let status = child
            .wait()
            .await
            .map_err(|e| RuntimeError::Other(format!("waiting for ffmpeg on {}: {e}", self.path.display())))?;
        if !status.success() {
            return Err(RuntimeError::Other(format!("ffmpeg exited with {status} writing {}", self.path.display())));
        }
        Ok(())
    }
}

/// A single RGB24 frame dumped as an uncompressed PPM (P6) file, used for
/// `take_snapshot`. No image codec crate is pulled in for a one-off still:
/// PPM needs only a short text header plus the raw bytes already on hand.
pub fn write_ppm_snapshot(path: &Path, width: u32, height: u32, rgb: &[u8]) -> Result<(), RuntimeError> {
    use std::io::Write;
    let mut file = std::fs::File::create(path).map_err(RuntimeError::Io)?;
    write!(file, "P6\n{width} {height}\n255\n").map_err(RuntimeError::Io)?;
    file.write_all(rgb).map_err(RuntimeError::Io)?;
    Ok(())
}
