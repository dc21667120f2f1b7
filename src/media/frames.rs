//! Still-frame extraction via ffmpeg.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::MediaError;

/// Outputs below this are corrupt (ffmpeg wrote a header and gave up).
const MIN_FRAME_BYTES: u64 = 1_000;
/// Outputs below this decode fine but are almost certainly blank or
/// dark frames; the caller skips them without error.
pub const USABLE_FRAME_BYTES: u64 = 10_000;

pub trait FrameExtractor: Send + Sync {
    /// Extract one frame at `timestamp` seconds into `output`. `Ok` means
    /// a plausible JPEG exists at `output`; usability is the caller's
    /// size check.
    fn extract(&self, video: &Path, timestamp: f64, output: &Path) -> Result<(), MediaError>;
}

/// Whether an extracted frame is worth uploading.
pub fn frame_is_usable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.len() >= USABLE_FRAME_BYTES)
        .unwrap_or(false)
}

pub struct FfmpegFrameExtractor {
    ffmpeg_bin: String,
}

impl FfmpegFrameExtractor {
    pub fn new(ffmpeg_bin: &str) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.to_string(),
        }
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract(&self, video: &Path, timestamp: f64, output: &Path) -> Result<(), MediaError> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let result = Command::new(&self.ffmpeg_bin)
            .args(["-ss", &format!("{timestamp:.1}")])
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1", "-q:v", "2", "-y"])
            .arg(output)
            .output()?;

        if !result.status.success() {
            return Err(MediaError::FrameExtraction {
                timestamp,
                reason: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if size < MIN_FRAME_BYTES {
            return Err(MediaError::FrameExtraction {
                timestamp,
                reason: format!("output too small ({size} bytes)"),
            });
        }

        Ok(())
    }
}

/// Mock frame extractor writing frames of a configurable size, so the
/// usability filter can be exercised.
pub struct MockFrameExtractor {
    frame_bytes: usize,
    fail: bool,
}

impl MockFrameExtractor {
    /// Frames that pass the usability filter.
    pub fn usable() -> Self {
        Self {
            frame_bytes: USABLE_FRAME_BYTES as usize + 1_000,
            fail: false,
        }
    }

    /// Frames that decode but fail the usability filter.
    pub fn blank() -> Self {
        Self {
            frame_bytes: MIN_FRAME_BYTES as usize + 100,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            frame_bytes: 0,
            fail: true,
        }
    }
}

impl FrameExtractor for MockFrameExtractor {
    fn extract(&self, _video: &Path, timestamp: f64, output: &Path) -> Result<(), MediaError> {
        if self.fail {
            return Err(MediaError::FrameExtraction {
                timestamp,
                reason: "mock failure".into(),
            });
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, vec![0xFFu8; self.frame_bytes])?;
        Ok(())
    }
}

/// Standard on-disk name for frame `index` of a plan.
pub fn frame_output_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:03}.jpg"))
}
