//! External media collaborators: metadata fetch, download, frame
//! extraction and image upload. Each is a trait with one production
//! implementation and a mock, so the orchestrator can be tested without
//! touching the network or ffmpeg.

pub mod downloader;
pub mod frames;
pub mod oembed;
pub mod uploader;

pub use downloader::*;
pub use frames::*;
pub use oembed::*;
pub use uploader::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Frame extraction failed at {timestamp}s: {reason}")]
    FrameExtraction { timestamp: f64, reason: String },

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
