pub mod audio;
pub mod refiner;
pub mod whisper;

pub use refiner::*;
pub use whisper::*;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsrError {
    #[error("ASR endpoint unreachable: {0}")]
    Connection(String),

    #[error("ASR returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One timed segment of a transcript. Produced by the ASR engine and
/// never mutated — a re-transcription yields an entirely new list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Raw output of a single ASR call.
#[derive(Debug, Clone, Default)]
pub struct AsrResponse {
    pub text: String,
    pub duration: Option<f64>,
    pub segments: Vec<TranscriptSegment>,
}

/// Speech-to-text engine abstraction (allows mocking). Must support
/// being called twice within one logical transcription with different
/// prompts.
pub trait SpeechToText: Send + Sync {
    fn transcribe(
        &self,
        audio: &Path,
        language: &str,
        prompt: Option<&str>,
    ) -> Result<AsrResponse, AsrError>;
}
