pub mod extract;
pub mod orchestrator;
pub mod timing;

pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Media(#[from] crate::media::MediaError),

    #[error(transparent)]
    Extraction(#[from] extract::ExtractionError),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
