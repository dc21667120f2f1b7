//! Structured wine extraction from caption + transcript text.
//!
//! A chat-completion reasoner turns free Dutch text into candidate wine
//! records; the validator then enforces the category allow-lists. A
//! candidate that names an unknown supermarket or wine type is dropped
//! whole, never coerced — the rejection is kept as a filter decision.

pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;
pub mod validation;

pub use openai::*;
pub use parser::*;
pub use prompt::*;
pub use types::*;
pub use validation::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Reasoner endpoint unreachable: {0}")]
    Connection(String),

    #[error("Reasoner returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed reasoner response: {0}")]
    MalformedResponse(String),
}
