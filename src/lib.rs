//! Vinoscout: extracts supermarket-wine recommendations from TikTok
//! videos.
//!
//! The pipeline downloads a post, refines its transcript with a
//! lexicon-steered two-pass ASR strategy, extracts a structured wine
//! record via an LLM reasoner, localizes the mention in the transcript,
//! plans and extracts candidate still frames, uploads the usable ones,
//! and persists the result with per-URL deduplication. A small axum API
//! serves the records; a daily scheduler feeds the pipeline from a
//! source registry.

pub mod api;
pub mod asr;
pub mod config;
pub mod core_state;
pub mod db;
pub mod lexicon;
pub mod media;
pub mod models;
pub mod pipeline;
pub mod scheduler;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// built-in default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
