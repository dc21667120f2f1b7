//! Processing-audit records: one row per pipeline attempt on a post URL.
//!
//! Distinct from the final wine record — these keep the raw transcript,
//! ASR metrics and filter decisions so transcription strategies can be
//! compared over time and rejected extractions can be inspected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit metrics for one logical transcription (up to two ASR passes).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsrMetrics {
    /// Strategy identifier, for comparing runs across versions.
    pub version: String,
    pub pass1_chars: usize,
    pub pass2_chars: usize,
    pub pass2_used: bool,
    /// Distinct top-50 lexicon terms found in the final text.
    pub lexicon_hits: usize,
    pub lexicon_hits_per_1k: f64,
    /// Share of entity-like tokens with no lexicon counterpart.
    pub oov_rate: f64,
    pub runtime_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    Success,
    Failed,
    Skipped,
}

impl TranscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionStatus::Success => "success",
            TranscriptionStatus::Failed => "failed",
            TranscriptionStatus::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// A candidate the validator rejected, and why. Kept for observability;
/// rejected candidates are never persisted as wines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDecision {
    pub candidate_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedVideo {
    pub id: Uuid,
    pub post_url: String,
    pub handle: String,
    pub processed_at: DateTime<Utc>,
    pub caption: Option<String>,
    pub transcript: Option<String>,
    pub transcription_status: TranscriptionStatus,
    pub asr_metrics: Option<AsrMetrics>,
    pub filter_decisions: Vec<FilterDecision>,
    pub wines_found: u32,
    pub error: Option<String>,
}

impl ProcessedVideo {
    pub fn new(post_url: &str, handle: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_url: post_url.to_string(),
            handle: handle.to_string(),
            processed_at: Utc::now(),
            caption: None,
            transcript: None,
            transcription_status: TranscriptionStatus::Skipped,
            asr_metrics: None,
            filter_decisions: vec![],
            wines_found: 0,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in [
            TranscriptionStatus::Success,
            TranscriptionStatus::Failed,
            TranscriptionStatus::Skipped,
        ] {
            assert_eq!(TranscriptionStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn new_audit_record_starts_skipped() {
        let rec = ProcessedVideo::new("https://example.com/v/1", "tester");
        assert_eq!(rec.transcription_status, TranscriptionStatus::Skipped);
        assert_eq!(rec.wines_found, 0);
        assert!(rec.filter_decisions.is_empty());
    }
}
