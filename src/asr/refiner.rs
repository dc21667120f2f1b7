//! Lexicon-steered two-pass transcript refinement.
//!
//! Pass 1 transcribes with a generic domain prompt built from the top
//! lexicon terms. If the result shows too little domain evidence (or a
//! suspicious garbled-looking token), pass 2 re-transcribes with a
//! prompt enriched by the entity-like tokens pass 1 itself produced.
//! The enriched result is only accepted when it is not materially
//! shorter than pass 1, to guard against prompt-induced truncation.

use std::path::Path;
use std::time::Instant;

use super::{audio, AsrError, AsrResponse, SpeechToText, TranscriptSegment};
use crate::config::Settings;
use crate::lexicon::{fold_accents, WineLexicon};
use crate::models::{AsrMetrics, TranscriptionStatus};

/// Strategy identifier stored with every audit record.
pub const ASR_STRATEGY_VERSION: &str = "lexicon_two_pass_v2";

/// Distinct top-50 lexicon hits below this count trigger pass 2.
const MIN_LEXICON_HITS: usize = 3;
/// Terms scanned when scoring a transcript.
const SCORING_TERMS: usize = 50;
/// Minimum term length that counts as a scoring hit.
const MIN_HIT_LEN: usize = 4;
/// Pass 2 must retain at least this share of pass 1's length.
const PASS2_MIN_LENGTH_RATIO: f64 = 0.95;
/// Cap on pass-1 candidate tokens fed into the pass-2 prompt.
const MAX_ENRICHMENT_CANDIDATES: usize = 20;

#[derive(Debug, Clone)]
pub struct RefinerConfig {
    pub language: String,
    pub two_pass_enabled: bool,
    /// Extra attempts after the first ASR failure.
    pub retry_count: u32,
    pub pass1_terms: usize,
    pub pass2_terms: usize,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

impl RefinerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            language: settings.language.clone(),
            two_pass_enabled: settings.asr_two_pass,
            retry_count: settings.asr_retry_count,
            pass1_terms: settings.asr_pass1_terms,
            pass2_terms: settings.asr_pass2_terms,
            ffmpeg_bin: settings.ffmpeg_bin.clone(),
            ffprobe_bin: settings.ffprobe_bin.clone(),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            language: "nl".into(),
            two_pass_enabled: true,
            retry_count: 1,
            pass1_terms: 80,
            pass2_terms: 60,
            ffmpeg_bin: "/nonexistent/ffmpeg".into(),
            ffprobe_bin: "/nonexistent/ffprobe".into(),
        }
    }
}

/// Terminal result of a logical transcription. ASR failures surface
/// here as `status = Failed`, never as an `Err` — the pipeline records
/// the outcome and moves on.
#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub duration_secs: f64,
    pub status: TranscriptionStatus,
    pub error: Option<String>,
    pub metrics: AsrMetrics,
}

pub struct TranscriptRefiner<'a> {
    asr: &'a dyn SpeechToText,
    lexicon: &'a WineLexicon,
    config: RefinerConfig,
}

impl<'a> TranscriptRefiner<'a> {
    pub fn new(asr: &'a dyn SpeechToText, lexicon: &'a WineLexicon, config: RefinerConfig) -> Self {
        Self {
            asr,
            lexicon,
            config,
        }
    }

    /// Transcribe one audio file, with preprocessing, up to two ASR
    /// passes, and full-attempt retries on ASR error.
    pub fn transcribe(&self, audio_path: &Path) -> TranscriptionOutcome {
        let started = Instant::now();
        let probed = audio::media_duration_secs(&self.config.ffprobe_bin, audio_path);
        let input = audio::preprocess_for_asr(&self.config.ffmpeg_bin, audio_path);

        let max_attempts = self.config.retry_count + 1;
        let mut last_error = None;
        for attempt in 1..=max_attempts {
            match self.refine_once(&input) {
                Ok(pass) => {
                    // The engine's own duration is the most accurate;
                    // the probe covers engines that omit it.
                    let duration_secs = pass
                        .response
                        .duration
                        .filter(|d| *d > 0.0)
                        .unwrap_or(probed);
                    let metrics = self.compute_metrics(&pass, started.elapsed().as_millis() as u64);
                    tracing::info!(
                        pass2_used = metrics.pass2_used,
                        lexicon_hits = metrics.lexicon_hits,
                        chars = pass.response.text.chars().count(),
                        "Transcription complete"
                    );
                    return TranscriptionOutcome {
                        text: pass.response.text.clone(),
                        segments: pass.response.segments,
                        duration_secs,
                        status: TranscriptionStatus::Success,
                        error: None,
                        metrics,
                    };
                }
                Err(e) => {
                    tracing::warn!(attempt, max_attempts, error = %e, "ASR attempt failed");
                    last_error = Some(e);
                }
            }
        }

        TranscriptionOutcome {
            text: String::new(),
            segments: vec![],
            duration_secs: probed,
            status: TranscriptionStatus::Failed,
            error: last_error.map(|e| e.to_string()),
            metrics: AsrMetrics {
                version: ASR_STRATEGY_VERSION.to_string(),
                runtime_ms: started.elapsed().as_millis() as u64,
                ..Default::default()
            },
        }
    }

    fn refine_once(&self, input: &Path) -> Result<PassOutcome, AsrError> {
        let pass1_prompt = self.build_domain_prompt();
        let pass1 = self
            .asr
            .transcribe(input, &self.config.language, pass1_prompt.as_deref())?;
        let pass1_chars = pass1.text.chars().count();

        let hits = self.count_lexicon_hits(&pass1.text);
        let insufficient = hits < MIN_LEXICON_HITS;
        let suspicious = self.has_suspicious_token(&pass1.text);

        if !(self.config.two_pass_enabled && (insufficient || suspicious)) {
            return Ok(PassOutcome {
                response: pass1,
                pass1_chars,
                pass2_chars: 0,
                pass2_used: false,
            });
        }

        tracing::debug!(
            hits,
            suspicious,
            "Pass-1 evidence weak, running enriched second pass"
        );
        let pass2_prompt = self.build_enriched_prompt(&pass1.text);
        let pass2 = self
            .asr
            .transcribe(input, &self.config.language, Some(&pass2_prompt))?;
        let pass2_chars = pass2.text.chars().count();

        // Reject a pass 2 that lost material content.
        if (pass2_chars as f64) >= PASS2_MIN_LENGTH_RATIO * pass1_chars as f64 {
            Ok(PassOutcome {
                response: pass2,
                pass1_chars,
                pass2_chars,
                pass2_used: true,
            })
        } else {
            tracing::debug!(pass1_chars, pass2_chars, "Pass 2 too short, keeping pass 1");
            Ok(PassOutcome {
                response: pass1,
                pass1_chars,
                pass2_chars,
                pass2_used: false,
            })
        }
    }

    /// Pass-1 prompt: a Dutch domain hint listing top lexicon terms.
    /// `None` when the lexicon is empty — a bare prompt beats an empty
    /// term list.
    fn build_domain_prompt(&self) -> Option<String> {
        let terms = self.lexicon.prompt_terms(self.config.pass1_terms);
        if terms.is_empty() {
            return None;
        }
        Some(format!(
            "Dit is een Nederlandse video over supermarktwijnen. \
             Relevante namen en termen: {}.",
            terms.join(", ")
        ))
    }

    /// Pass-2 prompt: novel entity-like pass-1 tokens first, then the
    /// top lexicon terms, deduplicated by folded lowercase form.
    fn build_enriched_prompt(&self, pass1_text: &str) -> String {
        let mut terms: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for token in word_tokens(pass1_text) {
            if terms.len() >= MAX_ENRICHMENT_CANDIDATES {
                break;
            }
            if !self.lexicon.is_entity_like_token(token) || self.lexicon.contains_folded(token) {
                continue;
            }
            let key = fold_accents(token).to_lowercase();
            if seen.insert(key) {
                terms.push(token.to_string());
            }
        }

        for term in self.lexicon.prompt_terms(self.config.pass2_terms) {
            let key = fold_accents(term).to_lowercase();
            if seen.insert(key) {
                terms.push(term.clone());
            }
        }

        if terms.is_empty() {
            "Dit is een Nederlandse video over supermarktwijnen.".to_string()
        } else {
            format!(
                "Dit is een Nederlandse video over supermarktwijnen. \
                 Relevante namen en termen: {}.",
                terms.join(", ")
            )
        }
    }

    /// Distinct top-50 lexicon terms (len ≥ 4) present as substrings of
    /// the lowercased text.
    fn count_lexicon_hits(&self, text: &str) -> usize {
        let haystack = fold_accents(text).to_lowercase();
        self.lexicon
            .top_terms(SCORING_TERMS)
            .iter()
            .filter(|term| term.chars().count() >= MIN_HIT_LEN)
            .filter(|term| haystack.contains(&fold_accents(term).to_lowercase()))
            .count()
    }

    /// An uppercase-only entity-like token suggests the engine guessed
    /// at a proper noun it did not recognize.
    fn has_suspicious_token(&self, text: &str) -> bool {
        word_tokens(text).any(|token| {
            let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
            letters.len() >= 3
                && letters.iter().all(|c| c.is_uppercase())
                && self.lexicon.is_entity_like_token(token)
        })
    }

    fn compute_metrics(&self, pass: &PassOutcome, runtime_ms: u64) -> AsrMetrics {
        let text = &pass.response.text;
        let chars = text.chars().count();
        let hits = self.count_lexicon_hits(text);

        let entity_tokens: Vec<&str> = word_tokens(text)
            .filter(|t| self.lexicon.is_entity_like_token(t))
            .collect();
        let oov_rate = if entity_tokens.is_empty() {
            0.0
        } else {
            let oov = entity_tokens
                .iter()
                .filter(|t| !self.lexicon.any_term_contains(t))
                .count();
            oov as f64 / entity_tokens.len() as f64
        };

        AsrMetrics {
            version: ASR_STRATEGY_VERSION.to_string(),
            pass1_chars: pass.pass1_chars,
            pass2_chars: pass.pass2_chars,
            pass2_used: pass.pass2_used,
            lexicon_hits: hits,
            lexicon_hits_per_1k: hits as f64 * 1000.0 / chars.max(1) as f64,
            oov_rate,
            runtime_ms,
        }
    }
}

struct PassOutcome {
    response: AsrResponse,
    pass1_chars: usize,
    pass2_chars: usize,
    pass2_used: bool,
}

/// Whitespace tokens with surrounding punctuation stripped; hyphens and
/// apostrophes survive because they carry entity signal.
fn word_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::whisper::MockSpeechToText;
    use crate::lexicon::LexiconFile;
    use std::path::PathBuf;

    fn lexicon() -> WineLexicon {
        WineLexicon::from_file(LexiconFile {
            supermarkets: vec!["Albert Heijn".into(), "Jumbo".into(), "LIDL".into()],
            brands: vec!["Campo Viejo".into()],
            grapes: vec!["Malbec".into(), "Tempranillo".into()],
            regions: vec!["Rioja".into(), "Côtes du Rhône".into()],
            general: vec!["wijn".into(), "fles".into(), "druif".into()],
        })
    }

    fn response(text: &str) -> AsrResponse {
        AsrResponse {
            text: text.to_string(),
            duration: Some(30.0),
            segments: vec![],
        }
    }

    fn audio_path() -> PathBuf {
        PathBuf::from("/nonexistent/audio.mp3")
    }

    // Three distinct top-50 hits, no suspicious tokens.
    const RICH_TEXT: &str = "deze malbec uit rioja koop je bij de jumbo";

    #[test]
    fn single_pass_when_evidence_sufficient() {
        let mock = MockSpeechToText::new(vec![Ok(response(RICH_TEXT))]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        let outcome = refiner.transcribe(&audio_path());

        assert_eq!(mock.call_count(), 1);
        assert_eq!(outcome.status, TranscriptionStatus::Success);
        assert_eq!(outcome.text, RICH_TEXT);
        assert!(!outcome.metrics.pass2_used);
        assert_eq!(outcome.metrics.lexicon_hits, 3);
    }

    #[test]
    fn second_pass_triggered_by_insufficient_hits() {
        let pass2_text = "ik proef vandaag een malbec uit rioja bij de jumbo supermarkt";
        let mock = MockSpeechToText::new(vec![
            Ok(response("ik proef vandaag iets lekkers uit spanje")),
            Ok(response(pass2_text)),
        ]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        let outcome = refiner.transcribe(&audio_path());

        assert_eq!(mock.call_count(), 2);
        assert_eq!(outcome.text, pass2_text);
        assert!(outcome.metrics.pass2_used);
        assert!(outcome.metrics.pass2_chars > 0);
    }

    #[test]
    fn second_pass_triggered_by_suspicious_uppercase_token() {
        // Three lexicon hits, but "RIOCHA" looks like a garbled entity.
        let text = "deze malbec uit rioja bij de jumbo lijkt op RIOCHA wijn";
        let mock = MockSpeechToText::new(vec![Ok(response(text)), Ok(response(text))]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        refiner.transcribe(&audio_path());
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn short_second_pass_is_rejected() {
        let pass1 = "ik proef vandaag iets lekkers uit spanje en het is goed";
        let mock = MockSpeechToText::new(vec![
            Ok(response(pass1)),
            Ok(response("malbec rioja")),
        ]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        let outcome = refiner.transcribe(&audio_path());

        assert_eq!(outcome.text, pass1);
        assert!(!outcome.metrics.pass2_used);
        // Still recorded for offline comparison.
        assert_eq!(outcome.metrics.pass2_chars, "malbec rioja".chars().count());
    }

    #[test]
    fn disabled_switch_skips_second_pass() {
        let mock = MockSpeechToText::new(vec![Ok(response("niks herkenbaars hier"))]);
        let mut config = RefinerConfig::for_tests();
        config.two_pass_enabled = false;
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,config);

        let outcome = refiner.transcribe(&audio_path());

        assert_eq!(mock.call_count(), 1);
        assert_eq!(outcome.status, TranscriptionStatus::Success);
        assert!(!outcome.metrics.pass2_used);
    }

    #[test]
    fn enriched_prompt_lists_novel_tokens_before_lexicon_terms() {
        let mock = MockSpeechToText::new(vec![
            Ok(response("proef deze Verdejo van het huis")),
            Ok(response(RICH_TEXT)),
        ]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        refiner.transcribe(&audio_path());

        let prompts = mock.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        let pass2_prompt = prompts[1].as_deref().unwrap();
        // "Verdejo" is entity-like and not in the lexicon; it must come
        // before any lexicon term.
        let verdejo = pass2_prompt.find("Verdejo").unwrap();
        let malbec = pass2_prompt.find("Malbec").unwrap();
        assert!(verdejo < malbec);
    }

    #[test]
    fn retries_once_then_succeeds() {
        let mock = MockSpeechToText::new(vec![
            Err(AsrError::Connection("down".into())),
            Ok(response(RICH_TEXT)),
        ]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        let outcome = refiner.transcribe(&audio_path());

        assert_eq!(outcome.status, TranscriptionStatus::Success);
        assert_eq!(outcome.text, RICH_TEXT);
    }

    #[test]
    fn exhausted_retries_yield_failed_outcome() {
        let mock = MockSpeechToText::new(vec![
            Err(AsrError::Connection("down".into())),
            Err(AsrError::Connection("still down".into())),
        ]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        let outcome = refiner.transcribe(&audio_path());

        assert_eq!(outcome.status, TranscriptionStatus::Failed);
        assert!(outcome.error.unwrap().contains("still down"));
        assert!(outcome.text.is_empty());
        assert_eq!(outcome.metrics.version, ASR_STRATEGY_VERSION);
    }

    #[test]
    fn empty_lexicon_means_no_pass1_prompt() {
        let empty = WineLexicon::from_file(LexiconFile::default());
        let mock = MockSpeechToText::new(vec![Ok(response("wat dan ook")), Ok(response("wat dan ook"))]);
        let refiner = TranscriptRefiner::new(&mock, &empty, RefinerConfig::for_tests());

        refiner.transcribe(&audio_path());

        let prompts = mock.recorded_prompts();
        assert_eq!(prompts[0], None);
    }

    #[test]
    fn oov_rate_counts_unknown_entities() {
        let mock = MockSpeechToText::new(vec![Ok(response(
            "deze Malbec en die Zweigelt uit rioja bij jumbo",
        ))]);
        let lexicon = lexicon();
        let refiner = TranscriptRefiner::new(&mock, &lexicon,RefinerConfig::for_tests());

        let outcome = refiner.transcribe(&audio_path());

        // Entity-like tokens: Malbec, Zweigelt, rioja, jumbo (folded
        // lexicon matches count). Only Zweigelt is out of vocabulary.
        assert!(outcome.metrics.oov_rate > 0.0);
        assert!(outcome.metrics.oov_rate <= 0.5);
    }
}
