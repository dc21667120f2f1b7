//! Locate when a wine is mentioned in a timestamped transcript.
//!
//! Three tiers, strongest first: the full name spoken verbatim, a
//! significant name word co-occurring with a presentation cue ("kijk,
//! deze malbec"), and a bare significant-word match. The first tier
//! that matches anywhere wins; within a tier the earliest segment wins.

use crate::asr::TranscriptSegment;
use crate::lexicon::fold_accents;

/// Name words shorter than this are too generic to locate on.
const MIN_SIGNIFICANT_WORD_LEN: usize = 5;

/// How a mention timestamp was found. Serialized into audit records as
/// `exact` / `signal_word:<cue>` / `partial` / `none`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchMethod {
    Exact,
    SignalWord { cue: String },
    Partial,
    None,
}

impl MatchMethod {
    pub fn as_label(&self) -> String {
        match self {
            MatchMethod::Exact => "exact".to_string(),
            MatchMethod::SignalWord { cue } => format!("signal_word:{cue}"),
            MatchMethod::Partial => "partial".to_string(),
            MatchMethod::None => "none".to_string(),
        }
    }
}

/// Find the timestamp where `entity` is mentioned.
///
/// Returns the start of the earliest matching segment and the method
/// that matched. `(None, MatchMethod::None)` when the entity is blank,
/// the segment list is empty, or nothing matches.
pub fn find_mention(
    entity: &str,
    segments: &[TranscriptSegment],
    signal_words: &[String],
) -> (Option<f64>, MatchMethod) {
    let entity_folded = fold_accents(entity.trim()).to_lowercase();
    if entity_folded.is_empty() || segments.is_empty() {
        return (None, MatchMethod::None);
    }

    let folded_segments: Vec<(f64, String)> = segments
        .iter()
        .map(|s| (s.start, fold_accents(&s.text).to_lowercase()))
        .collect();

    // Tier 1: full name verbatim.
    for (start, text) in &folded_segments {
        if text.contains(&entity_folded) {
            return (Some(*start), MatchMethod::Exact);
        }
    }

    let significant: Vec<&str> = entity_folded
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_WORD_LEN)
        .collect();
    if significant.is_empty() {
        return (None, MatchMethod::None);
    }

    // Tier 2: significant word plus a presentation cue in one segment.
    for (start, text) in &folded_segments {
        if !significant.iter().any(|w| text.contains(w)) {
            continue;
        }
        if let Some(cue) = signal_words.iter().find(|cue| {
            text.split_whitespace()
                .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
                .any(|t| t == cue.as_str())
        }) {
            return (
                Some(*start),
                MatchMethod::SignalWord { cue: cue.clone() },
            );
        }
    }

    // Tier 3: bare significant word.
    for (start, text) in &folded_segments {
        if significant.iter().any(|w| text.contains(w)) {
            return (Some(*start), MatchMethod::Partial);
        }
    }

    (None, MatchMethod::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SIGNAL_WORDS;

    fn seg(start: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end: start + 3.0,
            text: text.to_string(),
        }
    }

    fn signal_words() -> Vec<String> {
        DEFAULT_SIGNAL_WORDS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_wins_over_later_tiers() {
        let segments = vec![
            seg(0.0, "hallo allemaal"),
            seg(5.0, "kijk deze campo heb ik gisteren gekocht"),
            seg(10.0, "dit is de campo viejo rioja"),
        ];
        let (t, method) = find_mention("Campo Viejo", &segments, &signal_words());
        assert_eq!(t, Some(10.0));
        assert_eq!(method, MatchMethod::Exact);
    }

    #[test]
    fn exact_match_folds_accents_and_case() {
        let segments = vec![seg(4.2, "een mooie cotes du rhone van de lidl")];
        let (t, method) = find_mention("Côtes du Rhône", &segments, &signal_words());
        assert_eq!(t, Some(4.2));
        assert_eq!(method, MatchMethod::Exact);
    }

    #[test]
    fn signal_word_tier_reports_the_cue() {
        let segments = vec![
            seg(0.0, "proost allemaal"),
            seg(3.0, "kijk deze tempranillo is echt lekker"),
        ];
        let (t, method) = find_mention("Finca Tempranillo", &segments, &signal_words());
        assert_eq!(t, Some(3.0));
        // "kijk" appears before "deze" in the configured cue order? The
        // first configured cue present in the segment wins.
        match method {
            MatchMethod::SignalWord { ref cue } => assert!(cue == "deze" || cue == "kijk"),
            other => panic!("expected signal word match, got {other:?}"),
        }
        assert!(method.as_label().starts_with("signal_word:"));
    }

    #[test]
    fn partial_tier_when_no_cue_present() {
        let segments = vec![seg(7.5, "die tempranillo was prima")];
        let (t, method) = find_mention("Finca Tempranillo", &segments, &signal_words());
        assert_eq!(t, Some(7.5));
        assert_eq!(method, MatchMethod::Partial);
    }

    #[test]
    fn short_words_never_match_partially() {
        let segments = vec![seg(0.0, "deze rode wijn is top")];
        let (t, method) = find_mention("Rode Top", &segments, &signal_words());
        assert_eq!(t, None);
        assert_eq!(method, MatchMethod::None);
    }

    #[test]
    fn empty_inputs_yield_none() {
        let segments = vec![seg(0.0, "iets")];
        assert_eq!(
            find_mention("", &segments, &signal_words()),
            (None, MatchMethod::None)
        );
        assert_eq!(
            find_mention("Campo Viejo", &[], &signal_words()),
            (None, MatchMethod::None)
        );
    }

    #[test]
    fn earliest_segment_wins_within_a_tier() {
        let segments = vec![
            seg(2.0, "tempranillo nummer een"),
            seg(8.0, "tempranillo nummer twee"),
        ];
        let (t, method) = find_mention("Tempranillo", &segments, &signal_words());
        assert_eq!(t, Some(2.0));
        assert_eq!(method, MatchMethod::Exact);
    }

    #[test]
    fn method_labels() {
        assert_eq!(MatchMethod::Exact.as_label(), "exact");
        assert_eq!(
            MatchMethod::SignalWord { cue: "deze".into() }.as_label(),
            "signal_word:deze"
        );
        assert_eq!(MatchMethod::Partial.as_label(), "partial");
        assert_eq!(MatchMethod::None.as_label(), "none");
    }
}
