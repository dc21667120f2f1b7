//! Wine-domain lexicon: supermarket names, brands, grapes, regions and
//! general vocabulary.
//!
//! The lexicon serves two purposes: it steers the ASR engine's prompt
//! toward domain proper nouns, and it scores transcript quality (hit
//! density, OOV rate). Loaded once at startup and immutable afterwards;
//! consumers receive it by reference.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

/// On-disk lexicon shape: five disjoint-by-category term lists.
#[derive(Debug, Default, Deserialize)]
pub struct LexiconFile {
    #[serde(default)]
    pub supermarkets: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub grapes: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub general: Vec<String>,
}

#[derive(Debug)]
pub struct WineLexicon {
    /// Merged term list, first-appearance order, deduplicated by
    /// accent-folded lowercase form.
    merged: Vec<String>,
    /// Folded lowercase forms of every term, for membership tests.
    folded: Vec<String>,
    folded_set: HashSet<String>,
    /// Configured hard ceiling on prompt terms, if any.
    prompt_ceiling: Option<usize>,
}

impl WineLexicon {
    /// Load from a JSON file. A missing file yields an empty-but-valid
    /// lexicon: downstream prompts become generic and heuristics find
    /// nothing, but the pipeline keeps running.
    pub fn from_path(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Lexicon file unreadable, using empty lexicon");
                return Self::from_file(LexiconFile::default());
            }
        };
        match serde_json::from_str::<LexiconFile>(&data) {
            Ok(file) => Self::from_file(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Lexicon file malformed, using empty lexicon");
                Self::from_file(LexiconFile::default())
            }
        }
    }

    /// Resolve the lexicon the way the process wants it: a configured
    /// file when one is set, the bundled default otherwise, with the
    /// configured prompt-term ceiling applied.
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        let lexicon = match &settings.lexicon_path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        };
        lexicon.with_prompt_ceiling(settings.max_prompt_terms)
    }

    /// The compiled-in default lexicon.
    pub fn bundled() -> Self {
        let data = include_str!("../../resources/lexicon/wine_lexicon.json");
        let file: LexiconFile =
            serde_json::from_str(data).unwrap_or_default();
        Self::from_file(file)
    }

    pub fn from_file(file: LexiconFile) -> Self {
        let mut merged = Vec::new();
        let mut folded = Vec::new();
        let mut folded_set = HashSet::new();

        let categories = [
            file.supermarkets,
            file.brands,
            file.grapes,
            file.regions,
            file.general,
        ];
        for category in categories {
            for term in category {
                let term = term.trim().to_string();
                if term.is_empty() {
                    continue;
                }
                let key = fold_accents(&term).to_lowercase();
                if folded_set.insert(key.clone()) {
                    merged.push(term);
                    folded.push(key);
                }
            }
        }

        Self {
            merged,
            folded,
            folded_set,
            prompt_ceiling: None,
        }
    }

    /// Apply the configured ceiling on prompt-term counts.
    pub fn with_prompt_ceiling(mut self, ceiling: Option<usize>) -> Self {
        self.prompt_ceiling = ceiling;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Top `n` merged terms in first-appearance order, uncapped. Used
    /// for transcript scoring.
    pub fn top_terms(&self, n: usize) -> &[String] {
        &self.merged[..n.min(self.merged.len())]
    }

    /// Terms for an ASR prompt: at most `min(max_items, ceiling)`.
    pub fn prompt_terms(&self, max_items: usize) -> &[String] {
        let cap = match self.prompt_ceiling {
            Some(ceiling) => max_items.min(ceiling),
            None => max_items,
        };
        self.top_terms(cap)
    }

    /// Exact folded-lowercase membership.
    pub fn contains_folded(&self, token: &str) -> bool {
        self.folded_set
            .contains(&fold_accents(token).to_lowercase())
    }

    /// Whether the folded token appears inside any lexicon term. Used
    /// for the OOV-rate metric, where "Côtes" should count as in-vocab
    /// because of "Côtes du Rhône".
    pub fn any_term_contains(&self, token: &str) -> bool {
        let needle = fold_accents(token).to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.folded.iter().any(|term| term.contains(&needle))
    }

    /// Heuristic: does this token look like a proper noun the ASR engine
    /// might have garbled? Deliberately over-triggers — it only feeds a
    /// prompt-enrichment step, not a hard filter.
    pub fn is_entity_like_token(&self, token: &str) -> bool {
        if token.chars().count() < 3 {
            return false;
        }
        if token.chars().any(|c| c.is_uppercase()) {
            return true;
        }
        if token.contains('-') || token.contains('\'') {
            return true;
        }
        if fold_accents(token) != token {
            return true;
        }
        self.contains_folded(token)
    }
}

/// Strip diacritics from the characters that occur in Dutch, French,
/// Spanish, Italian and German wine vocabulary. Unknown characters pass
/// through unchanged.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
            'ç' => 'c',
            'Ç' => 'C',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'È' | 'É' | 'Ê' | 'Ë' => 'E',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
            'ñ' => 'n',
            'Ñ' => 'N',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
            'ý' | 'ÿ' => 'y',
            'Ý' => 'Y',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn small_lexicon() -> WineLexicon {
        WineLexicon::from_file(LexiconFile {
            supermarkets: vec!["Albert Heijn".into(), "Jumbo".into()],
            brands: vec!["Campo Viejo".into()],
            grapes: vec!["Malbec".into(), "Grüner Veltliner".into()],
            regions: vec!["Côtes du Rhône".into(), "Rioja".into()],
            general: vec!["wijn".into(), "jumbo".into()], // dup of supermarket
        })
    }

    #[test]
    fn merged_list_dedups_accent_folded_case_insensitive() {
        let lex = small_lexicon();
        // "jumbo" in general collapses into the supermarket entry
        assert_eq!(lex.len(), 8);
        assert_eq!(lex.top_terms(2), &["Albert Heijn", "Jumbo"]);
    }

    #[test]
    fn prompt_terms_respects_caller_and_ceiling() {
        let lex = small_lexicon().with_prompt_ceiling(Some(3));
        assert_eq!(lex.prompt_terms(80).len(), 3);
        assert_eq!(lex.prompt_terms(2).len(), 2);

        let uncapped = small_lexicon();
        assert_eq!(uncapped.prompt_terms(80).len(), 8);
    }

    #[test]
    fn missing_file_yields_empty_lexicon() {
        let lex = WineLexicon::from_path(&PathBuf::from("/nonexistent/lexicon.json"));
        assert!(lex.is_empty());
        assert!(lex.prompt_terms(80).is_empty());
        assert!(!lex.is_entity_like_token("ab"));
    }

    #[test]
    fn bundled_lexicon_loads() {
        let lex = WineLexicon::bundled();
        assert!(lex.len() > 100);
        assert!(lex.contains_folded("cotes du rhone"));
    }

    #[test]
    fn entity_like_token_heuristic() {
        let lex = small_lexicon();
        // Uppercase letter
        assert!(lex.is_entity_like_token("Rhone"));
        // Hyphen / apostrophe
        assert!(lex.is_entity_like_token("pays-d'oc"));
        // Accent folding changes it
        assert!(lex.is_entity_like_token("côtes"));
        // Folded lowercase lexicon match
        assert!(lex.is_entity_like_token("rioja"));
        // Too short
        assert!(!lex.is_entity_like_token("ah"));
        // Plain lowercase non-lexicon word
        assert!(!lex.is_entity_like_token("lekker"));
    }

    #[test]
    fn any_term_contains_matches_substrings() {
        let lex = small_lexicon();
        assert!(lex.any_term_contains("Côtes"));
        assert!(lex.any_term_contains("rhone"));
        assert!(!lex.any_term_contains("barolo"));
        assert!(!lex.any_term_contains(""));
    }

    #[test]
    fn fold_accents_covers_wine_vocabulary() {
        assert_eq!(fold_accents("Côtes du Rhône"), "Cotes du Rhone");
        assert_eq!(fold_accents("Rías Baixas"), "Rias Baixas");
        assert_eq!(fold_accents("Grüner Veltliner"), "Gruner Veltliner");
        assert_eq!(fold_accents("plain"), "plain");
    }
}
