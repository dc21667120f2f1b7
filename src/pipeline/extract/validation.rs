//! Allow-list validation of reasoner output.

use super::types::{ValidatedWine, WineCandidate};
use crate::models::{FilterDecision, Supermarket, WineType};

/// Validated candidates plus the rejections, for the audit record.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub wines: Vec<ValidatedWine>,
    pub rejections: Vec<FilterDecision>,
}

/// Enforce the category allow-lists on reasoner candidates.
///
/// A candidate failing any check is discarded whole — a wine with an
/// unknown supermarket is not a wine with a fixable field, it is
/// evidence the reasoner guessed.
pub fn validate_candidates(candidates: Vec<WineCandidate>) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for candidate in candidates {
        let name = candidate.name.trim().to_string();
        if name.is_empty() {
            outcome.rejections.push(FilterDecision {
                candidate_name: "<unnamed>".to_string(),
                reason: "empty name".to_string(),
            });
            continue;
        }

        let supermarket = match Supermarket::parse(&candidate.supermarket) {
            Some(s) => s,
            None => {
                outcome.rejections.push(FilterDecision {
                    candidate_name: name,
                    reason: format!("unknown supermarket: {}", candidate.supermarket),
                });
                continue;
            }
        };

        let wine_type = match WineType::parse(&candidate.wine_type) {
            Some(t) => t,
            None => {
                outcome.rejections.push(FilterDecision {
                    candidate_name: name,
                    reason: format!("unknown wine type: {}", candidate.wine_type),
                });
                continue;
            }
        };

        outcome.wines.push(ValidatedWine {
            name,
            supermarket,
            wine_type,
            rating: candidate.rating.filter(|r| !r.trim().is_empty()),
            description: candidate.description.filter(|d| !d.trim().is_empty()),
        });
    }

    if !outcome.rejections.is_empty() {
        tracing::info!(
            rejected = outcome.rejections.len(),
            kept = outcome.wines.len(),
            "Candidates rejected by allow-list validation"
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, supermarket: &str, wine_type: &str) -> WineCandidate {
        WineCandidate {
            name: name.to_string(),
            supermarket: supermarket.to_string(),
            wine_type: wine_type.to_string(),
            rating: None,
            description: None,
        }
    }

    #[test]
    fn valid_candidate_passes() {
        let outcome = validate_candidates(vec![candidate("AH Malbec", "Albert Heijn", "red")]);
        assert_eq!(outcome.wines.len(), 1);
        assert_eq!(outcome.wines[0].supermarket, Supermarket::AlbertHeijn);
        assert_eq!(outcome.wines[0].wine_type, WineType::Red);
        assert!(outcome.rejections.is_empty());
    }

    #[test]
    fn unknown_supermarket_discards_whole_candidate() {
        let outcome = validate_candidates(vec![candidate("Spar Huiswijn", "Spar", "red")]);
        assert!(outcome.wines.is_empty());
        assert_eq!(outcome.rejections.len(), 1);
        assert!(outcome.rejections[0].reason.contains("Spar"));
    }

    #[test]
    fn unknown_wine_type_discards_whole_candidate() {
        let outcome = validate_candidates(vec![candidate("Oranje", "Jumbo", "orange")]);
        assert!(outcome.wines.is_empty());
        assert!(outcome.rejections[0].reason.contains("orange"));
    }

    #[test]
    fn blank_rating_and_description_become_none() {
        let mut c = candidate("AH Malbec", "Albert Heijn", "red");
        c.rating = Some("  ".to_string());
        c.description = Some(String::new());
        let outcome = validate_candidates(vec![c]);
        assert!(outcome.wines[0].rating.is_none());
        assert!(outcome.wines[0].description.is_none());
    }

    #[test]
    fn mixed_batch_keeps_order_of_valid_entries() {
        let outcome = validate_candidates(vec![
            candidate("Eerste", "Jumbo", "white"),
            candidate("Foute", "Spar", "white"),
            candidate("Tweede", "LIDL", "sparkling"),
        ]);
        assert_eq!(outcome.wines.len(), 2);
        assert_eq!(outcome.wines[0].name, "Eerste");
        assert_eq!(outcome.wines[1].name, "Tweede");
        assert_eq!(outcome.rejections.len(), 1);
    }
}
