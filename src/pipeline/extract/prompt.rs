//! Reasoner prompts for wine extraction.

use crate::models::{Supermarket, WineType};

pub const SYSTEM_PROMPT: &str = "You are a wine data extraction expert. \
You extract structured wine information from Dutch text about supermarket wines. \
You always return valid JSON and nothing else.";

/// Build the extraction prompt for one video's caption + transcript.
///
/// The allow-lists are enumerated inline so the reasoner has no excuse
/// to invent a retailer; the validator still enforces them afterwards.
pub fn build_extraction_prompt(caption: &str, transcript: &str) -> String {
    let supermarkets: Vec<&str> = Supermarket::ALL.iter().map(|s| s.as_str()).collect();
    let wine_types: Vec<&str> = WineType::ALL.iter().map(|t| t.as_str()).collect();

    format!(
        r#"Extract ALL wine recommendations from this Dutch text about supermarket wines.

Caption: {caption}

Transcript: {transcript}

For each wine mentioned, extract:
1. Exact wine name (brand, variety, year if mentioned)
2. Supermarket where it's sold (must be one of: {supermarkets})
3. Wine type (must be one of: {wine_types})
4. Rating or recommendation (e.g. "8/10", "aanrader", "avoid"), or null
5. Brief description of what the reviewer said, or null

Return ONLY a valid JSON array of objects with these exact keys:
name, supermarket, wine_type, rating, description
If no wines are found, return an empty array: []

Example output:
[
  {{
    "name": "Albert Heijn Huiswijn Malbec 2022",
    "supermarket": "Albert Heijn",
    "wine_type": "red",
    "rating": "8/10",
    "description": "Great value for money, fruity notes"
  }}
]"#,
        supermarkets = supermarkets.join(", "),
        wine_types = wine_types.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_enumerates_both_allow_lists() {
        let prompt = build_extraction_prompt("caption", "transcript");
        for s in Supermarket::ALL {
            assert!(prompt.contains(s.as_str()), "missing {}", s.as_str());
        }
        for t in WineType::ALL {
            assert!(prompt.contains(t.as_str()), "missing {}", t.as_str());
        }
        assert!(prompt.contains("caption"));
        assert!(prompt.contains("transcript"));
    }
}
