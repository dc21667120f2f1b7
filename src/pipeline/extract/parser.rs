//! Parse the reasoner's JSON response into wine candidates.

use super::types::WineCandidate;
use super::ExtractionError;

/// Parse a chat-completion response into candidates.
///
/// Tolerates a Markdown code fence around the JSON and skips array
/// items that fail to deserialize; a response that is not a JSON array
/// at all is a malformed-response error.
pub fn parse_wine_response(response: &str) -> Result<Vec<WineCandidate>, ExtractionError> {
    let json = strip_code_fence(response);

    let items: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    Ok(items
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

fn strip_code_fence(response: &str) -> &str {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_array() {
        let response = r#"[{"name": "AH Malbec", "supermarket": "Albert Heijn",
            "wine_type": "red", "rating": "8/10", "description": "fruitig"}]"#;
        let candidates = parse_wine_response(response).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "AH Malbec");
        assert_eq!(candidates[0].rating.as_deref(), Some("8/10"));
    }

    #[test]
    fn strips_markdown_code_fence() {
        let response = "```json\n[{\"name\": \"X\", \"supermarket\": \"Jumbo\", \"wine_type\": \"white\"}]\n```";
        let candidates = parse_wine_response(response).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].rating.is_none());
    }

    #[test]
    fn skips_unparseable_items() {
        let response = r#"[
            {"name": "Goede", "supermarket": "Jumbo", "wine_type": "red"},
            {"naam": "zonder verplichte velden"}
        ]"#;
        let candidates = parse_wine_response(response).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn empty_array_is_no_wines() {
        assert!(parse_wine_response("[]").unwrap().is_empty());
        assert!(parse_wine_response("```json\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn non_array_response_is_malformed() {
        assert!(parse_wine_response("sorry, no wines here").is_err());
        assert!(parse_wine_response("{\"name\": \"obj not array\"}").is_err());
    }
}
