use serde::Deserialize;

use super::ExtractionError;
use crate::models::{Supermarket, WineType};

/// Chat-completion reasoner abstraction (allows mocking).
pub trait ChatCompleter: Send + Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String, ExtractionError>;
}

/// A wine candidate as the reasoner returned it, before validation.
/// Category fields stay raw strings here; the validator owns the
/// allow-list decision.
#[derive(Debug, Clone, Deserialize)]
pub struct WineCandidate {
    pub name: String,
    pub supermarket: String,
    pub wine_type: String,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A candidate that passed allow-list validation.
#[derive(Debug, Clone)]
pub struct ValidatedWine {
    pub name: String,
    pub supermarket: Supermarket,
    pub wine_type: WineType,
    pub rating: Option<String>,
    pub description: Option<String>,
}
