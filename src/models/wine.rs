//! The persisted wine record — one per source post URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Supermarket, WineType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wine {
    pub id: Uuid,
    pub name: String,
    pub supermarket: Supermarket,
    pub wine_type: WineType,
    /// Free-text recommendation strength ("8/10", "echte aanrader", ...).
    pub rating: Option<String>,
    pub description: Option<String>,
    /// Uploaded still frames, best candidate first. Empty means no frame
    /// survived extraction — never null.
    pub image_urls: Vec<String>,
    /// Attribution, e.g. "wijnkoningin_tiktok".
    pub influencer_source: String,
    /// Canonical source URL. Primary deduplication key.
    pub post_url: String,
    pub date_found: DateTime<Utc>,
    pub in_stock: Option<bool>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Wine {
    /// Build a new record from validated extraction output.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        supermarket: Supermarket,
        wine_type: WineType,
        rating: Option<String>,
        description: Option<String>,
        image_urls: Vec<String>,
        influencer_source: String,
        post_url: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            supermarket,
            wine_type,
            rating,
            description,
            image_urls,
            influencer_source,
            post_url,
            date_found: Utc::now(),
            in_stock: None,
            last_checked: None,
        }
    }
}
