//! Source registry: influencer profiles whose posts the daily batch run
//! processes. URLs are curated by hand; discovery of new posts is out of
//! scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub handle: String,
    pub is_active: bool,
    pub video_urls: Vec<String>,
    pub last_scraped: Option<DateTime<Utc>>,
    pub total_videos_processed: u32,
    pub total_wines_found: u32,
}

impl Source {
    pub fn new(handle: &str, video_urls: Vec<String>) -> Self {
        Self {
            handle: handle.to_string(),
            is_active: true,
            video_urls,
            last_scraped: None,
            total_videos_processed: 0,
            total_wines_found: 0,
        }
    }
}
