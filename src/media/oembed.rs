//! Post metadata via the TikTok oEmbed endpoint.

use serde::Deserialize;

/// Caption/author metadata for a post. All fields best-effort; a
/// network failure yields the empty value rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostMetadata {
    pub caption: String,
    pub author: String,
    pub thumbnail_url: Option<String>,
}

pub trait MetadataFetcher: Send + Sync {
    fn fetch(&self, post_url: &str) -> PostMetadata;
}

pub struct OembedFetcher {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl OembedFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_endpoint("https://www.tiktok.com/oembed", timeout_secs)
    }

    pub fn with_endpoint(endpoint: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Deserialize)]
struct OembedResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author_name: String,
    thumbnail_url: Option<String>,
}

impl MetadataFetcher for OembedFetcher {
    fn fetch(&self, post_url: &str) -> PostMetadata {
        let result = self
            .client
            .get(&self.endpoint)
            .query(&[("url", post_url)])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<OembedResponse>());

        match result {
            Ok(body) => PostMetadata {
                caption: body.title,
                author: body.author_name,
                thumbnail_url: body.thumbnail_url,
            },
            Err(e) => {
                tracing::warn!(url = post_url, error = %e, "oEmbed fetch failed, continuing without caption");
                PostMetadata::default()
            }
        }
    }
}

/// Mock metadata fetcher returning a fixed caption/author.
pub struct MockMetadataFetcher {
    metadata: PostMetadata,
}

impl MockMetadataFetcher {
    pub fn new(caption: &str, author: &str) -> Self {
        Self {
            metadata: PostMetadata {
                caption: caption.to_string(),
                author: author.to_string(),
                thumbnail_url: None,
            },
        }
    }

    pub fn empty() -> Self {
        Self {
            metadata: PostMetadata::default(),
        }
    }
}

impl MetadataFetcher for MockMetadataFetcher {
    fn fetch(&self, _post_url: &str) -> PostMetadata {
        self.metadata.clone()
    }
}
