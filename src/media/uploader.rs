//! Image upload to a Cloudinary-style unsigned upload endpoint.

use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;

use super::MediaError;

pub trait ImageUploader: Send + Sync {
    /// Upload one image, identified by the owning wine and its index in
    /// the frame plan. Returns a permanent HTTPS URL; never a partial
    /// success.
    fn upload(&self, image: &Path, wine_id: &str, index: usize) -> Result<String, MediaError>;
}

pub struct CloudinaryUploader {
    upload_url: String,
    upload_preset: String,
    client: reqwest::blocking::Client,
}

impl CloudinaryUploader {
    pub fn new(cloud_name: &str, upload_preset: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            upload_url: format!(
                "https://api.cloudinary.com/v1_1/{cloud_name}/image/upload"
            ),
            upload_preset: upload_preset.to_string(),
            client,
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl ImageUploader for CloudinaryUploader {
    fn upload(&self, image: &Path, wine_id: &str, index: usize) -> Result<String, MediaError> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("file", image)?
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", format!("wines/{wine_id}_{index}"));

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MediaError::Upload(format!("status {status}: {body}")));
        }

        let parsed: UploadResponse = response
            .json()
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        Ok(parsed.secure_url)
    }
}

/// Mock uploader that fabricates URLs and records what was uploaded.
pub struct MockUploader {
    uploads: Mutex<Vec<String>>,
    fail: bool,
}

impl MockUploader {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Default for MockUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageUploader for MockUploader {
    fn upload(&self, _image: &Path, wine_id: &str, index: usize) -> Result<String, MediaError> {
        if self.fail {
            return Err(MediaError::Upload("mock failure".into()));
        }
        let url = format!("https://cdn.test/wines/{wine_id}_{index}.jpg");
        self.uploads.lock().unwrap().push(url.clone());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_uploader_returns_https_urls_per_index() {
        let uploader = MockUploader::new();
        let url0 = uploader.upload(Path::new("a.jpg"), "wine-1", 0).unwrap();
        let url1 = uploader.upload(Path::new("b.jpg"), "wine-1", 1).unwrap();
        assert!(url0.starts_with("https://"));
        assert_ne!(url0, url1);
        assert_eq!(uploader.uploaded().len(), 2);
    }
}
