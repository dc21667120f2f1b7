use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;

use super::{AsrError, AsrResponse, SpeechToText, TranscriptSegment};

/// Whisper-compatible transcription client (OpenAI audio API shape).
pub struct WhisperApiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl WhisperApiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }
}

/// Response body from /v1/audio/transcriptions with verbose_json.
#[derive(Deserialize)]
struct VerboseTranscription {
    text: String,
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

impl SpeechToText for WhisperApiClient {
    fn transcribe(
        &self,
        audio: &Path,
        language: &str,
        prompt: Option<&str>,
    ) -> Result<AsrResponse, AsrError> {
        let url = format!("{}/v1/audio/transcriptions", self.base_url);

        let mut form = reqwest::blocking::multipart::Form::new()
            .file("file", audio)?
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .text("response_format", "verbose_json");
        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt.to_string());
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    AsrError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    AsrError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    AsrError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AsrError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: VerboseTranscription = response
            .json()
            .map_err(|e| AsrError::ResponseParsing(e.to_string()))?;

        Ok(AsrResponse {
            text: parsed.text,
            duration: parsed.duration,
            segments: parsed
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text,
                })
                .collect(),
        })
    }
}

/// Mock speech-to-text engine for testing. Returns queued responses in
/// order and records the prompt of every call, so two-pass behavior can
/// be asserted precisely.
pub struct MockSpeechToText {
    responses: Mutex<Vec<Result<AsrResponse, AsrError>>>,
    prompts: Mutex<Vec<Option<String>>>,
}

impl MockSpeechToText {
    pub fn new(responses: Vec<Result<AsrResponse, AsrError>>) -> Self {
        let mut queue = responses;
        queue.reverse();
        Self {
            responses: Mutex::new(queue),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_prompts(&self) -> Vec<Option<String>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl SpeechToText for MockSpeechToText {
    fn transcribe(
        &self,
        _audio: &Path,
        _language: &str,
        prompt: Option<&str>,
    ) -> Result<AsrResponse, AsrError> {
        self.prompts
            .lock()
            .unwrap()
            .push(prompt.map(|p| p.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(AsrError::Connection("mock queue exhausted".into())))
    }
}
