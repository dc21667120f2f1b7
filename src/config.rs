//! Process configuration.
//!
//! All environment variables are read exactly once, at startup, into an
//! immutable [`Settings`] struct that is threaded into component
//! constructors. Nothing else in the crate reads the environment.

use std::env;
use std::path::PathBuf;

pub const APP_NAME: &str = "Vinoscout";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,vinoscout=debug".to_string()
}

/// Cue words that indicate the presenter is showing the bottle while
/// speaking ("deze wijn", "kijk", "ik heb deze gekocht"). Dutch, because
/// the source videos are Dutch supermarket wine reviews.
pub const DEFAULT_SIGNAL_WORDS: &[&str] = &[
    "deze", "dit", "hier", "kijk", "zie", "bekijk", "heb", "gekocht", "gevonden",
];

/// Immutable runtime configuration, resolved once at process start.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root data directory (database, temp downloads, frames).
    pub data_dir: PathBuf,
    /// Optional lexicon file override. `None` means the bundled lexicon.
    pub lexicon_path: Option<PathBuf>,

    // ── External collaborators ──────────────────────────────
    /// Base URL of the OpenAI-compatible API used for both ASR and the
    /// wine reasoner.
    pub openai_base_url: String,
    pub openai_api_key: String,
    pub asr_model: String,
    pub reasoner_model: String,
    /// Language hint passed to the ASR engine.
    pub language: String,
    pub asr_timeout_secs: u64,
    pub reasoner_timeout_secs: u64,
    pub oembed_timeout_secs: u64,

    /// Cloudinary-style unsigned upload target.
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,

    /// External tool binaries; overridable for non-PATH installs.
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub ytdlp_bin: String,

    // ── Pipeline tuning ─────────────────────────────────────
    /// Feature switch for the second ASR pass (on by default; off is for
    /// A/B cost experiments).
    pub asr_two_pass: bool,
    /// Extra full-transcription attempts after the first failure.
    pub asr_retry_count: u32,
    /// Lexicon terms in the pass-1 prompt.
    pub asr_pass1_terms: usize,
    /// Lexicon terms in the enriched pass-2 prompt.
    pub asr_pass2_terms: usize,
    /// Hard ceiling on prompt terms regardless of what a caller asks for.
    pub max_prompt_terms: Option<usize>,
    /// Presentation cue words for mention timing.
    pub signal_words: Vec<String>,

    // ── API server ──────────────────────────────────────────
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    /// Bearer token required for admin mutations. `None` disables the
    /// admin surface entirely.
    pub admin_token: Option<String>,
    /// Run the daily scheduled batch when serving.
    pub scheduler_enabled: bool,
}

impl Settings {
    /// Resolve settings from the environment.
    pub fn from_env() -> Self {
        let data_dir = env::var("VINOSCOUT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Self {
            data_dir,
            lexicon_path: env::var("VINOSCOUT_LEXICON_PATH").ok().map(PathBuf::from),

            openai_base_url: env_or("VINOSCOUT_OPENAI_BASE_URL", "https://api.openai.com"),
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            asr_model: env_or("VINOSCOUT_ASR_MODEL", "whisper-1"),
            reasoner_model: env_or("VINOSCOUT_REASONER_MODEL", "gpt-4o-mini"),
            language: env_or("VINOSCOUT_LANGUAGE", "nl"),
            asr_timeout_secs: env_parsed("VINOSCOUT_ASR_TIMEOUT_SECS", 300),
            reasoner_timeout_secs: env_parsed("VINOSCOUT_REASONER_TIMEOUT_SECS", 120),
            oembed_timeout_secs: env_parsed("VINOSCOUT_OEMBED_TIMEOUT_SECS", 10),

            cloudinary_cloud_name: env_or("CLOUDINARY_CLOUD_NAME", ""),
            cloudinary_upload_preset: env_or("CLOUDINARY_UPLOAD_PRESET", ""),

            ffmpeg_bin: env_or("VINOSCOUT_FFMPEG", "ffmpeg"),
            ffprobe_bin: env_or("VINOSCOUT_FFPROBE", "ffprobe"),
            ytdlp_bin: env_or("VINOSCOUT_YTDLP", "yt-dlp"),

            asr_two_pass: env_parsed("VINOSCOUT_ASR_TWO_PASS", true),
            asr_retry_count: env_parsed("VINOSCOUT_ASR_RETRY_COUNT", 1),
            asr_pass1_terms: env_parsed("VINOSCOUT_ASR_PASS1_TERMS", 80),
            asr_pass2_terms: env_parsed("VINOSCOUT_ASR_PASS2_TERMS", 60),
            max_prompt_terms: env::var("VINOSCOUT_MAX_PROMPT_TERMS")
                .ok()
                .and_then(|v| v.parse().ok()),
            signal_words: env::var("VINOSCOUT_SIGNAL_WORDS")
                .map(|v| v.split(',').map(|s| s.trim().to_lowercase()).collect())
                .unwrap_or_else(|_| {
                    DEFAULT_SIGNAL_WORDS.iter().map(|s| s.to_string()).collect()
                }),

            bind_addr: env_or("VINOSCOUT_BIND_ADDR", "0.0.0.0:8000"),
            cors_origins: env_or("VINOSCOUT_CORS_ORIGINS", "http://localhost:5173")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            admin_token: env::var("VINOSCOUT_ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            scheduler_enabled: env_parsed("VINOSCOUT_SCHEDULER_ENABLED", true),
        }
    }

    /// Test settings: temp-friendly defaults, no external credentials.
    pub fn for_tests(data_dir: PathBuf) -> Self {
        let mut s = Self::from_env();
        s.data_dir = data_dir;
        s.openai_api_key = String::new();
        s.admin_token = Some("test-token".to_string());
        s
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("vinoscout.db")
    }

    /// Scratch space for downloaded media; safe to wipe between runs.
    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("tmp").join("media")
    }

    /// Scratch space for extracted still frames.
    pub fn frames_dir(&self) -> PathBuf {
        self.data_dir.join("tmp").join("frames")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_under_data_dir() {
        let s = Settings::for_tests(PathBuf::from("/tmp/vs-test"));
        assert!(s.database_path().starts_with("/tmp/vs-test"));
        assert!(s.database_path().ends_with("vinoscout.db"));
    }

    #[test]
    fn default_signal_words_are_lowercase() {
        for w in DEFAULT_SIGNAL_WORDS {
            assert_eq!(*w, w.to_lowercase());
        }
    }

    #[test]
    fn media_and_frames_dirs_are_distinct() {
        let s = Settings::for_tests(PathBuf::from("/tmp/vs-test"));
        assert_ne!(s.media_dir(), s.frames_dir());
    }
}
