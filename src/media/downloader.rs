//! Media download via yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;

use super::MediaError;

/// Local artifacts for one downloaded post.
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    /// Extracted audio track (mp3), for transcription.
    pub audio_path: PathBuf,
    /// Full video (mp4), for frame extraction.
    pub video_path: PathBuf,
    /// Original publish date when yt-dlp reports one.
    pub published_at: Option<NaiveDate>,
}

pub trait MediaDownloader: Send + Sync {
    fn download(&self, post_url: &str) -> Result<DownloadedMedia, MediaError>;

    /// Remove the local artifacts. Idempotent: already-removed files are
    /// not an error.
    fn cleanup(&self, media: &DownloadedMedia);
}

pub struct YtDlpDownloader {
    ytdlp_bin: String,
    ffmpeg_bin: String,
    download_dir: PathBuf,
}

impl YtDlpDownloader {
    pub fn new(ytdlp_bin: &str, ffmpeg_bin: &str, download_dir: PathBuf) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.to_string(),
            ffmpeg_bin: ffmpeg_bin.to_string(),
            download_dir,
        }
    }

    /// Run one yt-dlp invocation and return its stdout.
    fn run_ytdlp(&self, post_url: &str, args: &[&str], expected: &Path) -> Result<String, MediaError> {
        let output = Command::new(&self.ytdlp_bin)
            .args(["--quiet", "--no-warnings"])
            .args(["--ffmpeg-location", &self.ffmpeg_bin])
            .args(args)
            .arg(post_url)
            .output()?;

        if !output.status.success() {
            return Err(MediaError::Download {
                url: post_url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !expected.exists() {
            return Err(MediaError::Download {
                url: post_url.to_string(),
                reason: format!("expected output missing: {}", expected.display()),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse the date yt-dlp printed for `upload_date` (last non-empty
/// stdout line, `YYYYMMDD`). yt-dlp prints `NA` for missing fields;
/// that simply fails to parse.
fn parse_upload_date(stdout: &str) -> Option<NaiveDate> {
    let line = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last()?;
    NaiveDate::parse_from_str(line, "%Y%m%d").ok()
}

impl MediaDownloader for YtDlpDownloader {
    fn download(&self, post_url: &str) -> Result<DownloadedMedia, MediaError> {
        std::fs::create_dir_all(&self.download_dir)?;

        let video_id = post_url
            .rsplit('/')
            .find(|part| !part.is_empty())
            .unwrap_or("video")
            .split(['?', '#'])
            .next()
            .unwrap_or("video")
            .to_string();

        let audio_path = self.download_dir.join(format!("{video_id}.mp3"));
        let video_path = self.download_dir.join(format!("{video_id}.mp4"));

        tracing::debug!(url = post_url, video_id = %video_id, "Downloading media");

        // Upload date rides along with the audio call. --print implies
        // --simulate; --no-simulate keeps the download.
        let audio_template = audio_path.with_extension("%(ext)s");
        let audio_stdout = self.run_ytdlp(
            post_url,
            &[
                "--format",
                "bestaudio/best",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
                "--print",
                "upload_date",
                "--no-simulate",
                "--output",
                &audio_template.to_string_lossy(),
            ],
            &audio_path,
        )?;

        let video_template = video_path.with_extension("%(ext)s");
        self.run_ytdlp(
            post_url,
            &[
                "--format",
                "mp4/best",
                "--output",
                &video_template.to_string_lossy(),
            ],
            &video_path,
        )?;

        Ok(DownloadedMedia {
            audio_path,
            video_path,
            published_at: parse_upload_date(&audio_stdout),
        })
    }

    fn cleanup(&self, media: &DownloadedMedia) {
        for path in [&media.audio_path, &media.video_path] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Temp file cleanup failed");
                }
            }
            // Normalized sibling from audio preprocessing, if present.
            let _ = std::fs::remove_file(path.with_extension("norm.wav"));
        }
    }
}

/// Mock downloader that fabricates local files instead of calling
/// yt-dlp.
pub struct MockDownloader {
    dir: PathBuf,
    fail: bool,
}

impl MockDownloader {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, fail: false }
    }

    pub fn failing(dir: PathBuf) -> Self {
        Self { dir, fail: true }
    }
}

impl MediaDownloader for MockDownloader {
    fn download(&self, post_url: &str) -> Result<DownloadedMedia, MediaError> {
        if self.fail {
            return Err(MediaError::Download {
                url: post_url.to_string(),
                reason: "mock failure".into(),
            });
        }
        std::fs::create_dir_all(&self.dir)?;
        let audio_path = self.dir.join("mock.mp3");
        let video_path = self.dir.join("mock.mp4");
        std::fs::write(&audio_path, b"audio")?;
        std::fs::write(&video_path, b"video")?;
        Ok(DownloadedMedia {
            audio_path,
            video_path,
            published_at: None,
        })
    }

    fn cleanup(&self, media: &DownloadedMedia) {
        let _ = std::fs::remove_file(&media.audio_path);
        let _ = std::fs::remove_file(&media.video_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_download_creates_and_cleanup_removes() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = MockDownloader::new(dir.path().to_path_buf());
        let media = downloader.download("https://t/v/1").unwrap();
        assert!(media.audio_path.exists());
        assert!(media.video_path.exists());

        downloader.cleanup(&media);
        assert!(!media.audio_path.exists());
        // Second cleanup is a no-op, not a panic.
        downloader.cleanup(&media);
    }

    #[test]
    fn upload_date_parses_from_printed_output() {
        assert_eq!(
            parse_upload_date("20240131\n"),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        // yt-dlp prints NA when the field is unavailable.
        assert_eq!(parse_upload_date("NA\n"), None);
        assert_eq!(parse_upload_date(""), None);
        // Download progress noise before the printed field is ignored.
        assert_eq!(
            parse_upload_date("something else\n20231224\n"),
            NaiveDate::from_ymd_opt(2023, 12, 24)
        );
    }

    #[test]
    fn missing_ytdlp_binary_is_a_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            YtDlpDownloader::new("/nonexistent/yt-dlp", "ffmpeg", dir.path().to_path_buf());
        let result = downloader.download("https://www.tiktok.com/@x/video/123");
        assert!(result.is_err());
    }
}
