//! Audio probing and preprocessing via ffmpeg/ffprobe subprocesses.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::AsrError;

/// Duration of a media file in seconds.
///
/// Asks ffprobe first; if that fails for any reason, falls back to a
/// rough size-based estimate (one minute per megabyte) so downstream
/// frame planning always has a positive duration to work with.
pub fn media_duration_secs(ffprobe_bin: &str, path: &Path) -> f64 {
    match probe_duration(ffprobe_bin, path) {
        Ok(duration) if duration > 0.0 => duration,
        Ok(_) | Err(_) => {
            let estimate = size_based_estimate(path);
            tracing::warn!(
                path = %path.display(),
                estimate_secs = estimate,
                "ffprobe failed, estimating duration from file size"
            );
            estimate
        }
    }
}

fn probe_duration(ffprobe_bin: &str, path: &Path) -> Result<f64, AsrError> {
    let output = Command::new(ffprobe_bin)
        .args(["-v", "error", "-show_entries", "format=duration"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(AsrError::ResponseParsing(format!(
            "ffprobe exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .trim()
        .parse::<f64>()
        .map_err(|e| AsrError::ResponseParsing(format!("unparseable ffprobe duration: {e}")))
}

fn size_based_estimate(path: &Path) -> f64 {
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    (bytes as f64 / (1024.0 * 1024.0)) * 60.0
}

/// Loudness-normalize audio for transcription: mono, 16 kHz, EBU R128
/// loudnorm. Writes a sibling `.norm.wav` next to the input.
pub fn normalize_loudness(ffmpeg_bin: &str, input: &Path) -> Result<PathBuf, AsrError> {
    let output_path = input.with_extension("norm.wav");

    let output = Command::new(ffmpeg_bin)
        .arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-ac", "1", "-ar", "16000"])
        .args(["-af", "loudnorm=I=-16:TP=-1.5:LRA=11"])
        .args(["-c:a", "pcm_s16le"])
        .arg(&output_path)
        .output()?;

    if !output.status.success() || !output_path.exists() {
        return Err(AsrError::ResponseParsing(format!(
            "ffmpeg loudnorm exited with {}",
            output.status
        )));
    }

    Ok(output_path)
}

/// Best-effort preprocessing: normalized audio when ffmpeg cooperates,
/// the untouched input otherwise. Transcribing unnormalized audio beats
/// transcribing nothing.
pub fn preprocess_for_asr(ffmpeg_bin: &str, input: &Path) -> PathBuf {
    match normalize_loudness(ffmpeg_bin, input) {
        Ok(normalized) => normalized,
        Err(e) => {
            tracing::warn!(
                path = %input.display(),
                error = %e,
                "Audio normalization failed, transcribing original"
            );
            input.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_estimate_for_missing_file_is_zero() {
        let path = PathBuf::from("/nonexistent/audio.mp3");
        assert_eq!(size_based_estimate(&path), 0.0);
    }

    #[test]
    fn duration_estimate_scales_with_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.mp3");
        // 2 MiB -> 120s estimate
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();
        let estimate = size_based_estimate(&path);
        assert!((estimate - 120.0).abs() < 0.01);
    }

    #[test]
    fn preprocess_falls_back_when_ffmpeg_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.mp3");
        std::fs::write(&path, b"not audio").unwrap();
        let result = preprocess_for_asr("/nonexistent/ffmpeg", &path);
        assert_eq!(result, path);
    }
}
