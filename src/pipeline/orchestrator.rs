//! End-to-end pipeline: one run per post URL, batches strictly
//! sequential.
//!
//! Stage order per URL: dedup check → metadata → download → transcript
//! refinement → wine extraction → validation → mention localization →
//! frame planning → frame extraction → image upload → persist → audit
//! record → cleanup. A stage failure terminates that URL's run and the
//! batch moves on; only transcription retries internally.

use std::path::Path;

use rusqlite::Connection;

use crate::asr::{RefinerConfig, SpeechToText, TranscriptRefiner};
use crate::config::Settings;
use crate::core_state::ScrapeTracker;
use chrono::Utc;

use crate::db::repository::{
    allocate_duplicate_url, find_wine_by_post_url, insert_processed_video, insert_wine,
    mark_source_scraped,
};
use crate::lexicon::WineLexicon;
use crate::media::{
    frame_is_usable, frame_output_path, DownloadedMedia, FrameExtractor, ImageUploader,
    MediaDownloader, MetadataFetcher,
};
use crate::models::{ProcessedVideo, Source, TranscriptionStatus, Wine};
use crate::pipeline::extract::{
    build_extraction_prompt, parse_wine_response, validate_candidates, ChatCompleter,
    ValidatedWine, SYSTEM_PROMPT,
};
use crate::pipeline::timing::{find_mention, frame_times_for};
use crate::pipeline::PipelineError;

/// Combined caption + transcript shorter than this is not worth a
/// reasoner call.
const MIN_EXTRACTION_TEXT_CHARS: usize = 10;

/// External collaborators, injected so tests can run the full pipeline
/// against mocks.
pub struct Collaborators {
    pub metadata: Box<dyn MetadataFetcher>,
    pub downloader: Box<dyn MediaDownloader>,
    pub asr: Box<dyn SpeechToText>,
    pub reasoner: Box<dyn ChatCompleter>,
    pub frames: Box<dyn FrameExtractor>,
    pub uploader: Box<dyn ImageUploader>,
}

impl Collaborators {
    /// Production collaborators wired from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            metadata: Box::new(crate::media::OembedFetcher::new(settings.oembed_timeout_secs)),
            downloader: Box::new(crate::media::YtDlpDownloader::new(
                &settings.ytdlp_bin,
                &settings.ffmpeg_bin,
                settings.media_dir(),
            )),
            asr: Box::new(crate::asr::WhisperApiClient::new(
                &settings.openai_base_url,
                &settings.openai_api_key,
                &settings.asr_model,
                settings.asr_timeout_secs,
            )),
            reasoner: Box::new(crate::pipeline::extract::OpenAiChatClient::new(
                &settings.openai_base_url,
                &settings.openai_api_key,
                &settings.reasoner_model,
                settings.reasoner_timeout_secs,
            )),
            frames: Box::new(crate::media::FfmpegFrameExtractor::new(&settings.ffmpeg_bin)),
            uploader: Box::new(crate::media::CloudinaryUploader::new(
                &settings.cloudinary_cloud_name,
                &settings.cloudinary_upload_preset,
                settings.reasoner_timeout_secs,
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after extraction; no frames, uploads or writes.
    pub dry_run: bool,
    /// Persist even when the post URL already has a wine, under a
    /// disambiguated URL.
    pub allow_duplicate: bool,
}

/// Terminal state of one URL's run.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlOutcome {
    Persisted { wine_name: String },
    SkippedDuplicate,
    NoWineFound,
    DryRun { wine_name: Option<String> },
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub attempted: usize,
    pub persisted: usize,
    pub skipped_duplicates: usize,
    pub no_wine: usize,
    pub dry_runs: usize,
    pub failed: usize,
}

pub struct Orchestrator<'a> {
    collaborators: Collaborators,
    lexicon: &'a WineLexicon,
    settings: &'a Settings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        collaborators: Collaborators,
        lexicon: &'a WineLexicon,
        settings: &'a Settings,
    ) -> Self {
        Self {
            collaborators,
            lexicon,
            settings,
        }
    }

    /// Process a batch of post URLs sequentially. Failures are isolated
    /// per URL; the summary reports what happened to each.
    pub fn run_batch(
        &self,
        conn: &Connection,
        urls: &[String],
        handle: &str,
        options: &RunOptions,
        tracker: Option<&ScrapeTracker>,
    ) -> BatchSummary {
        if let Some(tracker) = tracker {
            tracker.start(urls.len());
        }

        let mut summary = BatchSummary::default();
        self.process_into(conn, urls, handle, options, tracker, &mut summary);

        if let Some(tracker) = tracker {
            tracker.finish();
        }
        tracing::info!(
            attempted = summary.attempted,
            persisted = summary.persisted,
            failed = summary.failed,
            "Batch complete"
        );
        summary
    }

    /// Run the registry-driven batch: every URL of every source, with
    /// per-source counters stamped afterwards.
    pub fn run_sources(
        &self,
        conn: &Connection,
        sources: &[Source],
        options: &RunOptions,
        tracker: Option<&ScrapeTracker>,
    ) -> BatchSummary {
        let total: usize = sources.iter().map(|s| s.video_urls.len()).sum();
        if let Some(tracker) = tracker {
            tracker.start(total);
        }

        let mut summary = BatchSummary::default();
        for source in sources {
            let persisted_before = summary.persisted;
            self.process_into(
                conn,
                &source.video_urls,
                &source.handle,
                options,
                tracker,
                &mut summary,
            );

            let found = (summary.persisted - persisted_before) as u32;
            if let Err(e) = mark_source_scraped(
                conn,
                &source.handle,
                source.video_urls.len() as u32,
                found,
                Utc::now(),
            ) {
                tracing::warn!(handle = %source.handle, error = %e, "Source counter update failed");
            }
        }

        if let Some(tracker) = tracker {
            tracker.finish();
        }
        tracing::info!(
            sources = sources.len(),
            attempted = summary.attempted,
            persisted = summary.persisted,
            failed = summary.failed,
            "Scheduled batch complete"
        );
        summary
    }

    fn process_into(
        &self,
        conn: &Connection,
        urls: &[String],
        handle: &str,
        options: &RunOptions,
        tracker: Option<&ScrapeTracker>,
        summary: &mut BatchSummary,
    ) {
        for url in urls {
            summary.attempted += 1;
            match self.process_url(conn, url, handle, options) {
                Ok(outcome) => {
                    let wines = match &outcome {
                        UrlOutcome::Persisted { .. } => 1,
                        _ => 0,
                    };
                    if let Some(tracker) = tracker {
                        tracker.record_processed(wines);
                    }
                    match outcome {
                        UrlOutcome::Persisted { wine_name } => {
                            tracing::info!(url = %url, wine = %wine_name, "Wine persisted");
                            summary.persisted += 1;
                        }
                        UrlOutcome::SkippedDuplicate => summary.skipped_duplicates += 1,
                        UrlOutcome::NoWineFound => summary.no_wine += 1,
                        UrlOutcome::DryRun { .. } => summary.dry_runs += 1,
                    }
                }
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "Pipeline run failed");
                    if let Some(tracker) = tracker {
                        tracker.record_failed();
                    }
                    summary.failed += 1;
                }
            }
        }
    }

    /// Run the full pipeline for one post URL.
    pub fn process_url(
        &self,
        conn: &Connection,
        post_url: &str,
        handle: &str,
        options: &RunOptions,
    ) -> Result<UrlOutcome, PipelineError> {
        if !options.allow_duplicate && find_wine_by_post_url(conn, post_url)?.is_some() {
            tracing::debug!(url = post_url, "Already processed, skipping");
            return Ok(UrlOutcome::SkippedDuplicate);
        }

        let metadata = self.collaborators.metadata.fetch(post_url);
        let media = self.collaborators.downloader.download(post_url)?;

        let result = self.process_downloaded(conn, post_url, handle, options, &metadata.caption, &media);

        self.collaborators.downloader.cleanup(&media);
        result
    }

    fn process_downloaded(
        &self,
        conn: &Connection,
        post_url: &str,
        handle: &str,
        options: &RunOptions,
        caption: &str,
        media: &DownloadedMedia,
    ) -> Result<UrlOutcome, PipelineError> {
        let refiner = TranscriptRefiner::new(
            self.collaborators.asr.as_ref(),
            self.lexicon,
            RefinerConfig::from_settings(self.settings),
        );
        let transcription = refiner.transcribe(&media.audio_path);

        let mut audit = ProcessedVideo::new(post_url, handle);
        audit.caption = Some(caption.to_string()).filter(|c| !c.is_empty());
        audit.transcript =
            Some(transcription.text.clone()).filter(|t| !t.is_empty());
        audit.transcription_status = transcription.status;
        audit.asr_metrics = Some(transcription.metrics.clone());
        audit.error = transcription.error.clone();

        let enough_text = has_enough_text(caption, &transcription.text);
        if transcription.status == TranscriptionStatus::Failed && !enough_text {
            if !options.dry_run {
                insert_processed_video(conn, &audit)?;
            }
            return Err(PipelineError::Transcription(
                transcription
                    .error
                    .clone()
                    .unwrap_or_else(|| "no transcript and no caption".into()),
            ));
        }

        if !enough_text {
            if !options.dry_run {
                insert_processed_video(conn, &audit)?;
            }
            return Ok(UrlOutcome::NoWineFound);
        }

        let wine = match self.extract_wine(caption, &transcription.text, &mut audit)? {
            Some(wine) => wine,
            None => {
                if !options.dry_run {
                    insert_processed_video(conn, &audit)?;
                }
                return Ok(UrlOutcome::NoWineFound);
            }
        };

        if options.dry_run {
            tracing::info!(url = post_url, wine = %wine.name, "Dry run, not persisting");
            return Ok(UrlOutcome::DryRun {
                wine_name: Some(wine.name),
            });
        }

        let (mention, method) =
            find_mention(&wine.name, &transcription.segments, &self.settings.signal_words);
        let plan = frame_times_for(mention, &method, transcription.duration_secs);
        tracing::debug!(
            url = post_url,
            method = %method.as_label(),
            timestamp = ?mention,
            candidates = plan.len(),
            "Frame plan ready"
        );

        let record = self.persist_wine(conn, post_url, handle, options, wine, media, &plan)?;
        audit.wines_found = 1;
        insert_processed_video(conn, &audit)?;

        Ok(UrlOutcome::Persisted {
            wine_name: record.name,
        })
    }

    /// Reasoner call + allow-list validation, with the single-wine cap.
    /// A malformed reasoner response is "no entity extracted", not an
    /// error.
    fn extract_wine(
        &self,
        caption: &str,
        transcript: &str,
        audit: &mut ProcessedVideo,
    ) -> Result<Option<ValidatedWine>, PipelineError> {
        let prompt = build_extraction_prompt(caption, transcript);
        let response = self.collaborators.reasoner.complete(SYSTEM_PROMPT, &prompt)?;

        let candidates = match parse_wine_response(&response) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable reasoner response, treating as no wines");
                return Ok(None);
            }
        };

        let mut outcome = validate_candidates(candidates);
        audit.filter_decisions.append(&mut outcome.rejections);

        if outcome.wines.len() > 1 {
            tracing::info!(
                dropped = outcome.wines.len() - 1,
                "Multiple wines extracted, keeping the first"
            );
        }
        Ok(outcome.wines.into_iter().next())
    }

    #[allow(clippy::too_many_arguments)]
    fn persist_wine(
        &self,
        conn: &Connection,
        post_url: &str,
        handle: &str,
        options: &RunOptions,
        wine: ValidatedWine,
        media: &DownloadedMedia,
        plan: &[f64],
    ) -> Result<Wine, PipelineError> {
        let stored_url = if options.allow_duplicate
            && find_wine_by_post_url(conn, post_url)?.is_some()
        {
            allocate_duplicate_url(conn, post_url)?
        } else {
            post_url.to_string()
        };

        let mut record = Wine::new(
            wine.name,
            wine.supermarket,
            wine.wine_type,
            wine.rating,
            wine.description,
            vec![],
            handle.to_string(),
            stored_url,
        );
        if let Some(date) = media.published_at {
            if let Some(found) = date.and_hms_opt(0, 0, 0) {
                record.date_found = found.and_utc();
            }
        }

        let frames_dir = self.settings.frames_dir().join(record.id.to_string());
        record.image_urls = self.capture_images(&record.id.to_string(), media, plan, &frames_dir);

        // The scratch frames must go even when the insert fails.
        let inserted = insert_wine(conn, &record);
        let _ = std::fs::remove_dir_all(&frames_dir);
        inserted?;
        Ok(record)
    }

    /// Extract frames for the plan, keep the usable ones, upload them.
    /// All failures here degrade to fewer images, never to a run
    /// failure.
    fn capture_images(
        &self,
        wine_id: &str,
        media: &DownloadedMedia,
        plan: &[f64],
        frames_dir: &Path,
    ) -> Vec<String> {
        let mut urls = Vec::new();
        for (index, &timestamp) in plan.iter().enumerate() {
            let output = frame_output_path(frames_dir, index);
            match self
                .collaborators
                .frames
                .extract(&media.video_path, timestamp, &output)
            {
                Ok(()) if frame_is_usable(&output) => {
                    match self.collaborators.uploader.upload(&output, wine_id, urls.len()) {
                        Ok(url) => urls.push(url),
                        Err(e) => {
                            tracing::warn!(timestamp, error = %e, "Image upload failed")
                        }
                    }
                }
                Ok(()) => {
                    tracing::debug!(timestamp, "Frame too small, likely blank; skipping");
                }
                Err(e) => {
                    tracing::warn!(timestamp, error = %e, "Frame extraction failed");
                }
            }
        }
        urls
    }
}

fn has_enough_text(caption: &str, transcript: &str) -> bool {
    caption.trim().chars().count() + transcript.trim().chars().count()
        >= MIN_EXTRACTION_TEXT_CHARS
}
