//! Daily batch scheduling and background batch execution.
//!
//! The blocking pipeline runs inside `spawn_blocking` on a fresh SQLite
//! connection, so API handlers keep responding while a batch is live.
//! Concurrent batch runs are prevented per process by the tracker; the
//! unique index on `wines.post_url` is the only cross-process guard.

use chrono::{Duration as ChronoDuration, NaiveTime, Utc};

use crate::core_state::AppState;
use crate::db::repository::list_active_sources;
use crate::db::sqlite::open_database;
use crate::pipeline::{Collaborators, Orchestrator, RunOptions};

/// Scheduled batches fire at 06:00 UTC.
fn daily_run_time() -> NaiveTime {
    NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default()
}

/// Kick off a batch run over all active sources in the background.
/// Returns `false` without starting when a run is already live.
pub fn spawn_batch(state: &AppState) -> bool {
    if state.tracker.is_running() {
        tracing::warn!("Batch trigger ignored, a run is already in progress");
        return false;
    }

    let settings = state.settings.clone();
    let lexicon = state.lexicon.clone();
    let tracker = state.tracker.clone();

    tokio::task::spawn_blocking(move || {
        // Mark running before any slow work so a second trigger in the
        // same tick is refused.
        tracker.start(0);

        let conn = match open_database(&settings.database_path()) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "Batch aborted, cannot open database");
                tracker.finish();
                return;
            }
        };

        let sources = match list_active_sources(&conn) {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!(error = %e, "Batch aborted, cannot read sources");
                tracker.finish();
                return;
            }
        };
        if sources.is_empty() {
            tracing::info!("No active sources registered, nothing to do");
            tracker.finish();
            return;
        }

        let orchestrator = Orchestrator::new(
            Collaborators::from_settings(&settings),
            &lexicon,
            &settings,
        );
        orchestrator.run_sources(&conn, &sources, &RunOptions::default(), Some(&tracker));
    });

    true
}

/// Long-running task: fire a batch at 06:00 UTC every day.
pub async fn run_daily(state: AppState) {
    loop {
        let wait = until_next_run();
        tracing::info!(seconds = wait.as_secs(), "Next scheduled batch");
        tokio::time::sleep(wait).await;

        tracing::info!("Scheduled batch starting");
        spawn_batch(&state);
    }
}

fn until_next_run() -> std::time::Duration {
    let now = Utc::now();
    let mut next = now.date_naive().and_time(daily_run_time()).and_utc();
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}
