//! Shared process state for the API server and scheduler.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Settings;
use crate::lexicon::WineLexicon;

/// State handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub settings: Arc<Settings>,
    pub lexicon: Arc<WineLexicon>,
    pub tracker: Arc<ScrapeTracker>,
}

impl AppState {
    pub fn new(db: Connection, settings: Settings, lexicon: WineLexicon) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            settings: Arc::new(settings),
            lexicon: Arc::new(lexicon),
            tracker: Arc::new(ScrapeTracker::default()),
        }
    }
}

/// Read-only snapshot of batch progress, served by the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeStatus {
    pub running: bool,
    pub total_urls: usize,
    pub processed: usize,
    pub wines_found: usize,
    pub failed: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Batch-run progress tracker. The orchestrator writes, the API reads;
/// a new batch resets the previous run's numbers.
#[derive(Debug, Default)]
pub struct ScrapeTracker {
    status: RwLock<ScrapeStatus>,
}

impl ScrapeTracker {
    pub fn start(&self, total_urls: usize) {
        let mut status = self.status.write().unwrap();
        *status = ScrapeStatus {
            running: true,
            total_urls,
            started_at: Some(Utc::now()),
            ..Default::default()
        };
    }

    pub fn record_processed(&self, wines_found: usize) {
        let mut status = self.status.write().unwrap();
        status.processed += 1;
        status.wines_found += wines_found;
    }

    pub fn record_failed(&self) {
        let mut status = self.status.write().unwrap();
        status.processed += 1;
        status.failed += 1;
    }

    pub fn finish(&self) {
        let mut status = self.status.write().unwrap();
        status.running = false;
        status.finished_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> ScrapeStatus {
        self.status.read().unwrap().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.read().unwrap().running
    }
}
