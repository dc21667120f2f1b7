//! Processing-status endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::{AppState, ScrapeStatus};
use crate::db::repository::{count_processed, count_wines, list_wines, WineFilter};
use crate::models::Wine;

#[derive(Serialize)]
pub struct StatusResponse {
    pub scrape: ScrapeStatus,
    pub total_wines: i64,
    pub total_processed_videos: i64,
    pub recent_wines: Vec<Wine>,
}

/// `GET /api/status` — batch progress snapshot and store counts.
pub async fn overview(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let scrape = state.tracker.snapshot();

    let conn = state
        .db
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?;
    let total_wines = count_wines(&conn)?;
    let total_processed_videos = count_processed(&conn)?;
    let recent_wines = list_wines(
        &conn,
        &WineFilter {
            limit: 5,
            ..Default::default()
        },
    )?;

    Ok(Json(StatusResponse {
        scrape,
        total_wines,
        total_processed_videos,
        recent_wines,
    }))
}
