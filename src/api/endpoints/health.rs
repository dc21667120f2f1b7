//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health` — liveness plus a database ping.
pub async fn check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let conn = state
        .db
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
    }))
}
