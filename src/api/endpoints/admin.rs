//! Admin mutations, guarded by a bearer token.
//!
//! Auth is checked before any other work. When no admin token is
//! configured the whole surface is disabled and every request is
//! rejected.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::AppState;
use crate::db::repository::delete_wine;
use crate::scheduler;

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = state
        .settings
        .admin_token
        .as_deref()
        .ok_or(ApiError::Unauthorized)?;

    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    if provided != expected {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TriggerResponse {
    pub started: bool,
}

/// `POST /api/admin/trigger-scrape` — kick off a batch run over the
/// active sources in the background.
pub async fn trigger_scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TriggerResponse>, ApiError> {
    require_admin(&state, &headers)?;

    if !scheduler::spawn_batch(&state) {
        return Err(ApiError::Conflict("a batch run is already in progress".into()));
    }
    Ok(Json(TriggerResponse { started: true }))
}

/// `DELETE /api/admin/wines/:id`
pub async fn remove_wine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;

    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid wine id: {id}")))?;

    let conn = state
        .db
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?;
    delete_wine(&conn, &id)?;
    tracing::info!(wine_id = %id, "Wine deleted by admin");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::db::sqlite::open_memory_database;
    use crate::lexicon::WineLexicon;

    fn test_state() -> AppState {
        let conn = open_memory_database().unwrap();
        let settings = Settings::for_tests(std::env::temp_dir().join("vinoscout-admin-test"));
        AppState::new(conn, settings, WineLexicon::bundled())
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let state = test_state();
        assert!(matches!(
            require_admin(&state, &HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_token_is_rejected() {
        let state = test_state();
        assert!(matches!(
            require_admin(&state, &bearer("wrong")),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn correct_token_is_accepted() {
        let state = test_state();
        // Settings::for_tests sets the token to "test-token".
        assert!(require_admin(&state, &bearer("test-token")).is_ok());
    }

    #[test]
    fn unconfigured_token_disables_the_surface() {
        let mut state = test_state();
        let mut settings = (*state.settings).clone();
        settings.admin_token = None;
        state.settings = std::sync::Arc::new(settings);
        assert!(matches!(
            require_admin(&state, &bearer("anything")),
            Err(ApiError::Unauthorized)
        ));
    }
}
