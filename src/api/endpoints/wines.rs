//! Wine read endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::AppState;
use crate::db::repository::{get_wine, list_wines, WineFilter};
use crate::models::{Supermarket, Wine, WineType};

#[derive(Debug, Default, Deserialize)]
pub struct WineQuery {
    pub supermarket: Option<String>,
    #[serde(rename = "type")]
    pub wine_type: Option<String>,
    pub limit: Option<u32>,
}

/// `GET /api/wines?supermarket=&type=&limit=` — newest first, capped at
/// 100. Unknown filter values are a client error, not an empty list.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<WineQuery>,
) -> Result<Json<Vec<Wine>>, ApiError> {
    let mut filter = WineFilter {
        limit: query.limit.unwrap_or(0).min(100),
        ..Default::default()
    };

    if let Some(value) = &query.supermarket {
        filter.supermarket = Some(
            Supermarket::parse(value)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown supermarket: {value}")))?,
        );
    }
    if let Some(value) = &query.wine_type {
        filter.wine_type = Some(
            WineType::parse(value)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown wine type: {value}")))?,
        );
    }

    let conn = state
        .db
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?;
    let wines = list_wines(&conn, &filter)?;
    Ok(Json(wines))
}

/// `GET /api/wines/:id`
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Wine>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid wine id: {id}")))?;

    let conn = state
        .db
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?;
    let wine = get_wine(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("wine {id} not found")))?;
    Ok(Json(wine))
}

/// `GET /api/supermarkets` — the allow-list, for frontend filters.
pub async fn supermarkets() -> Json<Vec<&'static str>> {
    Json(Supermarket::ALL.iter().map(|s| s.as_str()).collect())
}
