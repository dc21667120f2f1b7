//! API router assembly.

use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::endpoints;
use crate::core_state::AppState;

/// Build the full API router for the given state.
pub fn api_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors_origins);

    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/api/wines", get(endpoints::wines::list))
        .route("/api/wines/:id", get(endpoints::wines::detail))
        .route("/api/supermarkets", get(endpoints::wines::supermarkets))
        .route("/api/status", get(endpoints::status::overview))
        .route(
            "/api/admin/trigger-scrape",
            post(endpoints::admin::trigger_scrape),
        )
        .route("/api/admin/wines/:id", delete(endpoints::admin::remove_wine))
        .with_state(state)
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}
