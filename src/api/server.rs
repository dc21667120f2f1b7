//! HTTP server lifecycle.

use crate::api::router::api_router;
use crate::core_state::AppState;

/// Bind and serve the API until the process exits. Also spawns the
/// daily scheduler task when enabled.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let bind_addr = state.settings.bind_addr.clone();

    if state.settings.scheduler_enabled {
        tokio::spawn(crate::scheduler::run_daily(state.clone()));
    }

    let router = api_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "API server listening");
    axum::serve(listener, router).await
}
