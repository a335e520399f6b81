//! HTTP Endpoints
//!
//! Health probes and the media-stream WebSocket route.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws::media_stream;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let ws_path = format!(
        "{}/:assistant_id",
        state.config.server.ws_path.trim_end_matches('/')
    );

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route(&ws_path, get(media_stream))
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "live_calls": state.registry.count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_config::Settings;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Settings::default());
        let _ = create_router(state);
    }
}
