//! REST API module using Axum
//!
//! Provides the HTTP surface of the diagnostic service:
//! - /api/v1 REST endpoints with a consistent response envelope
//! - /ws/obd2 WebSocket for live OBD2 simulator data

pub mod envelope;
pub mod handlers;
mod routes;
mod ws;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Configure `server.cors_origins` as a comma-separated origin list for
/// development (e.g., the mobile-app dev server).
fn build_cors_layer() -> CorsLayer {
    let origins = &crate::config::get().server.cors_origins;
    if origins.is_empty() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let allowed: Vec<_> = origins
            .split(',')
            .filter_map(|o| o.trim().parse().ok())
            .collect();
        tracing::info!(origins = %origins, "CORS: allowing configured origins");
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::ws_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
