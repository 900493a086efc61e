//! API route definitions
//!
//! - /api/v1/health - service health and provider availability
//! - /api/v1/diagnostic - run the diagnostic pipeline (POST)
//! - /api/v1/diagnosis/:id - retrieve a cached diagnosis
//! - /api/v1/vehicles/:make/:model/issues - known-issue lookup
//! - /api/v1/obd2/* - OBD2 simulator surface

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Create all v1 API routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/diagnostic", post(handlers::post_diagnostic))
        .route("/diagnosis/:id", get(handlers::get_diagnosis))
        .route("/vehicles/:make/:model/issues", get(handlers::get_vehicle_issues))
        // OBD2 simulator
        .route("/obd2/scan", get(handlers::obd_scan))
        .route("/obd2/connect", post(handlers::obd_connect))
        .route("/obd2/disconnect", get(handlers::obd_disconnect))
        .route("/obd2/data", get(handlers::obd_data))
        .route("/obd2/command", post(handlers::obd_command))
        .route("/obd2/clear-dtc", post(handlers::obd_clear_dtc))
        .with_state(state)
}

/// WebSocket route, mounted outside the /api/v1 prefix.
pub fn ws_routes(state: ApiState) -> Router {
    Router::new()
        .route("/ws/obd2", get(super::ws::ws_obd2))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DiagnosticEngine;
    use crate::obd::Obd2Simulator;
    use crate::store::InMemoryDiagnosisStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> ApiState {
        let engine = Arc::new(DiagnosticEngine::new(Arc::new(InMemoryDiagnosisStore::new())));
        ApiState::new(engine, Obd2Simulator::new(Some(1)))
    }

    #[tokio::test]
    async fn test_api_routes_health() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_obd_scan() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/obd2/scan")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_unknown_diagnosis_is_404() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/diagnosis/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
