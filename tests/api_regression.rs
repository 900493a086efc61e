//! API Regression Tests
//!
//! Exercises the HTTP surface with in-process requests: envelope shape,
//! diagnostic round-trip through the cache, the NOT_FOUND contract, and
//! the OBD2 simulator endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use repara::api::{create_app, ApiState};
use repara::obd::Obd2Simulator;
use repara::store::InMemoryDiagnosisStore;
use repara::DiagnosticEngine;

fn test_app() -> axum::Router {
    let engine = Arc::new(DiagnosticEngine::new(Arc::new(InMemoryDiagnosisStore::new())));
    create_app(ApiState::new(engine, Obd2Simulator::new(Some(99))))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn test_health_reports_service() {
    let response = test_app().oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    assert_eq!(v["data"]["status"], "healthy");
    assert_eq!(v["data"]["service"], "repara");
    assert!(v["meta"].get("timestamp").is_some());
}

#[tokio::test]
async fn test_diagnostic_roundtrip_through_cache() {
    let app = test_app();

    let request = serde_json::json!({
        "telemetry": [
            {"parameter_id": "rpm", "value": 400.0},
            {"parameter_id": "dtc_p0300", "value": 1.0}
        ],
        "symptoms": {"text": "motorul tremura la ralanti"},
        "vehicle": {"make": "VW", "model": "Golf", "model_year": 2015, "odometer_km": 140000},
        "session_id": "api-test"
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/diagnostic", request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    let data = &v["data"];
    assert_eq!(data["session_id"], "api-test");
    assert_eq!(data["ranked_issues"][0]["component"], "ignition system");
    assert!(data["overall_confidence"].as_f64().unwrap() <= 0.95);
    assert!(data["cost_estimate"]["totals"].get("RON").is_some());
    assert!(data["cost_estimate"]["totals"].get("EUR").is_some());

    // The returned id must be retrievable from the cache.
    let id = data["diagnosis_id"].as_str().unwrap().to_string();
    let lookup = app
        .oneshot(get(&format!("/api/v1/diagnosis/{id}")))
        .await
        .unwrap();
    assert_eq!(lookup.status(), StatusCode::OK);
    let cached = body_json(lookup).await;
    assert_eq!(cached["data"]["diagnosis_id"], id.as_str());
}

#[tokio::test]
async fn test_unknown_diagnosis_is_distinct_not_found() {
    let response = test_app()
        .oneshot(get("/api/v1/diagnosis/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let v = body_json(response).await;
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_empty_diagnostic_body_still_succeeds() {
    let response = test_app()
        .oneshot(post_json("/api/v1/diagnostic", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    assert!((v["data"]["overall_confidence"].as_f64().unwrap() - 0.1).abs() < 1e-9);
    assert_eq!(v["data"]["urgency"], "low");
}

#[tokio::test]
async fn test_vehicle_known_issues_lookup() {
    let response = test_app()
        .oneshot(get("/api/v1/vehicles/VW/Golf/issues"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    let issues = v["data"]["known_issues"].as_array().unwrap();
    assert!(!issues.is_empty());

    // Unknown vehicles are still a 200 with an empty list, never an error.
    let unknown = test_app()
        .oneshot(get("/api/v1/vehicles/Lada/Niva/issues"))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::OK);
    let v = body_json(unknown).await;
    assert!(v["data"]["known_issues"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_obd2_connect_then_data() {
    let app = test_app();

    // Data before connecting is a BAD_REQUEST, not a crash.
    let early = app.clone().oneshot(get("/api/v1/obd2/data")).await.unwrap();
    assert_eq!(early.status(), StatusCode::BAD_REQUEST);

    let connect = app
        .clone()
        .oneshot(post_json(
            "/api/v1/obd2/connect",
            serde_json::json!({"device_address": "00:1A:7D:DA:71:13"}),
        ))
        .await
        .unwrap();
    assert_eq!(connect.status(), StatusCode::OK);
    let v = body_json(connect).await;
    assert_eq!(v["data"]["status"], "connected");

    let data = app.oneshot(get("/api/v1/obd2/data")).await.unwrap();
    assert_eq!(data.status(), StatusCode::OK);
    let v = body_json(data).await;
    assert_eq!(v["data"]["connected"], true);
    assert!(v["data"]["live_data"].get("rpm").is_some());
    assert!(v["data"]["dtc_codes"]["codes"].as_array().unwrap().len() > 0);
}

#[tokio::test]
async fn test_obd2_scan_lists_devices() {
    let response = test_app().oneshot(get("/api/v1/obd2/scan")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    assert_eq!(v["data"]["count"], 5);
}

#[tokio::test]
async fn test_obd2_command_requires_connection() {
    let response = test_app()
        .oneshot(post_json(
            "/api/v1/obd2/command",
            serde_json::json!({"command": "ATRV"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
