//! HTTP request handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::engine::DiagnosticEngine;
use crate::obd::Obd2Simulator;
use crate::types::DiagnosticRequest;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<DiagnosticEngine>,
    pub obd: Arc<Mutex<Obd2Simulator>>,
}

impl ApiState {
    pub fn new(engine: Arc<DiagnosticEngine>, obd: Obd2Simulator) -> Self {
        Self {
            engine,
            obd: Arc::new(Mutex::new(obd)),
        }
    }
}

// ============================================================================
// Core endpoints
// ============================================================================

/// `GET /api/v1/health`
pub async fn get_health(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(json!({
        "status": "healthy",
        "service": "repara",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.engine.provider_names(),
        "cached_diagnoses": state.engine.store().count(),
        "obd2_simulator": "active",
    }))
}

/// `POST /api/v1/diagnostic` — run the full pipeline.
///
/// Total: malformed fields were already substituted at deserialization and
/// the engine itself never fails, so this always returns 200.
pub async fn post_diagnostic(
    State(state): State<ApiState>,
    Json(request): Json<DiagnosticRequest>,
) -> Response {
    info!(
        make = %request.vehicle.make,
        model = %request.vehicle.model,
        frames = request.telemetry.len(),
        "diagnostic request"
    );
    let record = state.engine.diagnose(&request).await;
    ApiResponse::ok(record)
}

/// `GET /api/v1/diagnosis/:id` — retrieval by id.
///
/// The only user-visible failure the core surfaces: an unknown id is a
/// distinct NOT_FOUND, not an empty result.
pub async fn get_diagnosis(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.engine.store().get(&id) {
        Some(record) => ApiResponse::ok(record),
        None => ApiErrorResponse::not_found(format!("no diagnosis with id {id}")),
    }
}

/// `GET /api/v1/vehicles/:make/:model/issues` — known-issue lookup.
pub async fn get_vehicle_issues(
    State(state): State<ApiState>,
    Path((make, model)): Path<(String, String)>,
) -> Response {
    ApiResponse::ok(state.engine.vehicle_kb().lookup(&make, &model))
}

// ============================================================================
// OBD2 simulator endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ObdConnectRequest {
    #[serde(default)]
    pub device_address: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ObdCommandRequest {
    pub command: String,
}

/// `GET /api/v1/obd2/scan`
pub async fn obd_scan(State(state): State<ApiState>) -> Response {
    let devices = state.obd.lock().await.scan_devices();
    let count = devices.len();
    ApiResponse::ok(json!({
        "devices": devices,
        "count": count,
    }))
}

/// `POST /api/v1/obd2/connect`
pub async fn obd_connect(
    State(state): State<ApiState>,
    Json(request): Json<ObdConnectRequest>,
) -> Response {
    let device = request.device_address.or(request.device_name);
    let status = state.obd.lock().await.connect(device.as_deref());
    ApiResponse::ok(status)
}

/// `GET /api/v1/obd2/disconnect`
pub async fn obd_disconnect(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.obd.lock().await.disconnect())
}

/// `GET /api/v1/obd2/data` — live snapshot plus stored codes.
pub async fn obd_data(State(state): State<ApiState>) -> Response {
    let mut obd = state.obd.lock().await;
    let live = match obd.live_data() {
        Ok(live) => live,
        Err(e) => return ApiErrorResponse::bad_request(e.to_string()),
    };
    let dtc = match obd.read_dtc() {
        Ok(dtc) => dtc,
        Err(e) => return ApiErrorResponse::bad_request(e.to_string()),
    };
    ApiResponse::ok(json!({
        "connected": obd.is_connected(),
        "device": obd.current_device(),
        "live_data": live,
        "dtc_codes": dtc,
    }))
}

/// `POST /api/v1/obd2/command`
pub async fn obd_command(
    State(state): State<ApiState>,
    Json(request): Json<ObdCommandRequest>,
) -> Response {
    match state.obd.lock().await.send_command(&request.command) {
        Ok(response) => ApiResponse::ok(response),
        Err(e) => ApiErrorResponse::bad_request(e.to_string()),
    }
}

/// `POST /api/v1/obd2/clear-dtc`
pub async fn obd_clear_dtc(State(state): State<ApiState>) -> Response {
    match state.obd.lock().await.clear_dtc() {
        Ok(response) => ApiResponse::ok(response),
        Err(e) => ApiErrorResponse::bad_request(e.to_string()),
    }
}
