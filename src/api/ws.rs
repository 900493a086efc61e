//! WebSocket endpoint for live OBD2 data
//!
//! Text protocol from the mobile client:
//! - `get_live_data` → `{"type": "live_data", "data": {...}}`
//! - `get_dtc` → `{"type": "dtc_codes", "data": {...}}`
//! - `command:<cmd>` → `{"type": "command_response", "data": {...}}`
//! - `ping` → `{"type": "pong"}`
//!
//! Simulator errors are reported in-band as `{"type": "error"}` messages;
//! the connection stays open.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use super::handlers::ApiState;

/// `GET /ws/obd2`
pub async fn ws_obd2(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: ApiState) {
    debug!("OBD2 websocket client connected");

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let reply = dispatch(&state, text.trim()).await;
        let payload = match serde_json::to_string(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to serialize websocket reply");
                continue;
            }
        };
        if socket.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }

    debug!("OBD2 websocket client disconnected");
}

async fn dispatch(state: &ApiState, request: &str) -> serde_json::Value {
    let mut obd = state.obd.lock().await;
    let timestamp = Utc::now().to_rfc3339();

    match request {
        "get_live_data" => match obd.live_data() {
            Ok(data) => json!({"type": "live_data", "data": data, "timestamp": timestamp}),
            Err(e) => json!({"type": "error", "message": e.to_string(), "timestamp": timestamp}),
        },
        "get_dtc" => match obd.read_dtc() {
            Ok(data) => json!({"type": "dtc_codes", "data": data, "timestamp": timestamp}),
            Err(e) => json!({"type": "error", "message": e.to_string(), "timestamp": timestamp}),
        },
        "ping" => json!({"type": "pong", "timestamp": timestamp}),
        other => {
            if let Some(command) = other.strip_prefix("command:") {
                match obd.send_command(command) {
                    Ok(data) => {
                        json!({"type": "command_response", "data": data, "timestamp": timestamp})
                    }
                    Err(e) => {
                        json!({"type": "error", "message": e.to_string(), "timestamp": timestamp})
                    }
                }
            } else {
                json!({"type": "error", "message": format!("unknown request: {other}"), "timestamp": timestamp})
            }
        }
    }
}
