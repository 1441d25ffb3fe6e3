//! Health check endpoint for liveness checks.

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

/// Health check handler.
///
/// # Example
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"status":"healthy","timestamp":"2024-03-01T14:30:00.000Z"}
/// ```
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
