//! Webhook endpoint handler.
//!
//! Accepts voice-platform webhooks, validates signatures, parses and
//! dispatches the event, and replies synchronously. Effects produced by the
//! handlers run on a detached task after the reply is built.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::AppState;
use crate::notify::Mailer;
use crate::store::SessionStore;
use crate::webhooks::{HandlerError, ParseError, parse_webhook, verify_request};

/// Header name for the platform's signature.
pub const HEADER_SIGNATURE: &str = "x-vapi-signature";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Invalid or missing signature while a secret is configured.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The body is not JSON.
    #[error("Invalid JSON body")]
    InvalidJson(#[source] serde_json::Error),

    /// The event handler rejected the event.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::InvalidSignature => (StatusCode::UNAUTHORIZED, self.to_string()),
            WebhookError::InvalidJson(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            WebhookError::Handler(
                HandlerError::UnknownFunction(_) | HandlerError::InvalidArguments { .. },
            ) => (StatusCode::BAD_REQUEST, self.to_string()),
            WebhookError::Handler(HandlerError::Store(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Header `X-Vapi-Signature`: hex HMAC-SHA256 of the raw body (required
///   only when a secret is configured)
/// - Body: `{"message": {"type": ..., ...}}`
///
/// # Response
///
/// - 200 OK: `{"received": true}` or the tool reply
/// - 400 Bad Request: invalid JSON, unknown tool, or unreadable tool arguments
/// - 401 Unauthorized: invalid signature
/// - 500 Internal Server Error: session store failure
pub async fn webhook_handler<S, M>(
    State(app_state): State<AppState<S, M>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, WebhookError>
where
    S: SessionStore + 'static,
    M: Mailer + 'static,
{
    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok());

    // Verify signature BEFORE any parsing or state access.
    if !verify_request(&body, signature, app_state.webhook_secret()) {
        warn!(
            has_signature = signature.is_some(),
            "Invalid webhook signature"
        );
        return Err(WebhookError::InvalidSignature);
    }

    let event = match parse_webhook(&body) {
        Ok(event) => event,
        Err(ParseError::Json(e)) => {
            warn!(error = %e, "Webhook body is not valid JSON");
            return Err(WebhookError::InvalidJson(e));
        }
        Err(e @ ParseError::InvalidPayload { .. }) => {
            // Acknowledge so the platform does not retry a payload we will
            // never be able to read.
            warn!(error = %e, "Malformed webhook payload; acknowledging");
            return Ok(Json(json!({ "received": true })));
        }
    };

    let call_id = event.call_id().map(|id| id.as_str()).unwrap_or("");
    debug!(call_id, event_kind = event.kind(), "Received webhook");

    match app_state.dispatcher().handle_event(&event).await {
        Ok(result) => {
            let reply = result.reply.to_json();
            app_state.spawn_effects(result.effects);
            Ok(Json(reply))
        }
        Err(e) => {
            match &e {
                HandlerError::Store(_) => error!(
                    call_id,
                    event_kind = event.kind(),
                    error = %e,
                    "Failed to handle webhook"
                ),
                _ => warn!(
                    call_id,
                    event_kind = event.kind(),
                    error = %e,
                    "Rejected webhook"
                ),
            }
            Err(e.into())
        }
    }
}
