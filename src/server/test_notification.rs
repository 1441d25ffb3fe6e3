//! Notification smoke-test endpoint.
//!
//! Sends a fixed sample lead through the configured mailer and reports the
//! outcome, so operators can check the email setup without placing a call.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::AppState;
use crate::effects::LeadNotification;
use crate::notify::Mailer;
use crate::store::SessionStore;
use crate::types::{CallId, LeadFields};
use crate::webhooks::PriorityThresholds;

/// The lead sent by the smoke test.
pub fn sample_notification(thresholds: &PriorityThresholds) -> LeadNotification {
    let lead = LeadFields {
        phone_number: Some("+1234567890".to_string()),
        first_name: Some("John".to_string()),
        last_name: Some("Smith".to_string()),
        email: Some("john.smith@example.com".to_string()),
        company: Some("Tech Startup Inc".to_string()),
        industry: Some("Technology".to_string()),
        employee_count: Some("50".to_string()),
        pain_point: Some("Manual lead qualification is too slow".to_string()),
        timeline: Some("Within 3 months".to_string()),
        budget: Some("$10k-50k".to_string()),
        qualification_score: Some(9.0),
        call_outcome: Some("Demo scheduled".to_string()),
        next_steps: Some("Send calendar invite".to_string()),
        notes: Some("Test notification from the lead relay.".to_string()),
        duration: Some(180.0),
        specific_needs: None,
    };
    let priority = thresholds.classify(lead.qualification_score);
    LeadNotification::new(CallId::new("test-notification"), lead, priority)
}

/// `POST /test/notification`
///
/// - 200 OK: `{"sent": true}`
/// - 502 Bad Gateway: `{"sent": false, "error": ...}`
pub async fn test_notification_handler<S, M>(
    State(app_state): State<AppState<S, M>>,
) -> (StatusCode, Json<Value>)
where
    S: SessionStore + 'static,
    M: Mailer + 'static,
{
    let notification = sample_notification(app_state.dispatcher().thresholds());
    match app_state.notifier().send_now(&notification).await {
        Ok(()) => {
            info!("Test notification sent");
            (StatusCode::OK, Json(json!({ "sent": true })))
        }
        Err(e) => {
            warn!(error = %e, "Test notification failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "sent": false, "error": e.to_string() })),
            )
        }
    }
}
