//! Events that are logged and acknowledged without touching any state.

use tracing::{debug, info};

use crate::webhooks::events::VapiEvent;

use super::HandlerResult;

pub fn handle_observation(event: &VapiEvent) -> HandlerResult {
    let call_id = event.call_id().map(|id| id.as_str()).unwrap_or("");
    match event {
        VapiEvent::Transcript(e) | VapiEvent::ConversationUpdate(e) => {
            debug!(
                call_id,
                event_kind = event.kind(),
                role = e.role.as_deref().unwrap_or(""),
                transcript = e.transcript.as_deref().unwrap_or(""),
                "transcript"
            );
        }
        VapiEvent::StatusUpdate(e) => {
            debug!(
                call_id,
                status = e.status.as_deref().unwrap_or(""),
                "call status update"
            );
        }
        VapiEvent::SpeechUpdate(e) => {
            debug!(
                call_id,
                role = e.role.as_deref().unwrap_or(""),
                status = e.status.as_deref().unwrap_or(""),
                "speech update"
            );
        }
        VapiEvent::Unrecognized { kind } => {
            info!(event_kind = %kind, "unhandled webhook event type");
        }
        other => {
            debug!(event_kind = other.kind(), "event has no observer");
        }
    }
    HandlerResult::received()
}
