//! Handler for `call-started` events.

use tracing::{debug, warn};

use crate::store::{EndedCalls, SessionStore};
use crate::types::LeadFields;
use crate::webhooks::events::CallStartedEvent;

use super::{HandlerError, HandlerResult};

/// Creates the session for a new call, recording the caller's number.
///
/// Seeding never overwrites: if a tool invocation arrived first (events can
/// be reordered) its fields are kept, and a repeated start is harmless.
/// A start delivered after the call's end creates nothing.
pub async fn handle_call_started<S: SessionStore>(
    store: &S,
    ended: &EndedCalls,
    event: &CallStartedEvent,
) -> Result<HandlerResult, HandlerError> {
    let Some(call_id) = event.call.call_id.as_ref() else {
        warn!("call-started event without a call id; ignoring");
        return Ok(HandlerResult::received());
    };

    if ended.is_ended(call_id) {
        debug!(call_id = %call_id, "call-started after call end; ignoring");
        return Ok(HandlerResult::received());
    }

    let defaults = match &event.call.customer_number {
        Some(number) => LeadFields::with_phone(number.clone()),
        None => LeadFields::default(),
    };
    store
        .seed(call_id, defaults)
        .await
        .map_err(HandlerError::store)?;

    if ended.is_ended(call_id) {
        store.remove(call_id).await.map_err(HandlerError::store)?;
        debug!(call_id = %call_id, "call ended during call-started; session discarded");
        return Ok(HandlerResult::received());
    }

    debug!(call_id = %call_id, "call session started");
    Ok(HandlerResult::received())
}
