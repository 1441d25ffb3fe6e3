//! Handler for `call-ended` / `end-of-call-report` events.
//!
//! The end of a call is the only point where a notification can be produced.
//! The session is removed unconditionally, then combined with whatever the
//! platform's post-call analysis supplied. If the removal fails the end is
//! not recorded, so a redelivery is handled as a first end.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::effects::{Effect, LeadNotification};
use crate::store::{EndedCalls, SessionStore};
use crate::types::LeadFields;
use crate::webhooks::events::CallEndedEvent;
use crate::webhooks::priority::PriorityThresholds;

use super::{HandlerError, HandlerResult};

/// Note recorded when neither the session nor the analysis supplied one.
pub const DEFAULT_CALL_NOTE: &str = "Inbound sales call via Riley AI assistant";

/// Finalizes a call's lead and decides whether to notify.
///
/// Duplicate deliveries of the same call's end (within the retention period
/// of `ended`) are acknowledged without producing a notification.
pub async fn handle_call_ended<S: SessionStore>(
    store: &S,
    ended: &EndedCalls,
    thresholds: &PriorityThresholds,
    event: &CallEndedEvent,
    now: DateTime<Utc>,
) -> Result<HandlerResult, HandlerError> {
    let Some(call_id) = event.call.call_id.as_ref() else {
        warn!("call-ended event without a call id; ignoring");
        return Ok(HandlerResult::received());
    };

    // Must precede the removal: racing writers re-check the marker after writing.
    let first_end = ended.mark_ended(call_id, now);
    let stored = match store.remove(call_id).await {
        Ok(stored) => stored,
        Err(e) => {
            if first_end {
                ended.forget(call_id);
            }
            return Err(HandlerError::store(e));
        }
    };

    if !first_end {
        // Any session here was written by an event racing the first end.
        info!(
            call_id = %call_id,
            discarded_session = stored.is_some(),
            "duplicate call end; ignoring"
        );
        return Ok(HandlerResult::received());
    }

    info!(
        call_id = %call_id,
        ended_reason = event.ended_reason.as_deref().unwrap_or(""),
        had_session = stored.is_some(),
        "call ended"
    );

    let lead = assemble_lead(stored, event);
    if !lead.is_substantive() {
        debug!(call_id = %call_id, "no lead captured; skipping notification");
        return Ok(HandlerResult::received());
    }

    let priority = thresholds.classify(lead.qualification_score);
    info!(
        call_id = %call_id,
        priority = %priority,
        score = %lead.score_label(),
        "lead qualified for notification"
    );

    Ok(HandlerResult::with_effects(vec![Effect::NotifyLead(
        LeadNotification::new(call_id.clone(), lead, priority),
    )]))
}

/// Combines the stored session with the end-of-call report.
///
/// In order:
/// 1. fields extracted by post-call analysis, overridden by the session
///    (tool calls reflect what the caller confirmed);
/// 2. the call duration, when reported;
/// 3. the summary as notes, or [`DEFAULT_CALL_NOTE`] when there are no notes;
/// 4. the caller's number, when no phone number was captured.
pub fn assemble_lead(stored: Option<LeadFields>, event: &CallEndedEvent) -> LeadFields {
    let mut lead = event
        .extracted
        .clone()
        .merged(stored.unwrap_or_default());

    if let Some(duration) = event.duration {
        lead.duration = Some(duration);
    }

    match &event.summary {
        Some(summary) => lead.notes = Some(summary.clone()),
        None if lead.notes.is_none() => lead.notes = Some(DEFAULT_CALL_NOTE.to_string()),
        None => {}
    }

    if lead.phone_number.is_none() {
        lead.phone_number = event.call.customer_number.clone();
    }

    lead
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::store::InMemorySessionStore;
    use crate::test_utils::FlakyStore;
    use crate::types::CallId;
    use crate::webhooks::events::CallInfo;
    use crate::webhooks::priority::LeadPriority;

    fn ended(call_id: &str) -> CallEndedEvent {
        CallEndedEvent {
            call: CallInfo::new(call_id, Some("+15550001111")),
            ..CallEndedEvent::default()
        }
    }

    fn lead(first_name: &str, score: Option<f64>) -> LeadFields {
        LeadFields {
            first_name: Some(first_name.to_string()),
            qualification_score: score,
            ..LeadFields::default()
        }
    }

    async fn run(
        store: &InMemorySessionStore,
        ended_calls: &EndedCalls,
        event: &CallEndedEvent,
    ) -> HandlerResult {
        handle_call_ended(
            store,
            ended_calls,
            &PriorityThresholds::default(),
            event,
            Utc::now(),
        )
        .await
        .unwrap()
    }

    fn notification(result: &HandlerResult) -> &LeadNotification {
        match result.effects.as_slice() {
            [Effect::NotifyLead(n)] => n,
            other => panic!("expected one notification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn medium_score_is_classified() {
        let store = InMemorySessionStore::new();
        store.upsert(&CallId::new("c1"), lead("Ann", Some(6.5))).await.unwrap();

        let result = run(&store, &EndedCalls::new(), &ended("c1")).await;

        assert_eq!(notification(&result).priority, LeadPriority::Medium);
    }

    #[tokio::test]
    async fn name_without_score_is_low_priority() {
        let store = InMemorySessionStore::new();
        store.upsert(&CallId::new("c1"), lead("Ann", None)).await.unwrap();

        let result = run(&store, &EndedCalls::new(), &ended("c1")).await;

        let n = notification(&result);
        assert_eq!(n.priority, LeadPriority::Low);
        assert_eq!(n.lead.score_label(), "N/A");
    }

    #[tokio::test]
    async fn score_without_name_still_notifies() {
        let store = InMemorySessionStore::new();
        store
            .upsert(
                &CallId::new("c1"),
                LeadFields {
                    qualification_score: Some(3.0),
                    ..LeadFields::default()
                },
            )
            .await
            .unwrap();

        let result = run(&store, &EndedCalls::new(), &ended("c1")).await;

        assert_eq!(notification(&result).priority, LeadPriority::Low);
    }

    #[tokio::test]
    async fn unknown_call_without_analysis_is_silent() {
        let store = InMemorySessionStore::new();

        let result = run(&store, &EndedCalls::new(), &ended("never-started")).await;

        assert_eq!(result, HandlerResult::received());
    }

    #[tokio::test]
    async fn session_is_removed_even_without_notification() {
        let store = InMemorySessionStore::new();
        store
            .upsert(&CallId::new("c1"), LeadFields::with_phone("+1"))
            .await
            .unwrap();

        let result = run(&store, &EndedCalls::new(), &ended("c1")).await;

        assert!(result.effects.is_empty());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_with_analysis_does_not_notify_twice() {
        let store = InMemorySessionStore::new();
        let ended_calls = EndedCalls::new();
        let mut event = ended("c1");
        event.extracted = lead("John", Some(9.0));

        let first = run(&store, &ended_calls, &event).await;
        let second = run(&store, &ended_calls, &event).await;

        assert_eq!(first.effects.len(), 1);
        assert!(second.effects.is_empty());
    }

    #[tokio::test]
    async fn end_after_retention_period_is_treated_as_new() {
        let store = InMemorySessionStore::new();
        let ended_calls = EndedCalls::with_ttl(Duration::minutes(5));
        let mut event = ended("c1");
        event.extracted = lead("John", Some(9.0));
        let start = Utc::now();

        let thresholds = PriorityThresholds::default();
        let first = handle_call_ended(&store, &ended_calls, &thresholds, &event, start)
            .await
            .unwrap();
        let later = handle_call_ended(
            &store,
            &ended_calls,
            &thresholds,
            &event,
            start + Duration::minutes(10),
        )
        .await
        .unwrap();

        assert_eq!(first.effects.len(), 1);
        assert_eq!(later.effects.len(), 1);
    }

    #[tokio::test]
    async fn redelivery_after_store_failure_still_notifies() {
        let store = FlakyStore::failing_next_remove();
        let ended_calls = EndedCalls::new();
        let thresholds = PriorityThresholds::default();
        store.upsert(&CallId::new("c1"), lead("Ann", Some(9.0))).await.unwrap();
        let event = ended("c1");

        let err = handle_call_ended(&store, &ended_calls, &thresholds, &event, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Store(_)));
        assert!(!ended_calls.is_ended(&CallId::new("c1")));

        let retry = handle_call_ended(&store, &ended_calls, &thresholds, &event, Utc::now())
            .await
            .unwrap();

        let n = notification(&retry);
        assert_eq!(n.lead.first_name.as_deref(), Some("Ann"));
        assert_eq!(n.priority, LeadPriority::High);
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_call_id_is_acknowledged() {
        let store = InMemorySessionStore::new();
        let event = CallEndedEvent {
            extracted: lead("Ann", Some(9.0)),
            ..CallEndedEvent::default()
        };

        let result = run(&store, &EndedCalls::new(), &event).await;

        assert_eq!(result, HandlerResult::received());
    }

    #[test]
    fn session_fields_win_over_analysis() {
        let mut event = ended("c1");
        event.extracted = LeadFields {
            first_name: Some("Jon".to_string()),
            company: Some("Acme".to_string()),
            ..LeadFields::default()
        };

        let lead = assemble_lead(Some(lead("John", Some(8.0))), &event);

        assert_eq!(lead.first_name.as_deref(), Some("John"));
        assert_eq!(lead.company.as_deref(), Some("Acme"));
        assert_eq!(lead.qualification_score, Some(8.0));
    }

    #[test]
    fn summary_replaces_notes_and_default_fills_gap() {
        let mut event = ended("c1");
        let with_notes = LeadFields {
            notes: Some("from a tool".to_string()),
            ..LeadFields::default()
        };

        assert_eq!(
            assemble_lead(Some(with_notes.clone()), &event).notes.as_deref(),
            Some("from a tool")
        );
        assert_eq!(
            assemble_lead(None, &event).notes.as_deref(),
            Some(DEFAULT_CALL_NOTE)
        );

        event.summary = Some("Wants a demo next week.".to_string());
        assert_eq!(
            assemble_lead(Some(with_notes), &event).notes.as_deref(),
            Some("Wants a demo next week.")
        );
    }

    #[test]
    fn captured_phone_is_not_replaced_by_caller_id() {
        let event = ended("c1");
        let lead = assemble_lead(Some(LeadFields::with_phone("+1999")), &event);
        assert_eq!(lead.phone_number.as_deref(), Some("+1999"));

        let lead = assemble_lead(None, &event);
        assert_eq!(lead.phone_number.as_deref(), Some("+15550001111"));
    }

    #[test]
    fn reported_duration_is_recorded() {
        let mut event = ended("c1");
        event.duration = Some(180.0);
        assert_eq!(assemble_lead(None, &event).duration, Some(180.0));
    }
}
