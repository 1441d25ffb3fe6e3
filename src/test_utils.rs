//! Shared test utilities and arbitrary generators for property-based testing.

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use proptest::prelude::*;

use crate::notify::{MailError, Mailer, OutboundEmail};
use crate::store::{InMemorySessionStore, SessionStore};
use crate::types::{CallId, LeadFields};

pub fn arb_call_id() -> impl Strategy<Value = CallId> {
    "call_[a-z0-9]{1,12}".prop_map(CallId::new)
}

fn arb_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z][A-Za-z0-9 ]{0,15}[A-Za-z0-9]")
}

pub fn arb_score() -> impl Strategy<Value = Option<f64>> {
    prop::option::of((0u8..=20).prop_map(|half_points| f64::from(half_points) / 2.0))
}

pub fn arb_lead_fields() -> impl Strategy<Value = LeadFields> {
    (
        (arb_text(), arb_text(), arb_text(), arb_text()),
        (arb_text(), arb_text(), arb_text(), arb_text()),
        (arb_score(), arb_text(), arb_text(), arb_text()),
    )
        .prop_map(
            |(
                (first_name, last_name, email, company),
                (industry, pain_point, timeline, budget),
                (qualification_score, call_outcome, next_steps, notes),
            )| LeadFields {
                first_name,
                last_name,
                email,
                company,
                industry,
                pain_point,
                timeline,
                budget,
                qualification_score,
                call_outcome,
                next_steps,
                notes,
                ..LeadFields::default()
            },
        )
}

/// A `Mailer` that records every email instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail_with: Option<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with `MailError::Rejected`.
    pub fn failing(message: impl Into<String>) -> Self {
        RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if let Some(message) = &self.fail_with {
            return Err(MailError::Rejected {
                status: 500,
                body: message.clone(),
            });
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// A `SessionStore` whose next `remove` fails once, then behaves normally.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemorySessionStore,
    fail_next_remove: AtomicBool,
}

impl FlakyStore {
    pub fn failing_next_remove() -> Self {
        FlakyStore {
            inner: InMemorySessionStore::new(),
            fail_next_remove: AtomicBool::new(true),
        }
    }
}

impl SessionStore for FlakyStore {
    type Error = io::Error;

    async fn upsert(&self, call_id: &CallId, fields: LeadFields) -> Result<LeadFields, io::Error> {
        let Ok(merged) = self.inner.upsert(call_id, fields).await;
        Ok(merged)
    }

    async fn seed(&self, call_id: &CallId, defaults: LeadFields) -> Result<LeadFields, io::Error> {
        let Ok(merged) = self.inner.seed(call_id, defaults).await;
        Ok(merged)
    }

    async fn upsert_with_defaults(
        &self,
        call_id: &CallId,
        fields: LeadFields,
        defaults: LeadFields,
    ) -> Result<LeadFields, io::Error> {
        let Ok(merged) = self.inner.upsert_with_defaults(call_id, fields, defaults).await;
        Ok(merged)
    }

    async fn get(&self, call_id: &CallId) -> Result<Option<LeadFields>, io::Error> {
        let Ok(found) = self.inner.get(call_id).await;
        Ok(found)
    }

    async fn remove(&self, call_id: &CallId) -> Result<Option<LeadFields>, io::Error> {
        if self.fail_next_remove.swap(false, Ordering::SeqCst) {
            return Err(io::Error::other("session backend unavailable"));
        }
        let Ok(removed) = self.inner.remove(call_id).await;
        Ok(removed)
    }

    async fn len(&self) -> Result<usize, io::Error> {
        let Ok(len) = self.inner.len().await;
        Ok(len)
    }
}
