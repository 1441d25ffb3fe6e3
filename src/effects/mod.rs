//! Effects-as-data for side effects that leave the process.
//!
//! Handlers never send email themselves. They return [`Effect`] values that
//! describe what should happen, and the server hands those to an
//! [`EffectInterpreter`] on a detached task. Handlers stay testable without
//! I/O, and the webhook reply never waits on the email provider.

use serde::{Deserialize, Serialize};

pub mod interpreter;

pub use interpreter::EffectInterpreter;

use crate::types::{CallId, LeadFields};
use crate::webhooks::priority::LeadPriority;

/// A side effect requested by a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect_type", rename_all = "snake_case")]
pub enum Effect {
    /// Tell sales about a finished, qualified call.
    NotifyLead(LeadNotification),
}

/// A finished call's lead, ready to be sent to sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadNotification {
    pub call_id: CallId,
    pub lead: LeadFields,
    pub priority: LeadPriority,
}

impl LeadNotification {
    pub fn new(call_id: CallId, lead: LeadFields, priority: LeadPriority) -> Self {
        LeadNotification {
            call_id,
            lead,
            priority,
        }
    }
}
