//! Event handlers for voice-platform webhook events.
//!
//! Handlers map a parsed [`VapiEvent`] to session-store updates, the reply
//! the platform should receive, and effects to run afterwards. They never
//! send email themselves: a finished, qualified call yields an
//! [`Effect::NotifyLead`] which the server executes on a detached task.
//!
//! # Event Types
//!
//! | Event | Handler |
//! |-------|---------|
//! | `call-started` | `handle_call_started` - seed the session with the caller's number |
//! | `call-ended` | `handle_call_ended` - finalize the lead, maybe notify |
//! | `function-call` / `tool-calls` | `handle_tool_invocation` - run tools, build the reply |
//! | everything else | `handle_observation` - log and acknowledge |

mod call_ended;
mod call_started;
mod observe;
mod tool_call;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::effects::Effect;
use crate::store::{EndedCalls, SessionStore};
use crate::webhooks::events::{ToolCallStyle, VapiEvent};
use crate::webhooks::priority::PriorityThresholds;

pub use call_ended::{DEFAULT_CALL_NOTE, assemble_lead, handle_call_ended};
pub use call_started::handle_call_started;
pub use observe::handle_observation;
pub use tool_call::{CAPTURE_LEAD_INFO, CREATE_CONTACT, SCHEDULE_DEMO, Tool, handle_tool_invocation};

/// Errors that can occur during event handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The assistant called a tool this service does not implement.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// The tool arguments could not be read as the tool's parameters.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The session store failed.
    #[error("Session store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub(crate) fn store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HandlerError::Store(Box::new(error))
    }
}

/// The body the platform receives in response to a webhook.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Plain acknowledgement: `{"received": true}`.
    Received,
    /// Results of a tool invocation.
    Tool(ToolReply),
}

impl Reply {
    pub fn to_json(&self) -> Value {
        match self {
            Reply::Received => json!({ "received": true }),
            Reply::Tool(reply) => reply.to_json(),
        }
    }
}

/// Results for every tool call in one invocation, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReply {
    pub style: ToolCallStyle,
    pub results: Vec<ToolResult>,
}

/// The outcome of a single tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Echoed back for the `tool-calls` style.
    pub tool_call_id: Option<String>,

    /// Text the assistant reads to the caller.
    pub result: String,

    /// Additional top-level keys, e.g. `referenceCode`.
    pub extra: Map<String, Value>,
}

impl ToolResult {
    pub fn new(result: impl Into<String>) -> Self {
        ToolResult {
            tool_call_id: None,
            result: result.into(),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    fn to_object(&self, include_id: bool) -> Map<String, Value> {
        let mut object = Map::new();
        if let (true, Some(id)) = (include_id, &self.tool_call_id) {
            object.insert("toolCallId".to_string(), Value::String(id.clone()));
        }
        object.insert("result".to_string(), Value::String(self.result.clone()));
        for (key, value) in &self.extra {
            object.insert(key.clone(), value.clone());
        }
        object
    }
}

impl ToolReply {
    /// Renders the reply in the shape the invocation style expects.
    ///
    /// * `function-call`: `{"result": text, ...extra}` for the single call.
    /// * `tool-calls`: `{"results": [{"toolCallId", "result", ...extra}]}`.
    pub fn to_json(&self) -> Value {
        match self.style {
            ToolCallStyle::FunctionCall => match self.results.first() {
                Some(result) => Value::Object(result.to_object(false)),
                None => json!({ "result": "" }),
            },
            ToolCallStyle::ToolCalls => {
                let results: Vec<Value> = self
                    .results
                    .iter()
                    .map(|r| Value::Object(r.to_object(true)))
                    .collect();
                json!({ "results": results })
            }
        }
    }
}

/// Result of handling an event.
///
/// Contains the reply for the platform and effects to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResult {
    pub reply: Reply,

    /// Effects to execute after the reply is sent.
    pub effects: Vec<Effect>,
}

impl HandlerResult {
    /// A plain acknowledgement with no effects.
    pub fn received() -> Self {
        HandlerResult {
            reply: Reply::Received,
            effects: Vec::new(),
        }
    }

    pub fn tool(reply: ToolReply) -> Self {
        HandlerResult {
            reply: Reply::Tool(reply),
            effects: Vec::new(),
        }
    }

    /// An acknowledgement carrying effects.
    pub fn with_effects(effects: Vec<Effect>) -> Self {
        HandlerResult {
            reply: Reply::Received,
            effects,
        }
    }
}

/// Routes events to their handlers and owns the state they share.
pub struct EventDispatcher<S> {
    store: Arc<S>,
    ended: EndedCalls,
    thresholds: PriorityThresholds,
}

impl<S: SessionStore> EventDispatcher<S> {
    pub fn new(store: Arc<S>, thresholds: PriorityThresholds) -> Self {
        EventDispatcher {
            store,
            ended: EndedCalls::new(),
            thresholds,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn thresholds(&self) -> &PriorityThresholds {
        &self.thresholds
    }

    /// Handles a webhook event.
    ///
    /// This is the main entry point for event handling. It dispatches to the
    /// appropriate handler based on the event kind.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tools, unreadable tool arguments, or a
    /// failing session store. Unrecognized event kinds are not errors.
    pub async fn handle_event(&self, event: &VapiEvent) -> Result<HandlerResult, HandlerError> {
        match event {
            VapiEvent::CallStarted(e) => {
                handle_call_started(self.store.as_ref(), &self.ended, e).await
            }
            VapiEvent::CallEnded(e) => {
                handle_call_ended(
                    self.store.as_ref(),
                    &self.ended,
                    &self.thresholds,
                    e,
                    Utc::now(),
                )
                .await
            }
            VapiEvent::ToolInvocation(e) => {
                handle_tool_invocation(self.store.as_ref(), &self.ended, e).await
            }
            VapiEvent::Transcript(_)
            | VapiEvent::ConversationUpdate(_)
            | VapiEvent::StatusUpdate(_)
            | VapiEvent::SpeechUpdate(_)
            | VapiEvent::Unrecognized { .. } => Ok(handle_observation(event)),
        }
    }
}
