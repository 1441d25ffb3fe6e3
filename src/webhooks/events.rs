//! Typed webhook events from the voice platform.
//!
//! Every webhook body is an envelope `{ "message": { "type": <kind>, ... } }`.
//! The parser maps the kind (and its accepted aliases) onto the closed
//! [`VapiEvent`] enum. Kinds we do not know become [`VapiEvent::Unrecognized`]
//! so that new upstream event types are acknowledged rather than rejected.
//!
//! # Kind aliases
//!
//! | Variant | Accepted `type` strings |
//! |---------|-------------------------|
//! | `CallStarted` | `call-started` |
//! | `CallEnded` | `call-ended`, `end-of-call-report` |
//! | `ToolInvocation` | `function-call`, `tool-calls` |
//! | `Transcript` | `transcript` |
//! | `ConversationUpdate` | `conversation-update` |
//! | `StatusUpdate` | `status-update` |
//! | `SpeechUpdate` | `speech-update` |

use serde::{Deserialize, Serialize};

use crate::types::{CallId, LeadFields};

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VapiEvent {
    /// A call was connected.
    CallStarted(CallStartedEvent),

    /// A call finished; the end-of-call report may carry analysis data.
    CallEnded(CallEndedEvent),

    /// The assistant invoked one or more tools and is waiting for results.
    ToolInvocation(ToolInvocationEvent),

    /// A transcript fragment.
    Transcript(TranscriptEvent),

    /// The conversation history changed.
    ConversationUpdate(TranscriptEvent),

    /// The call status changed (ringing, in-progress, ended, ...).
    StatusUpdate(StatusUpdateEvent),

    /// Someone started or stopped speaking.
    SpeechUpdate(SpeechUpdateEvent),

    /// An event kind this service does not handle.
    Unrecognized {
        /// The raw `type` string, or empty if the message had none.
        kind: String,
    },
}

impl VapiEvent {
    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &str {
        match self {
            VapiEvent::CallStarted(_) => "call-started",
            VapiEvent::CallEnded(_) => "call-ended",
            VapiEvent::ToolInvocation(e) => match e.style {
                ToolCallStyle::FunctionCall => "function-call",
                ToolCallStyle::ToolCalls => "tool-calls",
            },
            VapiEvent::Transcript(_) => "transcript",
            VapiEvent::ConversationUpdate(_) => "conversation-update",
            VapiEvent::StatusUpdate(_) => "status-update",
            VapiEvent::SpeechUpdate(_) => "speech-update",
            VapiEvent::Unrecognized { kind } => kind.as_str(),
        }
    }

    /// The call this event belongs to, if the payload identified one.
    pub fn call_id(&self) -> Option<&CallId> {
        self.call().and_then(|c| c.call_id.as_ref())
    }

    fn call(&self) -> Option<&CallInfo> {
        match self {
            VapiEvent::CallStarted(e) => Some(&e.call),
            VapiEvent::CallEnded(e) => Some(&e.call),
            VapiEvent::ToolInvocation(e) => Some(&e.call),
            VapiEvent::Transcript(e) | VapiEvent::ConversationUpdate(e) => Some(&e.call),
            VapiEvent::StatusUpdate(e) => Some(&e.call),
            VapiEvent::SpeechUpdate(e) => Some(&e.call),
            VapiEvent::Unrecognized { .. } => None,
        }
    }
}

/// Call identity shared by all call-scoped events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    /// The platform's call id.
    pub call_id: Option<CallId>,

    /// The caller's phone number.
    pub customer_number: Option<String>,
}

impl CallInfo {
    pub fn new(call_id: impl Into<CallId>, customer_number: Option<&str>) -> Self {
        CallInfo {
            call_id: Some(call_id.into()),
            customer_number: customer_number.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStartedEvent {
    pub call: CallInfo,
}

/// End of a call, with whatever the platform's post-call analysis produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallEndedEvent {
    pub call: CallInfo,

    /// Call duration in seconds.
    pub duration: Option<f64>,

    /// Post-call summary text.
    pub summary: Option<String>,

    /// Lead fields extracted by the platform's post-call analysis.
    ///
    /// Empty when the platform did not run structured extraction.
    pub extracted: LeadFields,

    /// Why the call ended (e.g. `customer-ended-call`), for logging.
    pub ended_reason: Option<String>,
}

/// Which envelope the tool invocation arrived in.
///
/// This decides the shape of the reply the platform expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallStyle {
    /// Legacy `function-call`: one call, reply `{"result": ...}`.
    FunctionCall,
    /// `tool-calls`: a list of calls, reply `{"results": [{"toolCallId", "result"}]}`.
    ToolCalls,
}

/// A single tool call requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Platform id for this call; present for the `tool-calls` style.
    pub id: Option<String>,

    /// The tool (function) name.
    pub name: String,

    /// The tool arguments, always a JSON object or null.
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationEvent {
    pub call: CallInfo,
    pub style: ToolCallStyle,
    pub calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub call: CallInfo,
    pub role: Option<String>,
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateEvent {
    pub call: CallInfo,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechUpdateEvent {
    pub call: CallInfo,
    pub role: Option<String>,
    pub status: Option<String>,
}
