//! Webhook payload parser.
//!
//! Parses raw webhook JSON into a typed [`VapiEvent`].
//!
//! # Parsing Strategy
//!
//! 1. The body must be JSON; anything else is a [`ParseError::Json`].
//! 2. The event kind comes from `message.type`. A missing `message` or `type`
//!    yields [`VapiEvent::Unrecognized`] with an empty kind.
//! 3. Known kinds are parsed into their typed payloads. Unknown kinds become
//!    [`VapiEvent::Unrecognized`] (ignored, not an error).
//! 4. A known kind whose payload has the wrong shape returns
//!    [`ParseError::InvalidPayload`] with the kind for diagnostics.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::types::{CallId, LeadFields};

use super::events::{
    CallEndedEvent, CallInfo, CallStartedEvent, SpeechUpdateEvent, StatusUpdateEvent, ToolCall,
    ToolCallStyle, ToolInvocationEvent, TranscriptEvent, VapiEvent,
};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A recognized event kind carried a payload of the wrong shape.
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: String, reason: String },
}

impl ParseError {
    fn invalid(kind: &str, reason: impl ToString) -> Self {
        ParseError::InvalidPayload {
            kind: kind.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parses a webhook body into a typed event.
///
/// # Examples
///
/// ```
/// use vapi_lead_relay::webhooks::{VapiEvent, parse_webhook};
///
/// let body = br#"{
///     "message": {
///         "type": "call-started",
///         "call": { "id": "c1", "customer": { "number": "+15551234567" } }
///     }
/// }"#;
///
/// let event = parse_webhook(body).unwrap();
/// assert!(matches!(event, VapiEvent::CallStarted(_)));
/// ```
pub fn parse_webhook(payload: &[u8]) -> Result<VapiEvent, ParseError> {
    let envelope: RawEnvelope = serde_json::from_slice(payload)?;

    let Some(Value::Object(message)) = envelope.message else {
        return Ok(VapiEvent::Unrecognized {
            kind: String::new(),
        });
    };
    let message = Value::Object(message);

    let kind = message
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match kind.as_str() {
        "call-started" => parse_call_started(&kind, message).map(VapiEvent::CallStarted),
        "call-ended" | "end-of-call-report" => {
            parse_call_ended(&kind, message).map(VapiEvent::CallEnded)
        }
        "function-call" => {
            parse_tool_invocation(&kind, message, ToolCallStyle::FunctionCall)
                .map(VapiEvent::ToolInvocation)
        }
        "tool-calls" => parse_tool_invocation(&kind, message, ToolCallStyle::ToolCalls)
            .map(VapiEvent::ToolInvocation),
        "transcript" => parse_transcript(&kind, message).map(VapiEvent::Transcript),
        "conversation-update" => {
            parse_transcript(&kind, message).map(VapiEvent::ConversationUpdate)
        }
        "status-update" => parse_status_update(&kind, message).map(VapiEvent::StatusUpdate),
        "speech-update" => parse_speech_update(&kind, message).map(VapiEvent::SpeechUpdate),
        // Unknown kinds are acknowledged, not rejected
        _ => Ok(VapiEvent::Unrecognized { kind }),
    }
}

// ============================================================================
// Raw payload structures for deserialization
//
// These follow the platform's JSON. Options everywhere: the platform adds and
// omits fields freely, and required fields are validated by the handlers.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    message: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    call: Option<RawCall>,
    customer: Option<RawCustomer>,
    analysis: Option<RawAnalysis>,
    summary: Option<String>,
    duration_seconds: Option<f64>,
    ended_reason: Option<String>,
    function_call: Option<RawFunctionCall>,
    tool_call_list: Option<Vec<RawToolCall>>,
    tool_calls: Option<Vec<RawToolCall>>,
    role: Option<String>,
    transcript: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCall {
    id: Option<String>,
    customer: Option<RawCustomer>,
    duration: Option<f64>,
    analysis: Option<RawAnalysis>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCustomer {
    number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    summary: Option<String>,
    extracted_info: Option<Value>,
    structured_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawFunctionCall {
    name: String,
    parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawToolCall {
    id: Option<String>,
    function: RawToolFunction,
}

#[derive(Debug, Deserialize)]
struct RawToolFunction {
    name: String,
    arguments: Option<Value>,
}

fn raw_message(kind: &str, message: Value) -> Result<RawMessage, ParseError> {
    serde_json::from_value(message).map_err(|e| ParseError::invalid(kind, e))
}

/// Extracts the call identity, preferring `call.customer` over `customer`.
fn call_info(raw: &RawMessage) -> CallInfo {
    let call_id = raw
        .call
        .as_ref()
        .and_then(|c| c.id.as_deref())
        .filter(|id| !id.is_empty())
        .map(CallId::from);

    let customer_number = raw
        .call
        .as_ref()
        .and_then(|c| c.customer.as_ref())
        .or(raw.customer.as_ref())
        .and_then(|c| c.number.clone())
        .filter(|n| !n.is_empty());

    CallInfo {
        call_id,
        customer_number,
    }
}

fn parse_call_started(kind: &str, message: Value) -> Result<CallStartedEvent, ParseError> {
    let raw = raw_message(kind, message)?;
    Ok(CallStartedEvent {
        call: call_info(&raw),
    })
}

fn parse_call_ended(kind: &str, message: Value) -> Result<CallEndedEvent, ParseError> {
    let raw = raw_message(kind, message)?;
    let call = call_info(&raw);

    let call_analysis = raw.call.as_ref().and_then(|c| c.analysis.as_ref());
    let message_analysis = raw.analysis.as_ref();

    let duration = raw
        .call
        .as_ref()
        .and_then(|c| c.duration)
        .or(raw.duration_seconds);

    let summary = call_analysis
        .and_then(|a| a.summary.clone())
        .or_else(|| message_analysis.and_then(|a| a.summary.clone()))
        .or(raw.summary)
        .filter(|s| !s.trim().is_empty());

    // Message-level structured data first, so call-level extraction wins.
    let mut extracted = LeadFields::default();
    for analysis in [message_analysis, call_analysis].into_iter().flatten() {
        for fields in [&analysis.structured_data, &analysis.extracted_info]
            .into_iter()
            .flatten()
        {
            extracted.merge(analysis_fields(kind, fields));
        }
    }

    Ok(CallEndedEvent {
        call,
        duration,
        summary,
        extracted,
        ended_reason: raw.ended_reason,
    })
}

/// Converts post-call analysis output into lead fields.
///
/// Analysis output is produced by a model and is not always well-formed, so a
/// bad shape is logged and dropped instead of failing the whole call-ended
/// event (which would leave the session un-evicted).
fn analysis_fields(kind: &str, value: &Value) -> LeadFields {
    match LeadFields::deserialize(value) {
        Ok(fields) => fields,
        Err(e) => {
            warn!(event_kind = %kind, error = %e, "Ignoring malformed call analysis data");
            LeadFields::default()
        }
    }
}

fn parse_tool_invocation(
    kind: &str,
    message: Value,
    style: ToolCallStyle,
) -> Result<ToolInvocationEvent, ParseError> {
    let raw = raw_message(kind, message)?;
    let call = call_info(&raw);

    let mut calls = Vec::new();
    if let Some(function_call) = raw.function_call {
        calls.push(ToolCall {
            id: None,
            name: function_call.name,
            arguments: normalize_arguments(kind, function_call.parameters)?,
        });
    }
    for tool_call in raw
        .tool_call_list
        .or(raw.tool_calls)
        .into_iter()
        .flatten()
    {
        calls.push(ToolCall {
            id: tool_call.id,
            name: tool_call.function.name,
            arguments: normalize_arguments(kind, tool_call.function.arguments)?,
        });
    }

    if calls.is_empty() {
        return Err(ParseError::invalid(kind, "no tool call in message"));
    }

    Ok(ToolInvocationEvent { call, style, calls })
}

/// Tool arguments arrive either as an object or as a JSON-encoded string.
fn normalize_arguments(kind: &str, arguments: Option<Value>) -> Result<Value, ParseError> {
    match arguments {
        None | Some(Value::Null) => Ok(Value::Object(Default::default())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Value::Object(Default::default())),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(_) => Err(ParseError::invalid(kind, "tool arguments are not an object")),
            Err(e) => Err(ParseError::invalid(kind, e)),
        },
        Some(value @ Value::Object(_)) => Ok(value),
        Some(_) => Err(ParseError::invalid(kind, "tool arguments are not an object")),
    }
}

fn parse_transcript(kind: &str, message: Value) -> Result<TranscriptEvent, ParseError> {
    let raw = raw_message(kind, message)?;
    Ok(TranscriptEvent {
        call: call_info(&raw),
        role: raw.role,
        transcript: raw.transcript,
    })
}

fn parse_status_update(kind: &str, message: Value) -> Result<StatusUpdateEvent, ParseError> {
    let raw = raw_message(kind, message)?;
    Ok(StatusUpdateEvent {
        call: call_info(&raw),
        status: raw.status,
    })
}

fn parse_speech_update(kind: &str, message: Value) -> Result<SpeechUpdateEvent, ParseError> {
    let raw = raw_message(kind, message)?;
    Ok(SpeechUpdateEvent {
        call: call_info(&raw),
        role: raw.role,
        status: raw.status,
    })
}
