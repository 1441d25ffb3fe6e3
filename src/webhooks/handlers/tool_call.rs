//! Handler for `function-call` / `tool-calls` events.
//!
//! Each tool call is answered synchronously: the assistant waits for the
//! result text before speaking again. Arguments are merged into the call's
//! session as lead fields. A tool call for a call that has already ended is
//! still answered, but nothing is stored.
//!
//! # Tools
//!
//! | Tool | Stored | Reply |
//! |------|--------|-------|
//! | `capture_lead_info` | every lead field supplied | thanks the caller by name |
//! | `create_contact` | every lead field supplied | includes a `referenceCode` |
//! | `schedule_demo` | contact fields plus demo next steps | confirms the requested time |

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::store::{EndedCalls, SessionStore};
use crate::types::{CallId, LeadFields, lead::lenient_text, reference_code};
use crate::webhooks::events::{CallInfo, ToolCall, ToolInvocationEvent};

use super::{HandlerError, HandlerResult, ToolReply, ToolResult};

pub const CAPTURE_LEAD_INFO: &str = "capture_lead_info";
pub const CREATE_CONTACT: &str = "create_contact";
pub const SCHEDULE_DEMO: &str = "schedule_demo";

/// Tools the assistant may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    CaptureLeadInfo,
    CreateContact,
    ScheduleDemo,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Tool> {
        match name {
            CAPTURE_LEAD_INFO => Some(Tool::CaptureLeadInfo),
            CREATE_CONTACT => Some(Tool::CreateContact),
            SCHEDULE_DEMO => Some(Tool::ScheduleDemo),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::CaptureLeadInfo => CAPTURE_LEAD_INFO,
            Tool::CreateContact => CREATE_CONTACT,
            Tool::ScheduleDemo => SCHEDULE_DEMO,
        }
    }
}

/// What a single tool call stores and says.
#[derive(Debug, Clone, PartialEq)]
struct ToolOutcome {
    update: LeadFields,
    result: ToolResult,
}

/// Demo timing parameters of `schedule_demo`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemoRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    requested_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    timezone: Option<String>,
}

/// Runs every tool call in the invocation and builds the reply.
///
/// All tool names are checked before anything is written, so an invocation
/// naming an unknown tool leaves the session untouched.
pub async fn handle_tool_invocation<S: SessionStore>(
    store: &S,
    ended: &EndedCalls,
    event: &ToolInvocationEvent,
) -> Result<HandlerResult, HandlerError> {
    let mut planned = Vec::with_capacity(event.calls.len());
    for call in &event.calls {
        let tool = Tool::from_name(&call.name)
            .ok_or_else(|| HandlerError::UnknownFunction(call.name.clone()))?;
        planned.push((call, plan(tool, event.call.call_id.as_ref(), call)?));
    }

    let call_id = event.call.call_id.as_ref().map(CallId::as_str).unwrap_or("");
    let mut results = Vec::with_capacity(planned.len());
    for (call, outcome) in planned {
        record(store, ended, &event.call, outcome.update).await?;
        info!(
            call_id,
            tool = %call.name,
            "tool call handled"
        );
        let mut result = outcome.result;
        result.tool_call_id = call.id.clone();
        results.push(result);
    }

    Ok(HandlerResult::tool(ToolReply {
        style: event.style,
        results,
    }))
}

/// Merges a tool's fields into the session, filling in the caller's number.
///
/// Calls already ended are skipped. The end is checked again after the write:
/// an end that removed the session while this write was pending would leave
/// a session nothing else removes.
async fn record<S: SessionStore>(
    store: &S,
    ended: &EndedCalls,
    call: &CallInfo,
    update: LeadFields,
) -> Result<(), HandlerError> {
    let Some(call_id) = call.call_id.as_ref() else {
        debug!("tool call without a call id; reply only");
        return Ok(());
    };
    if ended.is_ended(call_id) {
        debug!(call_id = %call_id, "tool call after call end; reply only");
        return Ok(());
    }

    let fallback = call
        .customer_number
        .clone()
        .map(LeadFields::with_phone)
        .unwrap_or_default();
    store
        .upsert_with_defaults(call_id, update, fallback)
        .await
        .map_err(HandlerError::store)?;

    if ended.is_ended(call_id) {
        warn!(call_id = %call_id, "call ended during tool call; discarding session");
        store.remove(call_id).await.map_err(HandlerError::store)?;
    }
    Ok(())
}

fn plan(tool: Tool, call_id: Option<&CallId>, call: &ToolCall) -> Result<ToolOutcome, HandlerError> {
    let fields: LeadFields = parse_arguments(tool, &call.arguments)?;
    match tool {
        Tool::CaptureLeadInfo => Ok(ToolOutcome {
            result: ToolResult::new(capture_reply(&fields)),
            update: fields,
        }),
        Tool::CreateContact => {
            let code = match call_id {
                Some(id) => id.reference_code(),
                None => reference_code(&call.arguments.to_string()),
            };
            let name = fields.full_name().unwrap_or_else(|| "you".to_string());
            Ok(ToolOutcome {
                result: ToolResult::new(format!(
                    "I've created a contact record for {name}. Your reference number is {code}."
                ))
                .with_extra("referenceCode", code),
                update: fields,
            })
        }
        Tool::ScheduleDemo => {
            let demo: DemoRequest = parse_arguments(tool, &call.arguments)?;
            let next_steps = match (&demo.requested_time, &demo.timezone) {
                (Some(time), Some(tz)) => format!("Demo requested for {time} ({tz})"),
                (Some(time), None) => format!("Demo requested for {time}"),
                (None, _) => "Demo requested; time to be confirmed".to_string(),
            };
            let reply = match &demo.requested_time {
                Some(time) => format!(
                    "Excellent! I've noted your request for a demo {time}. Our specialist will send you a calendar invite shortly."
                ),
                None => "Excellent! I've noted your demo request. Our specialist will reach out shortly to confirm a time.".to_string(),
            };
            Ok(ToolOutcome {
                update: LeadFields {
                    first_name: fields.first_name,
                    last_name: fields.last_name,
                    email: fields.email,
                    company: fields.company,
                    specific_needs: fields.specific_needs,
                    next_steps: Some(next_steps),
                    call_outcome: Some("Demo scheduled".to_string()),
                    ..LeadFields::default()
                },
                result: ToolResult::new(reply),
            })
        }
    }
}

fn capture_reply(fields: &LeadFields) -> String {
    match (fields.first_name.as_deref(), fields.company.as_deref()) {
        (Some(name), Some(company)) => format!(
            "Thank you {name}! I've captured your information and noted that you're interested in AI solutions for {company}."
        ),
        (Some(name), None) => format!("Thank you {name}! I've captured your information."),
        (None, Some(company)) => format!(
            "Thank you! I've captured your information and noted that you're interested in AI solutions for {company}."
        ),
        (None, None) => "Thank you! I've captured your information.".to_string(),
    }
}

fn parse_arguments<T>(tool: Tool, arguments: &Value) -> Result<T, HandlerError>
where
    T: for<'de> Deserialize<'de>,
{
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(arguments).map_err(|e| HandlerError::InvalidArguments {
        tool: tool.name().to_string(),
        reason: e.to_string(),
    })
}
