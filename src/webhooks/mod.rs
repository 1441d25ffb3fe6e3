//! Webhook handling for voice-platform events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Event parsing into the closed [`VapiEvent`] enum
//! - Lead priority classification
//! - Event handlers returning replies and effects

pub mod events;
pub mod handlers;
pub mod parser;
pub mod priority;
pub mod signature;

pub use events::{
    CallEndedEvent, CallInfo, CallStartedEvent, SpeechUpdateEvent, StatusUpdateEvent, ToolCall,
    ToolCallStyle, ToolInvocationEvent, TranscriptEvent, VapiEvent,
};
pub use handlers::{EventDispatcher, HandlerError, HandlerResult, Reply, ToolReply, ToolResult};
pub use parser::{ParseError, parse_webhook};
pub use priority::{LeadPriority, PriorityThresholds};
pub use signature::{
    compute_signature, format_signature, parse_signature, verify_request, verify_signature,
};
