//! Vapi Lead Relay - receives voice-assistant webhooks and emails qualified
//! inbound leads to sales.
//!
//! This library provides the webhook verification, event handling, per-call
//! session store, and notification pipeline; `main` wires them to an HTTP
//! server.

pub mod config;
pub mod effects;
pub mod notify;
pub mod server;
pub mod store;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
