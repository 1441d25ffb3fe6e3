//! Core domain types for the lead relay.

pub mod ids;
pub mod lead;

pub use ids::{CallId, reference_code};
pub use lead::{LeadFields, format_number};
