//! Lead priority classification.
//!
//! The qualification score captured during the call decides how urgently
//! sales should follow up. The bucket is business logic, so it is decided
//! here at dispatch time and carried on the notification; the formatter only
//! renders it.
//!
//! # Priority Levels
//!
//! - `High`: score >= `high` threshold (default 8)
//! - `Medium`: score >= `medium` threshold (default 6)
//! - `Low`: anything lower, or no score at all

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default score at or above which a lead is `High` priority.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 8.0;

/// Default score at or above which a lead is `Medium` priority.
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 6.0;

/// Lead priority bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadPriority {
    /// Low urgency; also used when no score was captured.
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
}

impl LeadPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadPriority::Low => "LOW",
            LeadPriority::Medium => "MEDIUM",
            LeadPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score thresholds for the priority buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        PriorityThresholds {
            high: DEFAULT_HIGH_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

impl PriorityThresholds {
    /// Classifies a qualification score.
    ///
    /// # Examples
    ///
    /// ```
    /// use vapi_lead_relay::webhooks::priority::{LeadPriority, PriorityThresholds};
    ///
    /// let thresholds = PriorityThresholds::default();
    /// assert_eq!(thresholds.classify(Some(9.0)), LeadPriority::High);
    /// assert_eq!(thresholds.classify(Some(6.0)), LeadPriority::Medium);
    /// assert_eq!(thresholds.classify(Some(5.5)), LeadPriority::Low);
    /// assert_eq!(thresholds.classify(None), LeadPriority::Low);
    /// ```
    pub fn classify(&self, score: Option<f64>) -> LeadPriority {
        match score {
            Some(s) if s >= self.high => LeadPriority::High,
            Some(s) if s >= self.medium => LeadPriority::Medium,
            Some(_) | None => LeadPriority::Low,
        }
    }
}
