//! Lead data accumulated over the lifetime of a call.
//!
//! Every field is optional. Tool invocations deliver partial updates which are
//! merged field by field: a later update overwrites only the keys it supplies.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Lead/contact fields for one call session.
///
/// Field names on the wire are camelCase, matching the tool parameters the
/// voice assistant is configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFields {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub pain_point: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    /// Qualification score, expected in `0..=10`.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub qualification_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub call_outcome: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Call duration in seconds.
    #[serde(
        default,
        alias = "durationSeconds",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub specific_needs: Option<String>,
}

macro_rules! merge_fields {
    ($dst:expr, $src:expr, [$($field:ident),* $(,)?]) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field;
            }
        )*
    };
}

impl LeadFields {
    /// Merges `update` into `self`, overwriting only the fields it supplies.
    pub fn merge(&mut self, update: LeadFields) {
        merge_fields!(
            self,
            update,
            [
                phone_number,
                first_name,
                last_name,
                email,
                company,
                industry,
                employee_count,
                pain_point,
                timeline,
                budget,
                qualification_score,
                call_outcome,
                next_steps,
                notes,
                duration,
                specific_needs,
            ]
        );
    }

    /// Returns `self` with `update` merged in.
    pub fn merged(mut self, update: LeadFields) -> Self {
        self.merge(update);
        self
    }

    /// A fragment carrying only a phone number.
    pub fn with_phone(number: impl Into<String>) -> Self {
        LeadFields {
            phone_number: Some(number.into()),
            ..LeadFields::default()
        }
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == LeadFields::default()
    }

    /// Returns true if the session captured enough to be worth a notification.
    ///
    /// A first name or a qualification score means a tool call actually
    /// populated the lead; anything less is a hang-up or a placeholder.
    pub fn is_substantive(&self) -> bool {
        self.first_name.is_some() || self.qualification_score.is_some()
    }

    /// "First Last", whichever parts are known.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// The qualification score formatted for humans, or `"N/A"`.
    pub fn score_label(&self) -> String {
        match self.qualification_score {
            Some(score) => format_number(score),
            None => "N/A".to_string(),
        }
    }
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Accepts a string, number, or boolean; blank strings become `None`.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

/// Accepts a number or a finite numeric string; blank strings become `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("number out of range: {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a number, found \"{s}\""))),
        Some(other) => Err(D::Error::custom(format!("expected a number, found {other}"))),
    }
}
