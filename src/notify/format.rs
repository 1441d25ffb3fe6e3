//! Rendering of lead notifications as email.
//!
//! Every interpolated value comes from the caller (via the assistant) and is
//! HTML-escaped before it reaches the body.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::effects::LeadNotification;
use crate::types::format_number;
use crate::webhooks::priority::LeadPriority;

/// Headline used when the lead has neither a company nor a first name.
const UNKNOWN_CALLER: &str = "Unknown Caller";

/// Builds the subject line.
///
/// `"🔥 {PRIORITY} PRIORITY Inbound Lead - {company or first name} (Score: {score or N/A})"`
pub fn subject(notification: &LeadNotification) -> String {
    let lead = &notification.lead;
    let headline = lead
        .company
        .as_deref()
        .or(lead.first_name.as_deref())
        .unwrap_or(UNKNOWN_CALLER);
    format!(
        "🔥 {} PRIORITY Inbound Lead - {} (Score: {})",
        notification.priority,
        headline,
        lead.score_label()
    )
}

fn priority_color(priority: LeadPriority) -> &'static str {
    match priority {
        LeadPriority::High => "#ff4444",
        LeadPriority::Medium => "#ff8800",
        LeadPriority::Low => "#44ff44",
    }
}

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const H2_STYLE: &str = "color: #333; border-bottom: 2px solid #667eea; padding-bottom: 10px;";
const LABEL_STYLE: &str = "font-weight: bold; padding: 5px 0;";

fn row(html: &mut String, label: &str, value: Option<&str>, fallback: &str) {
    let value = escape_html(value.unwrap_or(fallback));
    // Writing to a String cannot fail.
    let _ = write!(
        html,
        r#"<tr><td style="{LABEL_STYLE}">{label}:</td><td>{value}</td></tr>"#
    );
}

fn section(html: &mut String, title: &str, table_style: &str) {
    let _ = write!(
        html,
        r#"<h2 style="{H2_STYLE}">{title}</h2><table style="{table_style}">"#
    );
}

/// Builds the HTML body.
///
/// Sections: Contact Information, Lead Intelligence, Call Details, and the
/// call notes when present. `sent_at` is shown as the call date.
pub fn html_body(notification: &LeadNotification, sent_at: DateTime<Utc>) -> String {
    let lead = &notification.lead;
    let priority = notification.priority;
    let score = escape_html(&lead.score_label());
    let mut html = String::with_capacity(4096);

    let _ = write!(
        html,
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<div style="background: linear-gradient(90deg, #667eea 0%, #764ba2 100%); padding: 20px; text-align: center;">
<h1 style="color: white; margin: 0;">New Inbound Lead via Riley AI</h1>
<div style="background: {color}; color: white; padding: 8px 16px; border-radius: 20px; display: inline-block; margin-top: 10px; font-weight: bold;">{priority} PRIORITY (Score: {score}/10)</div>
</div>
<div style="padding: 30px; background: #f9f9f9;">
"#,
        color = priority_color(priority),
    );

    section(&mut html, "Contact Information", "width: 100%; margin-bottom: 20px;");
    row(&mut html, "Name", lead.full_name().as_deref(), "Not provided");
    row(&mut html, "Phone", lead.phone_number.as_deref(), "Not provided");
    row(&mut html, "Email", lead.email.as_deref(), "Not provided");
    row(&mut html, "Company", lead.company.as_deref(), "Not provided");
    row(&mut html, "Industry", lead.industry.as_deref(), "Not specified");
    row(&mut html, "Company Size", lead.employee_count.as_deref(), "Not specified");
    html.push_str("</table>\n");

    section(
        &mut html,
        "Lead Intelligence",
        "width: 100%; margin-bottom: 20px; background: white; padding: 15px; border-radius: 8px;",
    );
    row(&mut html, "Pain Point", lead.pain_point.as_deref(), "Not identified");
    row(&mut html, "Timeline", lead.timeline.as_deref(), "Not specified");
    row(&mut html, "Budget Range", lead.budget.as_deref(), "Not discussed");
    row(&mut html, "Specific Needs", lead.specific_needs.as_deref(), "Not specified");
    row(&mut html, "Call Outcome", lead.call_outcome.as_deref(), "Information gathering");
    row(&mut html, "Next Steps", lead.next_steps.as_deref(), "Follow-up required");
    html.push_str("</table>\n");

    section(&mut html, "Call Details", "width: 100%; margin-bottom: 20px;");
    let duration = duration_label(lead.duration);
    row(&mut html, "Call Duration", Some(duration.as_str()), "");
    let call_date = sent_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    row(&mut html, "Call Date", Some(call_date.as_str()), "");
    row(&mut html, "Call ID", Some(notification.call_id.as_str()), "");
    row(&mut html, "Lead Source", Some("Inbound Call - Riley AI"), "");
    html.push_str("</table>\n");

    if let Some(notes) = &lead.notes {
        let _ = write!(
            html,
            r#"<h2 style="{H2_STYLE}">Riley's Notes</h2>
<div style="background: white; padding: 15px; border-radius: 8px; border-left: 4px solid #667eea;"><p style="margin: 0;">{}</p></div>
"#,
            escape_html(notes)
        );
    }

    html.push_str(
        r#"</div>
<div style="background: #333; color: white; padding: 15px; text-align: center;"><p style="margin: 0;">Generated by Riley AI Assistant | Questom Inbound Lead System</p></div>
</div>
"#,
    );
    html
}

/// `"{seconds} seconds ({minutes} minutes)"`, rounded.
fn duration_label(duration: Option<f64>) -> String {
    let seconds = duration.unwrap_or(0.0).max(0.0);
    format!(
        "{} seconds ({} minutes)",
        format_number(seconds.round()),
        format_number((seconds / 60.0).round())
    )
}
