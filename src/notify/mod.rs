//! Lead notification email.
//!
//! [`LeadNotifier`] turns a [`LeadNotification`] into an [`OutboundEmail`]
//! and hands it to a [`Mailer`]. Delivery is best-effort: failures are
//! logged and never surface to the webhook caller.

use std::future::Future;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::effects::{Effect, EffectInterpreter, LeadNotification};

pub mod format;
pub mod resend;

pub use resend::ResendMailer;

/// Default sender mailbox.
pub const DEFAULT_FROM: &str = "Riley AI Assistant <riley@waitlist.software-use.com>";

/// An email ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Errors from building or delivering an email.
#[derive(Debug, Error)]
pub enum MailError {
    /// No provider API key is configured.
    #[error("email provider API key is not configured")]
    NotConfigured,

    /// No recipient address is configured.
    #[error("notification recipient is not configured")]
    MissingRecipient,

    /// The request to the provider failed.
    #[error("email provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers email.
pub trait Mailer: Send + Sync {
    fn send(&self, email: OutboundEmail) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Sends lead notifications to the sales inbox.
pub struct LeadNotifier<M> {
    mailer: M,
    from: String,
    recipient: Option<String>,
}

impl<M: Mailer> LeadNotifier<M> {
    pub fn new(mailer: M, from: impl Into<String>, recipient: Option<String>) -> Self {
        LeadNotifier {
            mailer,
            from: from.into(),
            recipient,
        }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Renders the email for a notification.
    pub fn build_email(&self, notification: &LeadNotification) -> Result<OutboundEmail, MailError> {
        let recipient = self.recipient.as_ref().ok_or(MailError::MissingRecipient)?;
        Ok(OutboundEmail {
            from: self.from.clone(),
            to: vec![recipient.clone()],
            subject: format::subject(notification),
            html: format::html_body(notification, Utc::now()),
        })
    }

    /// Builds and sends the email, returning the outcome.
    pub async fn send_now(&self, notification: &LeadNotification) -> Result<(), MailError> {
        let email = self.build_email(notification)?;
        self.mailer.send(email).await
    }

    /// Builds and sends the email, logging the outcome.
    pub async fn notify(&self, notification: &LeadNotification) {
        let call_id = notification.call_id.as_str();
        match self.send_now(notification).await {
            Ok(()) => info!(
                call_id,
                priority = %notification.priority,
                "lead notification sent"
            ),
            Err(MailError::MissingRecipient) => warn!(
                call_id,
                "no notification recipient configured; lead notification dropped"
            ),
            Err(e) => error!(
                call_id,
                priority = %notification.priority,
                error = %e,
                "failed to send lead notification"
            ),
        }
    }
}

impl<M: Mailer> EffectInterpreter for LeadNotifier<M> {
    async fn interpret(&self, effect: Effect) {
        match effect {
            Effect::NotifyLead(notification) => self.notify(&notification).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingMailer;
    use crate::types::{CallId, LeadFields};
    use crate::webhooks::priority::LeadPriority;

    fn sample() -> LeadNotification {
        LeadNotification::new(
            CallId::new("c1"),
            LeadFields {
                first_name: Some("Ann".to_string()),
                qualification_score: Some(9.0),
                ..LeadFields::default()
            },
            LeadPriority::High,
        )
    }

    #[tokio::test]
    async fn notify_sends_to_recipient() {
        let notifier = LeadNotifier::new(
            RecordingMailer::new(),
            DEFAULT_FROM,
            Some("sales@example.com".to_string()),
        );

        notifier.notify(&sample()).await;

        let sent = notifier.mailer().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["sales@example.com".to_string()]);
        assert_eq!(sent[0].from, DEFAULT_FROM);
        assert_eq!(
            sent[0].subject,
            "🔥 HIGH PRIORITY Inbound Lead - Ann (Score: 9)"
        );
    }

    #[tokio::test]
    async fn missing_recipient_sends_nothing() {
        let notifier = LeadNotifier::new(RecordingMailer::new(), DEFAULT_FROM, None);

        let err = notifier.send_now(&sample()).await.unwrap_err();
        notifier.notify(&sample()).await;

        assert!(matches!(err, MailError::MissingRecipient));
        assert!(notifier.mailer().sent().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_swallowed_by_notify() {
        let notifier = LeadNotifier::new(
            RecordingMailer::failing("boom"),
            DEFAULT_FROM,
            Some("sales@example.com".to_string()),
        );

        notifier.notify(&sample()).await;

        let err = notifier.send_now(&sample()).await.unwrap_err();
        assert!(matches!(err, MailError::Rejected { status: 500, .. }));
    }

    #[tokio::test]
    async fn interprets_notify_effect() {
        let notifier = LeadNotifier::new(
            RecordingMailer::new(),
            DEFAULT_FROM,
            Some("sales@example.com".to_string()),
        );

        notifier.interpret(Effect::NotifyLead(sample())).await;

        assert_eq!(notifier.mailer().sent().len(), 1);
    }
}
