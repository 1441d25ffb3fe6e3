//! [`Mailer`] backed by the Resend HTTP API.

use std::time::Duration;

use tracing::debug;

use super::{MailError, Mailer, OutboundEmail};

/// Default Resend API base URL.
pub const DEFAULT_API_URL: &str = "https://api.resend.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends email through `POST {api_url}/emails`.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ResendMailer {
    /// Creates a mailer. Without an API key every send fails with
    /// [`MailError::NotConfigured`].
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(ResendMailer {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.api_url)
    }
}

impl Mailer for ResendMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let api_key = self.api_key.as_deref().ok_or(MailError::NotConfigured)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), subject = %email.subject, "email accepted by provider");
        Ok(())
    }
}
