//! Service Configuration
//!
//! Loads configuration from environment variables. `main` loads a `.env`
//! file first, so local development can keep secrets out of the shell.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

use crate::notify::DEFAULT_FROM;
use crate::notify::resend::DEFAULT_API_URL;
use crate::webhooks::priority::{DEFAULT_HIGH_THRESHOLD, DEFAULT_MEDIUM_THRESHOLD, PriorityThresholds};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Shared HMAC secret for webhook signatures. `None` disables verification.
    pub webhook_secret: Option<String>,

    /// Resend API key. Without it notification sends fail.
    pub resend_api_key: Option<String>,

    /// Resend API base URL (default: `https://api.resend.com`)
    pub resend_api_url: String,

    /// Where lead notifications go.
    pub notification_email: Option<String>,

    /// Sender mailbox for lead notifications.
    pub notification_from: String,

    pub bind_host: IpAddr,
    pub port: u16,

    pub thresholds: PriorityThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            webhook_secret: None,
            resend_api_key: None,
            resend_api_url: DEFAULT_API_URL.to_string(),
            notification_email: None,
            notification_from: DEFAULT_FROM.to_string(),
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            thresholds: PriorityThresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let thresholds = PriorityThresholds {
            high: parse_or(&get, "LEAD_PRIORITY_HIGH", DEFAULT_HIGH_THRESHOLD)?,
            medium: parse_or(&get, "LEAD_PRIORITY_MEDIUM", DEFAULT_MEDIUM_THRESHOLD)?,
        };
        if !(thresholds.high.is_finite() && thresholds.medium.is_finite())
            || thresholds.medium > thresholds.high
        {
            return Err(ConfigError::Invalid {
                name: "LEAD_PRIORITY_MEDIUM",
                value: thresholds.medium.to_string(),
                reason: format!("must be finite and not above the high threshold {}", thresholds.high),
            });
        }

        Ok(Config {
            webhook_secret: get("VAPI_WEBHOOK_SECRET"),
            resend_api_key: get("RESEND_API_KEY"),
            resend_api_url: get("RESEND_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            notification_email: get("NOTIFICATION_EMAIL"),
            notification_from: get("NOTIFICATION_FROM").unwrap_or_else(|| DEFAULT_FROM.into()),
            bind_host: parse_or(&get, "BIND_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            thresholds,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }

    /// Human-readable notes about missing optional settings, for startup logs.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.webhook_secret.is_none() {
            warnings.push("VAPI_WEBHOOK_SECRET is not set; webhook signatures will NOT be verified");
        }
        if self.resend_api_key.is_none() {
            warnings.push("RESEND_API_KEY is not set; lead notifications will fail to send");
        }
        if self.notification_email.is_none() {
            warnings.push("NOTIFICATION_EMAIL is not set; lead notifications will be dropped");
        }
        warnings
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
