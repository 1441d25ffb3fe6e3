//! HTTP server for the lead relay.
//!
//! This module implements the HTTP server that:
//! - Accepts voice-platform webhooks, validates signatures, and dispatches them
//! - Runs the resulting effects (lead emails) on detached tasks
//! - Provides a health check and a notification smoke test
//!
//! # Endpoints
//!
//! - `POST /webhook/vapi` - Accepts platform webhooks (returns 200 with the reply body)
//! - `GET /health` - Returns `{"status":"healthy","timestamp":...}`
//! - `POST /test/notification` - Sends a sample lead email synchronously

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::effects::{Effect, EffectInterpreter};
use crate::notify::{LeadNotifier, Mailer};
use crate::store::SessionStore;
use crate::webhooks::EventDispatcher;

pub mod health;
pub mod test_notification;
pub mod webhook;

pub use health::health_handler;
pub use test_notification::test_notification_handler;
pub use webhook::webhook_handler;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<S, M> {
    inner: Arc<AppStateInner<S, M>>,
}

struct AppStateInner<S, M> {
    dispatcher: EventDispatcher<S>,

    /// Shared with the detached tasks that execute effects.
    notifier: Arc<LeadNotifier<M>>,

    /// Webhook secret for HMAC-SHA256 signature verification.
    /// `None` disables verification.
    webhook_secret: Option<Vec<u8>>,
}

impl<S, M> Clone for AppState<S, M> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, M> AppState<S, M>
where
    S: SessionStore + 'static,
    M: Mailer + 'static,
{
    pub fn new(
        dispatcher: EventDispatcher<S>,
        notifier: LeadNotifier<M>,
        webhook_secret: Option<impl Into<Vec<u8>>>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                dispatcher,
                notifier: Arc::new(notifier),
                webhook_secret: webhook_secret.map(Into::into),
            }),
        }
    }

    pub fn dispatcher(&self) -> &EventDispatcher<S> {
        &self.inner.dispatcher
    }

    pub fn notifier(&self) -> &LeadNotifier<M> {
        &self.inner.notifier
    }

    /// Returns the webhook secret, if verification is enabled.
    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.inner.webhook_secret.as_deref()
    }

    /// Executes effects on a detached task, in order.
    pub fn spawn_effects(&self, effects: Vec<Effect>) -> Option<tokio::task::JoinHandle<()>> {
        if effects.is_empty() {
            return None;
        }
        debug!(count = effects.len(), "Spawning effect execution");
        let notifier = Arc::clone(&self.inner.notifier);
        Some(tokio::spawn(async move {
            for effect in effects {
                notifier.interpret(effect).await;
            }
        }))
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<S, M>(app_state: AppState<S, M>) -> axum::Router
where
    S: SessionStore + 'static,
    M: Mailer + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook/vapi", post(webhook_handler::<S, M>))
        .route("/health", get(health_handler))
        .route("/test/notification", post(test_notification_handler::<S, M>))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
