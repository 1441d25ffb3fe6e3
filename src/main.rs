use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vapi_lead_relay::config::Config;
use vapi_lead_relay::notify::{LeadNotifier, ResendMailer};
use vapi_lead_relay::server::{AppState, build_router};
use vapi_lead_relay::store::InMemorySessionStore;
use vapi_lead_relay::webhooks::EventDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vapi_lead_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    let mailer = ResendMailer::new(config.resend_api_url.clone(), config.resend_api_key.clone())
        .context("failed to build email client")?;
    let notifier = LeadNotifier::new(
        mailer,
        config.notification_from.clone(),
        config.notification_email.clone(),
    );
    let dispatcher = EventDispatcher::new(Arc::new(InMemorySessionStore::new()), config.thresholds);
    let state = AppState::new(
        dispatcher,
        notifier,
        config.webhook_secret.clone().map(String::into_bytes),
    );

    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        high = config.thresholds.high,
        medium = config.thresholds.medium,
        "listening; endpoints: POST /webhook/vapi, GET /health, POST /test/notification"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
