//! Process entry point: configuration, client handles, wiring, serving.
//!
//! Every store and gateway handle is constructed here and injected into the
//! application services; nothing holds module-level connection state.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use prepbot::adapters::http::{app_router, AppState};
use prepbot::adapters::paystack::{PaystackConfig, PaystackGateway};
use prepbot::adapters::postgres::{PostgresResultLog, PostgresUserStore};
use prepbot::adapters::redis::RedisSessionStore;
use prepbot::adapters::whatsapp::{CloudApiConfig, WhatsAppNotifier};
use prepbot::adapters::memory::InMemoryQuestionBank;
use prepbot::application::{BotService, SubscriptionReconciler};
use prepbot::config::AppConfig;
use prepbot::domain::billing::PaystackWebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    config.validate()?;

    // Durable stores.
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.acquire_timeout_secs,
        ))
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Ephemeral store.
    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = tokio::time::timeout(
        config.redis.timeout(),
        redis_client.get_multiplexed_tokio_connection(),
    )
    .await
    .map_err(|_| "redis connection timed out")??;

    // Port implementations.
    let users = Arc::new(PostgresUserStore::new(pool.clone()));
    let results = Arc::new(PostgresResultLog::new(pool.clone()));
    let sessions = Arc::new(RedisSessionStore::new(redis_conn));
    let questions = Arc::new(InMemoryQuestionBank::seeded());

    let gateway = Arc::new(PaystackGateway::new(
        match &config.payment.paystack_secret_key {
            Some(key) if !key.is_empty() => PaystackConfig::new(key.clone()),
            _ => PaystackConfig::unconfigured(),
        },
    ));
    let notifier = Arc::new(WhatsAppNotifier::new(
        match (&config.whatsapp.access_token, &config.whatsapp.phone_number_id) {
            (Some(token), Some(phone_id)) if config.whatsapp.can_send() => CloudApiConfig::new(
                token.clone(),
                phone_id.clone(),
                config.whatsapp.api_version.clone(),
            ),
            _ => CloudApiConfig::unconfigured(),
        },
    ));

    let verifier = PaystackWebhookVerifier::new(
        config
            .payment
            .paystack_secret_key
            .clone()
            .unwrap_or_default(),
    );

    // Application services.
    let reconciler = Arc::new(SubscriptionReconciler::new(
        users.clone(),
        sessions.clone(),
        gateway.clone(),
        notifier.clone(),
        verifier,
    ));
    let bot = Arc::new(BotService::new(
        users,
        sessions,
        questions,
        results,
        notifier,
        gateway,
        reconciler.clone(),
    ));

    let state = AppState {
        bot,
        reconciler,
        verify_token: config.whatsapp.verify_token.clone(),
    };

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        test_mode = config.payment.is_test_mode(),
        can_send = config.whatsapp.can_send(),
        "prepbot listening"
    );

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Scoped lifecycle: release the pool before exiting.
    pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
