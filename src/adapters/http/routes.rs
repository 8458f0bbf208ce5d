//! Axum router configuration.
//!
//! # Routes
//!
//! - `GET  /health` - liveness probe
//! - `GET  /webhook` - WhatsApp webhook verification (challenge-response)
//! - `POST /webhook` - inbound WhatsApp messages
//! - `POST /paystack-webhook` - payment gateway notifications

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{health, paystack_webhook, receive_messages, verify_webhook, AppState};

/// Builds the application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", get(verify_webhook).post(receive_messages))
        .route("/paystack-webhook", post(paystack_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
