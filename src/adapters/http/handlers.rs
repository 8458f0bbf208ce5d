//! HTTP handlers for the webhook endpoints.
//!
//! Both POST endpoints acknowledge fast and process in a spawned task, so
//! upstream retry timers never observe our processing latency. The one
//! exception is signature verification on the payment webhook, which is
//! cheap and must gate the response code: a spoofed delivery gets 401 and
//! touches nothing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::application::{BotService, SubscriptionReconciler};
use crate::adapters::whatsapp::{decode_events, WebhookPayload};
use crate::domain::dispatch::InboundEvent;

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<BotService>,
    pub reconciler: Arc<SubscriptionReconciler>,
    /// Shared token for the Meta webhook challenge handshake.
    pub verify_token: String,
}

/// `GET /health` - liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /webhook` - Meta challenge-response verification.
///
/// Echoes `hub.challenge` when `hub.mode` is `subscribe` and the verify
/// token matches; 403 on a wrong token, 400 when the parameters are absent.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mode = params.get("hub.mode");
    let token = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge");

    match (mode, token) {
        (Some(mode), Some(token)) => {
            if mode == "subscribe" && *token == state.verify_token {
                tracing::info!("whatsapp webhook verified");
                (StatusCode::OK, challenge.cloned().unwrap_or_default())
            } else {
                tracing::warn!("webhook verification with invalid token");
                (StatusCode::FORBIDDEN, String::new())
            }
        }
        _ => (StatusCode::BAD_REQUEST, String::new()),
    }
}

/// `POST /webhook` - inbound WhatsApp messages.
///
/// Always 200: an unparseable body is logged and dropped, and per-message
/// processing happens after the acknowledgment.
pub async fn receive_messages(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "invalid messaging webhook payload");
            return StatusCode::OK;
        }
    };

    let events = decode_events(&payload);
    tracing::debug!(count = events.len(), "decoded inbound events");

    for event in events {
        let bot = state.bot.clone();
        tokio::spawn(async move {
            bot.handle_event(event).await;
        });
    }

    StatusCode::OK
}

/// `POST /paystack-webhook` - payment gateway notifications.
///
/// The signature check runs synchronously: 401 on mismatch with no state
/// touched. Verified deliveries are acknowledged immediately and applied in
/// the background; application errors reach the user as follow-up messages,
/// never through this response.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get("x-paystack-signature")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let Some(signature) = signature else {
        tracing::warn!("paystack webhook without signature header");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "status": "error", "message": "Missing signature" })),
        );
    };

    if let Err(e) = state.reconciler.verify_signature(&body, &signature) {
        tracing::warn!("rejected paystack webhook with invalid signature");
        return (
            e.status_code(),
            Json(serde_json::json!({ "status": "error", "message": "Invalid signature" })),
        );
    }

    let bot = state.bot.clone();
    let raw_body = body.to_vec();
    tokio::spawn(async move {
        bot.handle_event(InboundEvent::PaymentWebhook {
            raw_body,
            signature,
        })
        .await;
    });

    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
