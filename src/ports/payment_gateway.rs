//! Payment gateway port.
//!
//! Covers the two outbound calls the bot makes against the gateway REST API:
//! initializing a transaction (to obtain an authorization URL the user can
//! pay through) and disabling a recurring subscription. Webhook signature
//! verification is a pure domain concern and lives in
//! [`crate::domain::billing::PaystackWebhookVerifier`].

use async_trait::async_trait;
use thiserror::Error;

/// Request to initialize a transaction.
#[derive(Debug, Clone)]
pub struct InitializeTransaction {
    /// Customer email (placeholder-derived when the user has none).
    pub email: String,

    /// Amount in kobo.
    pub amount_kobo: u32,

    /// Application metadata echoed back in webhook payloads. Must carry the
    /// `phone_number` and `plan` correlation tags.
    pub metadata: serde_json::Value,
}

/// Handle returned by a successful initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHandle {
    /// URL the customer completes payment through.
    pub authorization_url: String,

    /// Gateway access code for the checkout.
    pub access_code: String,

    /// Gateway transaction reference, the durable correlation key.
    pub reference: String,
}

/// Errors from gateway calls.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No secret key configured; the gateway cannot be used at all.
    #[error("Payment gateway is not configured")]
    Unconfigured,

    /// Transport-level failure reaching the gateway.
    #[error("Gateway request failed: {0}")]
    Http(String),

    /// The gateway answered but rejected the request.
    #[error("Gateway rejected request: {0}")]
    Rejected(String),
}

/// Port for the payment gateway REST API.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a transaction and returns the authorization URL, access code,
    /// and reference. No local state is written by this call.
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<TransactionHandle, GatewayError>;

    /// Disables a recurring subscription by its gateway code.
    async fn disable_subscription(&self, subscription_code: &str) -> Result<(), GatewayError>;
}
