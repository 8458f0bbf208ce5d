//! Paystack payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the Paystack REST API.
//! Covers transaction initialization (payment links) and subscription
//! disabling. Amounts are always in kobo.
//!
//! # Security
//!
//! The secret key is held as `secrecy::SecretString` and only exposed at the
//! moment the Authorization header is built.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{GatewayError, InitializeTransaction, PaymentGateway, TransactionHandle};

const DEFAULT_API_BASE: &str = "https://api.paystack.co";

/// Paystack API configuration.
#[derive(Clone)]
pub struct PaystackConfig {
    /// Account secret key (sk_live_... or sk_test_...). `None` leaves the
    /// gateway unconfigured; calls fail fast with `Unconfigured`.
    secret_key: Option<SecretString>,

    /// Base URL for the Paystack API.
    api_base_url: String,
}

impl PaystackConfig {
    /// Creates a configuration with the given secret key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: Some(SecretString::new(secret_key.into())),
            api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Creates an unconfigured instance; every call returns `Unconfigured`.
    pub fn unconfigured() -> Self {
        Self {
            secret_key: None,
            api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL (for tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Paystack implementation of the `PaymentGateway` port.
pub struct PaystackGateway {
    config: PaystackConfig,
    http_client: reqwest::Client,
}

/// Envelope every Paystack response arrives in.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

impl PaystackGateway {
    /// Creates a new gateway adapter.
    pub fn new(config: PaystackConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn secret(&self) -> Result<&SecretString, GatewayError> {
        self.config.secret_key.as_ref().ok_or_else(|| {
            tracing::warn!("paystack secret key not configured");
            GatewayError::Unconfigured
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<TransactionHandle, GatewayError> {
        let secret = self.secret()?;
        let url = format!("{}/transaction/initialize", self.config.api_base_url);

        let body = serde_json::json!({
            "email": request.email,
            "amount": request.amount_kobo,
            "metadata": request.metadata,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(secret.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let envelope: ApiEnvelope<InitializeData> = response
            .json()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !envelope.status {
            let message = envelope
                .message
                .unwrap_or_else(|| "initialization rejected".to_string());
            tracing::warn!(message = %message, "paystack initialization rejected");
            return Err(GatewayError::Rejected(message));
        }

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::Rejected("empty response data".to_string()))?;

        Ok(TransactionHandle {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn disable_subscription(&self, subscription_code: &str) -> Result<(), GatewayError> {
        let secret = self.secret()?;
        let url = format!("{}/subscription/disable", self.config.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(secret.expose_secret())
            .json(&serde_json::json!({ "code": subscription_code }))
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let envelope: ApiEnvelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !envelope.status {
            return Err(GatewayError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "disable rejected".to_string()),
            ));
        }

        Ok(())
    }
}
