//! Billing error types, with HTTP status mapping for the webhook endpoint.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during purchase initiation and webhook reconciliation.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The requested plan code is not one we sell.
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Failed to parse the webhook payload.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The payment gateway could not be reached or is unconfigured.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// A verified successful payment could not be recorded against the user.
    ///
    /// This is the one error that must reach the user as a distinct
    /// "contact support" notice rather than a generic failure.
    #[error("Payment verified but entitlement not applied: {0}")]
    EntitlementNotApplied(String),

    /// Store operation failed before any entitlement was at stake.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BillingError {
    /// Maps the error to the HTTP status the webhook endpoint responds with.
    ///
    /// Only signature failures reject the request outright; everything else
    /// is acknowledged because the gateway retries on non-2xx and our
    /// processing errors are surfaced to the user out of band.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::SignatureInvalid => StatusCode::UNAUTHORIZED,
            BillingError::MalformedEvent(_) | BillingError::InvalidPlan(_) => {
                StatusCode::BAD_REQUEST
            }
            BillingError::GatewayUnavailable(_)
            | BillingError::EntitlementNotApplied(_)
            | BillingError::Storage(_) => StatusCode::OK,
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        BillingError::Storage(err.to_string())
    }
}
