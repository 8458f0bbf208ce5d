//! Durable user store port.
//!
//! The single source of truth for identity and entitlement. Implementations
//! must make [`apply_activation`](UserStore::apply_activation) a
//! deterministic overwrite: replaying the same activation leaves the row in
//! the same final state, which is what makes duplicate webhook delivery
//! harmless.

use async_trait::async_trait;

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{DomainError, PhoneNumber, Timestamp};
use crate::domain::user::User;

/// Deterministic subscription update produced by a verified success event.
///
/// Every field is derived from the event itself (plan, embedded timestamp,
/// reference), never from the row's prior state.
#[derive(Debug, Clone)]
pub struct SubscriptionActivation {
    pub email: Option<String>,
    pub plan: SubscriptionPlan,
    pub expires_at: Timestamp,
    pub payment_reference: Option<String>,
    pub subscription_code: Option<String>,
    /// One-way digest of the gateway authorization credential; the clear
    /// form must never reach storage.
    pub authorization_digest: Option<String>,
    /// Bookkeeping merged into the user's metadata blob.
    pub metadata: serde_json::Value,
}

/// Port for the durable user store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by phone number.
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, DomainError>;

    /// Fetches the user, creating a fresh inactive record on first contact.
    async fn get_or_create(&self, phone: &PhoneNumber) -> Result<User, DomainError>;

    /// Secondary correlation lookup by the stored gateway reference, used
    /// when webhook metadata carries no phone tag.
    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Correlation lookup by gateway subscription code, used for
    /// cancellation events.
    async fn find_by_subscription_code(
        &self,
        code: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Records the reference of a freshly issued payment link.
    async fn store_payment_reference(
        &self,
        phone: &PhoneNumber,
        reference: &str,
        plan: SubscriptionPlan,
    ) -> Result<(), DomainError>;

    /// Applies a verified activation: status `active`, plan, expiry,
    /// correlation fields. Must be an idempotent overwrite.
    async fn apply_activation(
        &self,
        phone: &PhoneNumber,
        activation: &SubscriptionActivation,
    ) -> Result<User, DomainError>;

    /// Sets status `inactive`, recording the reason in metadata. Users are
    /// never hard-deleted. Returns the updated row, or `None` for an
    /// unknown phone.
    async fn deactivate(
        &self,
        phone: &PhoneNumber,
        reason: &str,
    ) -> Result<Option<User>, DomainError>;
}
