//! Durable user record and entitlement logic.
//!
//! The user row is the single source of truth for entitlement. Ephemeral
//! session state can be lost without touching anything here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{PhoneNumber, Timestamp};

/// Subscription status on the user record.
///
/// Users are never hard-deleted; cancellation and failed renewals set
/// `Inactive` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Durable user record keyed by phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub phone_number: PhoneNumber,

    /// Backfilled lazily; a placeholder is derived from the phone number
    /// when a purchase needs one before the user has supplied theirs.
    pub email: Option<String>,

    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub entitlement_expires_at: Option<Timestamp>,

    /// Last gateway transaction reference, written when a payment link is
    /// issued and confirmed by the webhook. Doubles as the secondary
    /// correlation key when webhook metadata carries no phone tag.
    pub payment_reference: Option<String>,

    /// Gateway subscription code for recurring plans.
    pub subscription_code: Option<String>,

    /// One-way digest of the gateway authorization credential. The clear
    /// form is never stored.
    pub authorization_digest: Option<String>,

    /// Opaque metadata blob (deactivation reasons, webhook bookkeeping).
    pub metadata: serde_json::Value,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Creates a fresh user with no entitlement.
    pub fn new(phone_number: PhoneNumber) -> Self {
        let now = Timestamp::now();
        Self {
            id: Uuid::new_v4(),
            phone_number,
            email: None,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_plan: None,
            entitlement_expires_at: None,
            payment_reference: None,
            subscription_code: None,
            authorization_digest: None,
            metadata: serde_json::Value::Object(Default::default()),
            created_at: now,
            updated_at: now,
        }
    }

    /// True if the user holds a live entitlement at `now`.
    ///
    /// Requires `Active` status and an unexpired window. An expiry in the
    /// past gates access immediately even before any cancellation event
    /// lands.
    pub fn has_active_subscription(&self, now: Timestamp) -> bool {
        self.subscription_status == SubscriptionStatus::Active
            && self
                .entitlement_expires_at
                .map(|expiry| expiry.is_after(&now))
                .unwrap_or(false)
    }

    /// Email to use for gateway calls, deriving a placeholder if unset.
    pub fn billing_email(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| self.phone_number.placeholder_email())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> PhoneNumber {
        PhoneNumber::new("2348012345678").unwrap()
    }

    #[test]
    fn new_user_has_no_entitlement() {
        let user = User::new(phone());
        assert_eq!(user.subscription_status, SubscriptionStatus::Inactive);
        assert!(!user.has_active_subscription(Timestamp::now()));
    }

    #[test]
    fn active_with_future_expiry_has_access() {
        let mut user = User::new(phone());
        user.subscription_status = SubscriptionStatus::Active;
        user.entitlement_expires_at = Some(Timestamp::now().add_days(10));

        assert!(user.has_active_subscription(Timestamp::now()));
    }

    #[test]
    fn active_with_past_expiry_has_no_access() {
        let mut user = User::new(phone());
        user.subscription_status = SubscriptionStatus::Active;
        user.entitlement_expires_at = Some(Timestamp::now().add_days(-1));

        assert!(!user.has_active_subscription(Timestamp::now()));
    }

    #[test]
    fn active_without_expiry_has_no_access() {
        let mut user = User::new(phone());
        user.subscription_status = SubscriptionStatus::Active;

        assert!(!user.has_active_subscription(Timestamp::now()));
    }

    #[test]
    fn billing_email_prefers_real_address() {
        let mut user = User::new(phone());
        assert_eq!(user.billing_email(), "user_2348012345678@prepbot.local");

        user.email = Some("ada@example.com".to_string());
        assert_eq!(user.billing_email(), "ada@example.com");
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [SubscriptionStatus::Active, SubscriptionStatus::Inactive] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionStatus::parse("expired"), None);
    }
}
