//! Paystack webhook event types.
//!
//! Defines the structures for parsing Paystack webhook payloads.
//! Only fields relevant to our processing are captured; the `data` object is
//! kept as raw JSON because its shape varies by event type.

use serde::{Deserialize, Serialize};

use super::plan::SubscriptionPlan;
use crate::domain::foundation::{PhoneNumber, Timestamp};

/// Paystack webhook event (simplified).
///
/// Wire shape: `{ "event": "charge.success", "data": { ... } }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaystackEvent {
    /// Event type string (e.g. "charge.success").
    pub event: String,

    /// Event-specific data (polymorphic based on event type).
    pub data: serde_json::Value,
}

/// Known Paystack event types that we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaystackEventType {
    /// One-off charge completed successfully.
    ChargeSuccess,
    /// Recurring subscription was created.
    SubscriptionCreate,
    /// Charge attempt failed.
    ChargeFailed,
    /// Subscription will not renew.
    SubscriptionNotRenew,
    /// Renewal invoice could not be charged.
    InvoicePaymentFailed,
    /// Subscription was disabled (cancellation).
    SubscriptionDisable,
    /// Unknown or unhandled event type.
    Unknown,
}

/// Coarse classification driving reconciliation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Grants or refreshes an entitlement.
    Success,
    /// Produces a user-visible notice but never touches entitlement.
    Failure,
    /// Revokes an active entitlement.
    Cancellation,
    /// Acknowledged and otherwise ignored.
    Unknown,
}

impl PaystackEventType {
    /// Parse event type from the wire string.
    pub fn parse(s: &str) -> Self {
        match s {
            "charge.success" => Self::ChargeSuccess,
            "subscription.create" => Self::SubscriptionCreate,
            "charge.failed" => Self::ChargeFailed,
            "subscription.not_renew" => Self::SubscriptionNotRenew,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "subscription.disable" => Self::SubscriptionDisable,
            _ => Self::Unknown,
        }
    }

    /// Classification used by the reconciler.
    pub fn class(&self) -> EventClass {
        match self {
            Self::ChargeSuccess | Self::SubscriptionCreate => EventClass::Success,
            Self::ChargeFailed | Self::SubscriptionNotRenew | Self::InvoicePaymentFailed => {
                EventClass::Failure
            }
            Self::SubscriptionDisable => EventClass::Cancellation,
            Self::Unknown => EventClass::Unknown,
        }
    }
}

impl PaystackEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> PaystackEventType {
        PaystackEventType::parse(&self.event)
    }

    /// Classification used by the reconciler.
    pub fn class(&self) -> EventClass {
        self.parsed_type().class()
    }

    fn data_str(&self, pointer: &str) -> Option<&str> {
        self.data.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Gateway transaction reference.
    pub fn reference(&self) -> Option<&str> {
        self.data_str("/reference")
    }

    /// Phone number tag the application embedded in transaction metadata.
    ///
    /// The gateway echoes application-supplied metadata back verbatim, which
    /// makes this the authoritative correlation key even when no local
    /// pending intent survives.
    pub fn phone_tag(&self) -> Option<PhoneNumber> {
        self.data_str("/metadata/phone_number")
            .and_then(|s| PhoneNumber::new(s).ok())
    }

    /// Plan code the application embedded in transaction metadata.
    pub fn plan_tag(&self) -> Option<SubscriptionPlan> {
        self.data_str("/metadata/plan")
            .and_then(SubscriptionPlan::from_code)
    }

    /// Customer email as reported by the gateway.
    pub fn customer_email(&self) -> Option<&str> {
        self.data_str("/customer/email")
    }

    /// Subscription code, present on subscription-class events.
    ///
    /// `invoice.payment_failed` nests it under `data.subscription`.
    pub fn subscription_code(&self) -> Option<&str> {
        self.data_str("/subscription_code")
            .or_else(|| self.data_str("/subscription/subscription_code"))
    }

    /// Reusable authorization credential issued on successful charges.
    pub fn authorization_code(&self) -> Option<&str> {
        self.data_str("/authorization/authorization_code")
    }

    /// Human-readable gateway response, used in failure notices.
    pub fn gateway_response(&self) -> Option<&str> {
        self.data_str("/gateway_response")
    }

    /// Time the payment settled, per the gateway.
    ///
    /// Falls back from `paid_at` to `created_at`; `None` if neither parses.
    pub fn paid_at(&self) -> Option<Timestamp> {
        self.data_str("/paid_at")
            .and_then(Timestamp::parse_rfc3339)
            .or_else(|| self.data_str("/created_at").and_then(Timestamp::parse_rfc3339))
    }
}

/// Builder for creating test PaystackEvent instances.
#[cfg(test)]
pub struct PaystackEventBuilder {
    event: String,
    data: serde_json::Value,
}

#[cfg(test)]
impl PaystackEventBuilder {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: serde_json::json!({}),
        }
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn build(self) -> PaystackEvent {
        PaystackEvent {
            event: self.event,
            data: self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_charge_success() {
        let json = r#"{
            "event": "charge.success",
            "data": {
                "reference": "ref_abc123",
                "amount": 50000,
                "paid_at": "2024-10-01T21:25:51.000Z",
                "customer": { "email": "ada@example.com" },
                "metadata": { "phone_number": "2348012345678", "plan": "1_month" },
                "authorization": { "authorization_code": "AUTH_xyz" }
            }
        }"#;

        let event: PaystackEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.parsed_type(), PaystackEventType::ChargeSuccess);
        assert_eq!(event.class(), EventClass::Success);
        assert_eq!(event.reference(), Some("ref_abc123"));
        assert_eq!(event.phone_tag().unwrap().as_str(), "2348012345678");
        assert_eq!(event.plan_tag(), Some(SubscriptionPlan::Monthly));
        assert_eq!(event.customer_email(), Some("ada@example.com"));
        assert_eq!(event.authorization_code(), Some("AUTH_xyz"));
        assert!(event.paid_at().is_some());
    }

    #[test]
    fn event_classes() {
        let cases = [
            ("charge.success", EventClass::Success),
            ("subscription.create", EventClass::Success),
            ("charge.failed", EventClass::Failure),
            ("subscription.not_renew", EventClass::Failure),
            ("invoice.payment_failed", EventClass::Failure),
            ("subscription.disable", EventClass::Cancellation),
            ("customer.identification", EventClass::Unknown),
        ];
        for (wire, class) in cases {
            assert_eq!(PaystackEventType::parse(wire).class(), class, "{}", wire);
        }
    }

    #[test]
    fn missing_metadata_yields_none() {
        let event = PaystackEventBuilder::new("charge.success")
            .data(json!({ "reference": "ref_1" }))
            .build();

        assert!(event.phone_tag().is_none());
        assert!(event.plan_tag().is_none());
        assert!(event.authorization_code().is_none());
        assert!(event.paid_at().is_none());
    }

    #[test]
    fn malformed_phone_tag_yields_none() {
        let event = PaystackEventBuilder::new("charge.success")
            .data(json!({ "metadata": { "phone_number": "not-a-number" } }))
            .build();

        assert!(event.phone_tag().is_none());
    }

    #[test]
    fn subscription_code_read_from_both_shapes() {
        let flat = PaystackEventBuilder::new("subscription.disable")
            .data(json!({ "subscription_code": "SUB_1" }))
            .build();
        assert_eq!(flat.subscription_code(), Some("SUB_1"));

        let nested = PaystackEventBuilder::new("invoice.payment_failed")
            .data(json!({ "subscription": { "subscription_code": "SUB_2" } }))
            .build();
        assert_eq!(nested.subscription_code(), Some("SUB_2"));
    }

    #[test]
    fn paid_at_falls_back_to_created_at() {
        let event = PaystackEventBuilder::new("charge.success")
            .data(json!({ "created_at": "2024-05-05T10:00:00Z" }))
            .build();

        assert!(event.paid_at().is_some());
    }
}
