//! Closed tagged union of inbound event shapes.

use crate::domain::foundation::PhoneNumber;

/// One normalized inbound event.
///
/// Anything that does not decode into one of these shapes is rejected at the
/// HTTP boundary and never reaches the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Free-text message.
    Text { from: PhoneNumber, body: String },

    /// Interactive button reply.
    ButtonReply {
        from: PhoneNumber,
        id: String,
        title: String,
    },

    /// Interactive list selection.
    ListReply {
        from: PhoneNumber,
        id: String,
        title: String,
    },

    /// Payment gateway webhook delivery. The body stays raw because the
    /// signature is computed over the exact bytes.
    PaymentWebhook {
        raw_body: Vec<u8>,
        signature: String,
    },
}

impl InboundEvent {
    /// Sender identity for messaging events; `None` for webhook deliveries,
    /// whose identity is resolved from verified payload metadata instead.
    pub fn sender(&self) -> Option<&PhoneNumber> {
        match self {
            InboundEvent::Text { from, .. }
            | InboundEvent::ButtonReply { from, .. }
            | InboundEvent::ListReply { from, .. } => Some(from),
            InboundEvent::PaymentWebhook { .. } => None,
        }
    }
}
