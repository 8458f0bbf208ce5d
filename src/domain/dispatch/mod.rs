//! Inbound event dispatcher.
//!
//! Heterogeneous inbound shapes (free text, button reply, list reply, and
//! the payment webhook) are decoded once at the HTTP boundary into the
//! closed [`InboundEvent`] union, then classified here into a routing
//! decision. This module performs no persistence and no I/O.

mod command;
mod inbound;

pub use command::{classify_text, Command};
pub use inbound::InboundEvent;

use crate::domain::foundation::PhoneNumber;

/// Routing decision for one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A conversational command for the bot service.
    Command(PhoneNumber, Command),

    /// A payment notification for the subscription reconciler. The raw body
    /// is preserved byte-for-byte because the signature covers it.
    PaymentNotification {
        raw_body: Vec<u8>,
        signature: String,
    },
}

/// Classifies an inbound event into a routing decision.
pub fn dispatch(event: InboundEvent) -> Dispatch {
    match event {
        InboundEvent::Text { from, body } => Dispatch::Command(from, classify_text(&body)),
        InboundEvent::ButtonReply { from, id, .. } => {
            Dispatch::Command(from, command::classify_button(&id))
        }
        InboundEvent::ListReply { from, id, .. } => {
            Dispatch::Command(from, command::classify_list(&id))
        }
        InboundEvent::PaymentWebhook {
            raw_body,
            signature,
        } => Dispatch::PaymentNotification {
            raw_body,
            signature,
        },
    }
}
