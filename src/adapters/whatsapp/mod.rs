//! WhatsApp Cloud API adapters: outbound sender and inbound payload decoding.

mod inbound;
mod sender;

pub use inbound::{decode_events, WebhookPayload};
pub use sender::{CloudApiConfig, WhatsAppNotifier};
