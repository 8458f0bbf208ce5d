//! WhatsApp webhook payload decoding.
//!
//! The Cloud API wraps messages in `entry[] -> changes[] -> value.messages[]`.
//! Decoding happens exactly once here, producing the closed
//! [`InboundEvent`] union; message shapes we do not recognize are dropped
//! with a log line rather than guessed at.

use serde::Deserialize;

use crate::domain::dispatch::InboundEvent;
use crate::domain::foundation::PhoneNumber;

/// Top-level webhook payload.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

/// One raw inbound message.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<TextPayload>,
    pub interactive: Option<InteractivePayload>,
    pub button: Option<TemplateButtonPayload>,
}

#[derive(Debug, Deserialize)]
pub struct TextPayload {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractivePayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub button_reply: Option<Reply>,
    pub list_reply: Option<Reply>,
}

#[derive(Debug, Deserialize)]
pub struct Reply {
    pub id: String,
    pub title: String,
}

/// Quick-reply button on a template message.
#[derive(Debug, Deserialize)]
pub struct TemplateButtonPayload {
    pub payload: Option<String>,
    pub text: Option<String>,
}

/// Flattens a webhook payload into normalized events.
///
/// Shapes that do not match the closed union are skipped, not errors: one
/// unreadable message must not block the rest of the batch.
pub fn decode_events(payload: &WebhookPayload) -> Vec<InboundEvent> {
    let mut events = Vec::new();

    for entry in &payload.entry {
        for change in &entry.changes {
            for message in &change.value.messages {
                match decode_message(message) {
                    Some(event) => events.push(event),
                    None => {
                        tracing::debug!(
                            from = %message.from,
                            kind = %message.kind,
                            "skipping unrecognized message shape"
                        );
                    }
                }
            }
        }
    }

    events
}

fn decode_message(message: &InboundMessage) -> Option<InboundEvent> {
    let from = PhoneNumber::new(&message.from).ok()?;

    match message.kind.as_str() {
        "text" => {
            let body = message.text.as_ref()?.body.trim().to_string();
            Some(InboundEvent::Text { from, body })
        }
        "interactive" => {
            let interactive = message.interactive.as_ref()?;
            match interactive.kind.as_str() {
                "button_reply" => {
                    let reply = interactive.button_reply.as_ref()?;
                    Some(InboundEvent::ButtonReply {
                        from,
                        id: reply.id.clone(),
                        title: reply.title.clone(),
                    })
                }
                "list_reply" => {
                    let reply = interactive.list_reply.as_ref()?;
                    Some(InboundEvent::ListReply {
                        from,
                        id: reply.id.clone(),
                        title: reply.title.clone(),
                    })
                }
                _ => None,
            }
        }
        "button" => {
            let button = message.button.as_ref()?;
            let id = button.payload.clone().or_else(|| button.text.clone())?;
            let title = button.text.clone().unwrap_or_default();
            Some(InboundEvent::ButtonReply { from, id, title })
        }
        _ => None,
    }
}
