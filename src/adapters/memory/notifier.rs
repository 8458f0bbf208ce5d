//! Recording notifier.
//!
//! Captures outbound messages instead of sending them, so tests can assert
//! on what the user would have seen.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PhoneNumber};
use crate::ports::{ListSection, Notifier, ReplyButton};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: PhoneNumber,
    pub body: String,
    pub kind: SentKind,
}

/// Shape of a captured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentKind {
    Text,
    Buttons { ids: Vec<String> },
    List { row_ids: Vec<String> },
}

/// Notifier that records every message in memory.
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All captured messages, in send order.
    pub fn all_sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Bodies of messages sent to one recipient.
    pub fn sent_to(&self, phone: &PhoneNumber) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.to == phone)
            .map(|m| m.body.clone())
            .collect()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, to: &PhoneNumber, body: &str) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.clone(),
            body: body.to_string(),
            kind: SentKind::Text,
        });
        Ok(())
    }

    async fn send_buttons(
        &self,
        to: &PhoneNumber,
        _header: &str,
        body: &str,
        _footer: &str,
        buttons: Vec<ReplyButton>,
    ) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.clone(),
            body: body.to_string(),
            kind: SentKind::Buttons {
                ids: buttons.into_iter().map(|b| b.id).collect(),
            },
        });
        Ok(())
    }

    async fn send_list(
        &self,
        to: &PhoneNumber,
        _header: &str,
        body: &str,
        _footer: &str,
        sections: Vec<ListSection>,
    ) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.clone(),
            body: body.to_string(),
            kind: SentKind::List {
                row_ids: sections
                    .into_iter()
                    .flat_map(|s| s.rows)
                    .map(|r| r.id)
                    .collect(),
            },
        });
        Ok(())
    }
}
