//! Outbound notification port.
//!
//! The core hands outbound messages to this port and never assumes delivery
//! succeeded: a send failure is logged by the adapter, not bubbled into the
//! flow that triggered it.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PhoneNumber};

/// A reply button in an interactive message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

impl ReplyButton {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A row in an interactive list section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: String,
    pub title: String,
}

impl ListRow {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A titled section of list rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

/// Port for outbound messaging.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(&self, to: &PhoneNumber, body: &str) -> Result<(), DomainError>;

    /// Sends an interactive message with up to three reply buttons.
    async fn send_buttons(
        &self,
        to: &PhoneNumber,
        header: &str,
        body: &str,
        footer: &str,
        buttons: Vec<ReplyButton>,
    ) -> Result<(), DomainError>;

    /// Sends an interactive list message.
    async fn send_list(
        &self,
        to: &PhoneNumber,
        header: &str,
        body: &str,
        footer: &str,
        sections: Vec<ListSection>,
    ) -> Result<(), DomainError>;
}
