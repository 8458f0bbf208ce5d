//! WhatsApp Cloud API notifier.
//!
//! Sends text and interactive messages through the Graph API. When the
//! access token or phone number id is missing the adapter degrades to
//! logging the would-be message, which keeps local development usable
//! without Meta credentials.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{DomainError, ErrorCode, PhoneNumber};
use crate::ports::{ListSection, Notifier, ReplyButton};

/// WhatsApp Cloud API configuration.
#[derive(Clone)]
pub struct CloudApiConfig {
    access_token: Option<SecretString>,
    phone_number_id: String,
    api_version: String,
    api_base_url: String,
}

impl CloudApiConfig {
    /// Creates a configured instance.
    pub fn new(
        access_token: impl Into<String>,
        phone_number_id: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            access_token: Some(SecretString::new(access_token.into())),
            phone_number_id: phone_number_id.into(),
            api_version: api_version.into(),
            api_base_url: "https://graph.facebook.com".to_string(),
        }
    }

    /// Creates an unconfigured instance; sends are logged instead.
    pub fn unconfigured() -> Self {
        Self {
            access_token: None,
            phone_number_id: String::new(),
            api_version: "v17.0".to_string(),
            api_base_url: "https://graph.facebook.com".to_string(),
        }
    }

    /// Overrides the API base URL (for tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    fn is_configured(&self) -> bool {
        self.access_token.is_some() && !self.phone_number_id.is_empty()
    }
}

/// WhatsApp implementation of the Notifier port.
pub struct WhatsAppNotifier {
    config: CloudApiConfig,
    http_client: reqwest::Client,
}

impl WhatsAppNotifier {
    /// Creates a new notifier.
    pub fn new(config: CloudApiConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post_message(&self, payload: serde_json::Value) -> Result<(), DomainError> {
        let token = self
            .config
            .access_token
            .as_ref()
            .expect("checked by caller");
        let url = format!(
            "{}/{}/{}/messages",
            self.config.api_base_url, self.config.api_version, self.config.phone_number_id
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DomainError::new(ErrorCode::NotificationError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "whatsapp send rejected");
            return Err(DomainError::new(
                ErrorCode::NotificationError,
                format!("send rejected with status {}", status),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send_text(&self, to: &PhoneNumber, body: &str) -> Result<(), DomainError> {
        if !self.config.is_configured() {
            tracing::info!(to = %to, body = %body, "whatsapp unconfigured; message logged");
            return Ok(());
        }

        self.post_message(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to.as_str(),
            "text": { "body": body },
        }))
        .await
    }

    async fn send_buttons(
        &self,
        to: &PhoneNumber,
        header: &str,
        body: &str,
        footer: &str,
        buttons: Vec<ReplyButton>,
    ) -> Result<(), DomainError> {
        if !self.config.is_configured() {
            tracing::info!(to = %to, body = %body, "whatsapp unconfigured; buttons logged");
            return Ok(());
        }

        let buttons: Vec<serde_json::Value> = buttons
            .into_iter()
            .map(|b| {
                serde_json::json!({
                    "type": "reply",
                    "reply": { "id": b.id, "title": b.title },
                })
            })
            .collect();

        self.post_message(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to.as_str(),
            "type": "interactive",
            "interactive": {
                "type": "button",
                "header": { "type": "text", "text": header },
                "body": { "text": body },
                "footer": { "text": footer },
                "action": { "buttons": buttons },
            },
        }))
        .await
    }

    async fn send_list(
        &self,
        to: &PhoneNumber,
        header: &str,
        body: &str,
        footer: &str,
        sections: Vec<ListSection>,
    ) -> Result<(), DomainError> {
        if !self.config.is_configured() {
            tracing::info!(to = %to, body = %body, "whatsapp unconfigured; list logged");
            return Ok(());
        }

        let sections: Vec<serde_json::Value> = sections
            .into_iter()
            .map(|s| {
                serde_json::json!({
                    "title": s.title,
                    "rows": s.rows
                        .into_iter()
                        .map(|r| serde_json::json!({ "id": r.id, "title": r.title }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        self.post_message(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to.as_str(),
            "type": "interactive",
            "interactive": {
                "type": "list",
                "header": { "type": "text", "text": header },
                "body": { "text": body },
                "footer": { "text": footer },
                "action": { "button": "Select", "sections": sections },
            },
        }))
        .await
    }
}
