//! WhatsApp Cloud API configuration

use serde::Deserialize;

use super::error::ValidationError;

/// WhatsApp configuration
///
/// Missing credentials degrade the sender to log-only mode, which is the
/// expected state in local development.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Webhook challenge verify token
    #[serde(default = "default_verify_token")]
    pub verify_token: String,

    /// Graph API access token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone number id
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Graph API version
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl WhatsAppConfig {
    /// Check if outbound sending is configured
    pub fn can_send(&self) -> bool {
        self.access_token.as_deref().map(|t| !t.is_empty()).unwrap_or(false)
            && self
                .phone_number_id
                .as_deref()
                .map(|p| !p.is_empty())
                .unwrap_or(false)
    }

    /// Validate WhatsApp configuration
    pub fn validate(&self, is_production: bool) -> Result<(), ValidationError> {
        if self.verify_token.is_empty() {
            return Err(ValidationError::MissingRequired("WHATSAPP_VERIFY_TOKEN"));
        }
        if is_production && self.verify_token == default_verify_token() {
            return Err(ValidationError::PlaceholderVerifyToken);
        }
        Ok(())
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: default_verify_token(),
            access_token: None,
            phone_number_id: None,
            api_version: default_api_version(),
        }
    }
}

fn default_verify_token() -> String {
    "change_me".to_string()
}

fn default_api_version() -> String {
    "v17.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WhatsAppConfig::default();
        assert_eq!(config.verify_token, "change_me");
        assert_eq!(config.api_version, "v17.0");
        assert!(!config.can_send());
    }

    #[test]
    fn test_can_send_requires_both_credentials() {
        let config = WhatsAppConfig {
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        assert!(!config.can_send());

        let config = WhatsAppConfig {
            access_token: Some("token".to_string()),
            phone_number_id: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(config.can_send());
    }

    #[test]
    fn test_placeholder_token_rejected_in_production() {
        let config = WhatsAppConfig::default();
        assert!(config.validate(false).is_ok());
        assert!(matches!(
            config.validate(true),
            Err(ValidationError::PlaceholderVerifyToken)
        ));
    }
}
