//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Paystack)
///
/// An absent secret key is allowed outside production: the gateway adapter
/// then refuses purchases while the rest of the bot keeps working, and
/// webhook verification is disabled along with it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Paystack secret key, also the webhook signing secret
    #[serde(default)]
    pub paystack_secret_key: Option<String>,
}

impl PaymentConfig {
    /// Check if a secret key is configured
    pub fn is_configured(&self) -> bool {
        self.paystack_secret_key
            .as_deref()
            .map(|k| !k.is_empty())
            .unwrap_or(false)
    }

    /// Check if using Paystack test mode
    pub fn is_test_mode(&self) -> bool {
        self.paystack_secret_key
            .as_deref()
            .map(|k| k.starts_with("sk_test_"))
            .unwrap_or(false)
    }

    /// Validate payment configuration
    pub fn validate(&self, require_configured: bool) -> Result<(), ValidationError> {
        match self.paystack_secret_key.as_deref() {
            None | Some("") => {
                if require_configured {
                    Err(ValidationError::MissingRequired("PAYSTACK_SECRET_KEY"))
                } else {
                    Ok(())
                }
            }
            Some(key) if !key.starts_with("sk_") => Err(ValidationError::InvalidPaystackKey),
            Some(_) => Ok(()),
        }
    }
}
