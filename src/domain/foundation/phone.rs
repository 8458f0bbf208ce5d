//! Phone number value object.
//!
//! The phone number is the stable external identity for every user-facing
//! record: WhatsApp addresses messages by it, session keys are derived from
//! it, and the payment gateway echoes it back in webhook metadata.

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Normalized phone number in international digits-only form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Creates a phone number from a raw string.
    ///
    /// Accepts an optional leading `+` and strips spaces and dashes.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the result is empty, too short, or
    /// contains non-digit characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let cleaned: String = raw
            .as_ref()
            .trim()
            .trim_start_matches('+')
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();

        if cleaned.is_empty() {
            return Err(ValidationError::empty_field("phone_number"));
        }
        if cleaned.len() < 7 || cleaned.len() > 15 {
            return Err(ValidationError::invalid_format(
                "phone_number",
                "must be 7 to 15 digits",
            ));
        }
        if !cleaned.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                "phone_number",
                "must contain only digits",
            ));
        }

        Ok(Self(cleaned))
    }

    /// Returns the digits-only form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder email derived from the number, used when a purchase needs
    /// an email address before the user has supplied one.
    pub fn placeholder_email(&self) -> String {
        format!("user_{}@prepbot.local", self.0)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
