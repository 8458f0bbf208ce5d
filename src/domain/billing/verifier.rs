//! Paystack webhook signature verification.
//!
//! Paystack signs the raw request body with HMAC-SHA512 under the account
//! secret key and sends the hex digest in the `x-paystack-signature` header.
//! Verification must succeed before any state is touched; a spoofed webhook
//! would otherwise be able to grant entitlements.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::errors::BillingError;
use super::event::PaystackEvent;

type HmacSha512 = Hmac<Sha512>;

/// Verifier for Paystack webhook signatures.
pub struct PaystackWebhookVerifier {
    /// The account secret key, shared with the gateway.
    secret: SecretString,
}

impl PaystackWebhookVerifier {
    /// Creates a new verifier with the given secret key.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Verifies the signature over the raw payload.
    ///
    /// The header carries a hex-encoded HMAC-SHA512 digest; comparison is
    /// constant-time. A header that is not valid hex fails the same way as a
    /// wrong digest.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::SignatureInvalid` on any mismatch.
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> Result<(), BillingError> {
        let provided = hex::decode(signature_hex.trim())
            .map_err(|_| BillingError::SignatureInvalid)?;

        let mut mac = HmacSha512::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if !constant_time_compare(expected.as_slice(), &provided) {
            tracing::warn!("invalid paystack webhook signature");
            return Err(BillingError::SignatureInvalid);
        }

        Ok(())
    }

    /// Verifies the signature and parses the payload into an event.
    ///
    /// # Errors
    ///
    /// - `SignatureInvalid` - signature verification failed
    /// - `MalformedEvent` - payload is not a valid event body
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_hex: &str,
    ) -> Result<PaystackEvent, BillingError> {
        self.verify(payload, signature_hex)?;

        serde_json::from_slice(payload).map_err(|e| BillingError::MalformedEvent(e.to_string()))
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex HMAC-SHA512 digest for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
