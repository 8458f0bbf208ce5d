//! In-memory user store.
//!
//! Used by unit and integration tests, including failure-injection for the
//! entitlement-not-applied path.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{DomainError, ErrorCode, PhoneNumber, Timestamp};
use crate::domain::user::{SubscriptionStatus, User};
use crate::ports::{SubscriptionActivation, UserStore};

/// HashMap-backed implementation of the UserStore port.
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
    activation_failures: Mutex<u32>,
    activation_attempts: Mutex<u32>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            activation_failures: Mutex::new(0),
            activation_attempts: Mutex::new(0),
        }
    }

    /// Makes the next `n` activation writes fail, for exercising the
    /// payment-received-but-not-applied path.
    pub fn fail_next_activations(&self, n: u32) {
        *self.activation_failures.lock().unwrap() = n;
    }

    /// Number of activation writes attempted so far.
    pub fn activation_attempts(&self) -> u32 {
        *self.activation_attempts.lock().unwrap()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, DomainError> {
        Ok(self.users.lock().unwrap().get(phone.as_str()).cloned())
    }

    async fn get_or_create(&self, phone: &PhoneNumber) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .entry(phone.as_str().to_string())
            .or_insert_with(|| User::new(phone.clone()))
            .clone())
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn find_by_subscription_code(&self, code: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.subscription_code.as_deref() == Some(code))
            .cloned())
    }

    async fn store_payment_reference(
        &self,
        phone: &PhoneNumber,
        reference: &str,
        plan: SubscriptionPlan,
    ) -> Result<(), DomainError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .entry(phone.as_str().to_string())
            .or_insert_with(|| User::new(phone.clone()));
        user.payment_reference = Some(reference.to_string());
        user.subscription_plan = Some(plan);
        user.updated_at = Timestamp::now();
        Ok(())
    }

    async fn apply_activation(
        &self,
        phone: &PhoneNumber,
        activation: &SubscriptionActivation,
    ) -> Result<User, DomainError> {
        *self.activation_attempts.lock().unwrap() += 1;
        {
            let mut failures = self.activation_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(DomainError::database("injected activation failure"));
            }
        }

        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(phone.as_str())
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, phone.to_string()))?;

        if activation.email.is_some() {
            user.email = activation.email.clone();
        }
        user.subscription_status = SubscriptionStatus::Active;
        user.subscription_plan = Some(activation.plan);
        user.entitlement_expires_at = Some(activation.expires_at);
        if activation.payment_reference.is_some() {
            user.payment_reference = activation.payment_reference.clone();
        }
        if activation.subscription_code.is_some() {
            user.subscription_code = activation.subscription_code.clone();
        }
        if activation.authorization_digest.is_some() {
            user.authorization_digest = activation.authorization_digest.clone();
        }
        user.metadata = activation.metadata.clone();
        user.updated_at = Timestamp::now();

        Ok(user.clone())
    }

    async fn deactivate(
        &self,
        phone: &PhoneNumber,
        reason: &str,
    ) -> Result<Option<User>, DomainError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(phone.as_str()) else {
            return Ok(None);
        };

        user.subscription_status = SubscriptionStatus::Inactive;
        user.metadata = serde_json::json!({ "deactivated_reason": reason });
        user.updated_at = Timestamp::now();

        Ok(Some(user.clone()))
    }
}
