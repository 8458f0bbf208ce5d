//! Subscription reconciler.
//!
//! Correlates verified payment gateway events to users and applies
//! entitlement transitions exactly-once-in-effect. Also owns purchase
//! initiation, so the pending-intent bookkeeping and its consumption live in
//! one place.
//!
//! ## Idempotency
//!
//! The activation written for a success event is a deterministic function of
//! the event's plan tag and embedded payment timestamp. Duplicate delivery
//! (gateway retries, out-of-order redelivery) therefore converges on the
//! same row state without any processed-event ledger.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::billing::{
    BillingError, EventClass, PaystackEvent, PaystackWebhookVerifier, SubscriptionPlan,
};
use crate::domain::conversation::{Session, SessionMode};
use crate::domain::foundation::{PhoneNumber, Timestamp};
use crate::domain::user::SubscriptionStatus;
use crate::ports::{
    InitializeTransaction, Notifier, PaymentGateway, SessionStore, SubscriptionActivation,
    TransactionHandle, UserStore,
};

/// Result of applying one webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Entitlement granted or refreshed.
    Activated {
        phone: PhoneNumber,
        plan: SubscriptionPlan,
    },
    /// Failure notice relayed; entitlement untouched.
    FailureNoticed,
    /// Active subscription deactivated by a cancellation event.
    CancellationApplied,
    /// Cancellation for an already-inactive user; nothing to do.
    CancellationNoop,
    /// Event verified but could not be correlated to any user.
    Unmatched,
    /// Unrecognized event type, acknowledged and skipped.
    Ignored,
}

/// Correlates payment events to users and applies entitlement transitions.
pub struct SubscriptionReconciler {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    verifier: PaystackWebhookVerifier,
}

impl SubscriptionReconciler {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        verifier: PaystackWebhookVerifier,
    ) -> Self {
        Self {
            users,
            sessions,
            gateway,
            notifier,
            verifier,
        }
    }

    /// Checks the webhook signature without touching any state.
    ///
    /// The HTTP handler calls this synchronously so that a spoofed request
    /// can be rejected with 401 before the fast acknowledgment.
    pub fn verify_signature(&self, raw_body: &[u8], signature: &str) -> Result<(), BillingError> {
        self.verifier.verify(raw_body, signature)
    }

    /// Initiates a purchase: validates the plan, obtains a payment link from
    /// the gateway, and records the pending intent.
    ///
    /// # Errors
    ///
    /// - `InvalidPlan` for an unrecognized plan code
    /// - `GatewayUnavailable` when the gateway cannot be reached; no local
    ///   state is written in that case
    pub async fn initiate(
        &self,
        phone: &PhoneNumber,
        plan_code: &str,
    ) -> Result<(SubscriptionPlan, TransactionHandle), BillingError> {
        let plan = SubscriptionPlan::from_code(plan_code)
            .ok_or_else(|| BillingError::InvalidPlan(plan_code.to_string()))?;

        let user = self.users.get_or_create(phone).await?;

        let request = InitializeTransaction {
            email: user.billing_email(),
            amount_kobo: plan.amount_kobo(),
            metadata: serde_json::json!({
                "phone_number": phone.as_str(),
                "plan": plan.code(),
                "description": plan.display_name(),
            }),
        };

        let handle = self
            .gateway
            .initialize_transaction(request)
            .await
            .map_err(|e| BillingError::GatewayUnavailable(e.to_string()))?;

        // The webhook can act from its own metadata alone, so losing either
        // of these writes degrades resilience but not correctness.
        let session = Session::new(
            phone.clone(),
            SessionMode::PaymentPending {
                plan,
                reference: handle.reference.clone(),
                access_code: handle.access_code.clone(),
                initiated_at: Timestamp::now(),
            },
        );
        if let Err(e) = self.sessions.put_conversation(&session).await {
            tracing::warn!(phone = %phone, error = %e, "failed to record pending payment session");
        }
        if let Err(e) = self
            .users
            .store_payment_reference(phone, &handle.reference, plan)
            .await
        {
            tracing::warn!(phone = %phone, error = %e, "failed to store payment reference");
        }

        tracing::info!(phone = %phone, plan = plan.code(), reference = %handle.reference,
            "payment link issued");

        Ok((plan, handle))
    }

    /// Verifies the signature, parses the event, and applies it.
    pub async fn verify_and_apply(
        &self,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<ReconcileOutcome, BillingError> {
        let event = self.verifier.verify_and_parse(raw_body, signature)?;
        self.apply(event).await
    }

    /// Applies an already-verified event.
    pub async fn apply(&self, event: PaystackEvent) -> Result<ReconcileOutcome, BillingError> {
        tracing::info!(event = %event.event, "processing payment webhook");

        match event.class() {
            EventClass::Success => self.apply_success(&event).await,
            EventClass::Failure => self.apply_failure(&event).await,
            EventClass::Cancellation => self.apply_cancellation(&event).await,
            EventClass::Unknown => {
                tracing::debug!(event = %event.event, "ignoring unhandled event type");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    async fn apply_success(
        &self,
        event: &PaystackEvent,
    ) -> Result<ReconcileOutcome, BillingError> {
        let Some(phone) = self.correlate_success(event).await? else {
            tracing::warn!(event = %event.event, reference = ?event.reference(),
                "success event could not be correlated to a user");
            return Ok(ReconcileOutcome::Unmatched);
        };

        let Some(plan) = self.resolve_plan(event, &phone).await else {
            tracing::warn!(phone = %phone, "success event carries no resolvable plan");
            return Ok(ReconcileOutcome::Unmatched);
        };

        // Expiry is anchored to the event's own payment time so that a
        // redelivered event computes the identical window.
        let paid_at = event.paid_at().unwrap_or_else(Timestamp::now);
        let activation = SubscriptionActivation {
            email: event.customer_email().map(str::to_string),
            plan,
            expires_at: plan.entitlement_expiry(paid_at),
            payment_reference: event.reference().map(str::to_string),
            subscription_code: event.subscription_code().map(str::to_string),
            authorization_digest: event.authorization_code().map(sha256_hex),
            metadata: serde_json::json!({
                "paystack_reference": event.reference(),
                "event_type": event.event,
                "paid_at": event.paid_at().map(|t| t.as_unix_secs()),
            }),
        };

        self.users.get_or_create(&phone).await?;

        // The only retried write in the system; a verified payment must
        // never be dropped silently.
        let applied = match self.users.apply_activation(&phone, &activation).await {
            Ok(user) => Ok(user),
            Err(first) => {
                tracing::warn!(phone = %phone, error = %first,
                    "activation write failed, retrying once");
                self.users.apply_activation(&phone, &activation).await
            }
        };

        if let Err(e) = applied {
            tracing::error!(phone = %phone, error = %e,
                "payment verified but entitlement not applied");
            self.notify(
                &phone,
                "Payment received, but there was an error activating your subscription. \
                 Please contact support.",
            )
            .await;
            return Err(BillingError::EntitlementNotApplied(e.to_string()));
        }

        // Consume the pending intent; its absence was never required.
        if let Err(e) = self.sessions.delete_conversation(&phone).await {
            tracing::warn!(phone = %phone, error = %e, "failed to clear pending session");
        }

        let confirmation = format!(
            "Subscription activated!\n\nPlan: {}\nAmount: {}\n\nYou now have access to \
             full mock exams, the novel tutor, and unlimited practice. Enjoy!",
            plan.display_name(),
            plan.display_amount(),
        );
        self.notify(&phone, &confirmation).await;

        tracing::info!(phone = %phone, plan = plan.code(), "subscription activated");

        Ok(ReconcileOutcome::Activated { phone, plan })
    }

    async fn apply_failure(
        &self,
        event: &PaystackEvent,
    ) -> Result<ReconcileOutcome, BillingError> {
        // A failed charge never touches entitlement: an active user keeps
        // access, an inactive user stays inactive. Only a notice goes out.
        let Some(phone) = event.phone_tag() else {
            tracing::warn!(event = %event.event, "failure event carries no phone tag");
            return Ok(ReconcileOutcome::Unmatched);
        };

        let reason = event
            .gateway_response()
            .unwrap_or("Payment failed")
            .to_string();
        self.notify(
            &phone,
            &format!(
                "Payment failed.\n\nReason: {}\n\nPlease try again or contact support \
                 if the issue persists.",
                reason
            ),
        )
        .await;

        Ok(ReconcileOutcome::FailureNoticed)
    }

    async fn apply_cancellation(
        &self,
        event: &PaystackEvent,
    ) -> Result<ReconcileOutcome, BillingError> {
        let phone = match event.phone_tag() {
            Some(phone) => Some(phone),
            None => match event.subscription_code() {
                Some(code) => self
                    .users
                    .find_by_subscription_code(code)
                    .await?
                    .map(|u| u.phone_number),
                None => None,
            },
        };

        let Some(phone) = phone else {
            tracing::warn!(event = %event.event, "cancellation event could not be correlated");
            return Ok(ReconcileOutcome::Unmatched);
        };

        let user = self.users.find_by_phone(&phone).await?;
        let was_active = user
            .map(|u| u.subscription_status == SubscriptionStatus::Active)
            .unwrap_or(false);

        if !was_active {
            // Already inactive: harmless idempotent no-op.
            tracing::info!(phone = %phone, "cancellation for already-inactive user");
            return Ok(ReconcileOutcome::CancellationNoop);
        }

        self.users
            .deactivate(&phone, "subscription disabled by gateway")
            .await?;
        self.notify(
            &phone,
            "Your subscription has been cancelled as requested.",
        )
        .await;

        tracing::info!(phone = %phone, "subscription deactivated by cancellation event");

        Ok(ReconcileOutcome::CancellationApplied)
    }

    /// Resolves the identity a success event belongs to.
    ///
    /// The metadata phone tag is authoritative. When it is absent, the
    /// stored pending reference serves as a secondary lookup.
    async fn correlate_success(
        &self,
        event: &PaystackEvent,
    ) -> Result<Option<PhoneNumber>, BillingError> {
        if let Some(phone) = event.phone_tag() {
            return Ok(Some(phone));
        }
        if let Some(reference) = event.reference() {
            return Ok(self
                .users
                .find_by_payment_reference(reference)
                .await?
                .map(|u| u.phone_number));
        }
        Ok(None)
    }

    /// Plan from the event's metadata tag, falling back to the pending
    /// intent recorded at initiation.
    async fn resolve_plan(
        &self,
        event: &PaystackEvent,
        phone: &PhoneNumber,
    ) -> Option<SubscriptionPlan> {
        if let Some(plan) = event.plan_tag() {
            return Some(plan);
        }
        match self.sessions.get_conversation(phone).await {
            Ok(session) => session.and_then(|s| s.pending_payment().map(|(plan, _)| *plan)),
            Err(e) => {
                tracing::warn!(phone = %phone, error = %e, "pending session lookup failed");
                None
            }
        }
    }

    /// Best-effort notification; failures are logged, never propagated.
    async fn notify(&self, phone: &PhoneNumber, body: &str) {
        if let Err(e) = self.notifier.send_text(phone, body).await {
            tracing::warn!(phone = %phone, error = %e, "notification failed");
        }
    }
}

/// One-way SHA-256 hex digest for credential material.
fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySessionStore, InMemoryUserStore, RecordingNotifier};
    use crate::domain::billing::compute_test_signature;
    use crate::ports::GatewayError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SECRET: &str = "sk_test_reconciler_secret";

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    struct MockGateway {
        fail: bool,
        calls: Mutex<u32>,
    }

    impl MockGateway {
        fn working() -> Self {
            Self {
                fail: false,
                calls: Mutex::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn initialize_transaction(
            &self,
            _request: InitializeTransaction,
        ) -> Result<TransactionHandle, GatewayError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(GatewayError::Http("connection refused".to_string()));
            }
            Ok(TransactionHandle {
                authorization_url: "https://checkout.paystack.com/abc".to_string(),
                access_code: "ac_test".to_string(),
                reference: "ref_test_1".to_string(),
            })
        }

        async fn disable_subscription(&self, _code: &str) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::new("2348012345678").unwrap()
    }

    struct Fixture {
        users: Arc<InMemoryUserStore>,
        sessions: Arc<InMemorySessionStore>,
        notifier: Arc<RecordingNotifier>,
        reconciler: SubscriptionReconciler,
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(MockGateway::working()))
    }

    fn fixture_with(gateway: Arc<MockGateway>) -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let reconciler = SubscriptionReconciler::new(
            users.clone(),
            sessions.clone(),
            gateway,
            notifier.clone(),
            PaystackWebhookVerifier::new(SECRET),
        );
        Fixture {
            users,
            sessions,
            notifier,
            reconciler,
        }
    }

    fn success_body(plan_code: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": "ref_test_1",
                "amount": 50000,
                "paid_at": "2024-10-01T21:25:51.000Z",
                "customer": { "email": "ada@example.com" },
                "metadata": { "phone_number": phone().as_str(), "plan": plan_code },
                "authorization": { "authorization_code": "AUTH_clear" }
            }
        }))
        .unwrap()
    }

    async fn apply_signed(
        fx: &Fixture,
        body: &[u8],
    ) -> Result<ReconcileOutcome, BillingError> {
        let signature = compute_test_signature(SECRET, body);
        fx.reconciler.verify_and_apply(body, &signature).await
    }

    // ══════════════════════════════════════════════════════════════
    // Initiation Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn initiate_returns_payment_link_and_records_intent() {
        let fx = fixture();

        let (plan, handle) = fx.reconciler.initiate(&phone(), "1_month").await.unwrap();

        assert_eq!(plan, SubscriptionPlan::Monthly);
        assert_eq!(handle.authorization_url, "https://checkout.paystack.com/abc");

        let session = fx
            .sessions
            .get_conversation(&phone())
            .await
            .unwrap()
            .unwrap();
        let (pending_plan, reference) = session.pending_payment().unwrap();
        assert_eq!(*pending_plan, SubscriptionPlan::Monthly);
        assert_eq!(reference, "ref_test_1");

        let user = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();
        assert_eq!(user.payment_reference.as_deref(), Some("ref_test_1"));
    }

    #[tokio::test]
    async fn initiate_rejects_unknown_plan() {
        let fx = fixture();

        let result = fx.reconciler.initiate(&phone(), "2_weeks").await;

        assert!(matches!(result, Err(BillingError::InvalidPlan(_))));
    }

    #[tokio::test]
    async fn initiate_surfaces_gateway_unavailable_without_partial_state() {
        let fx = fixture_with(Arc::new(MockGateway::failing()));

        let result = fx.reconciler.initiate(&phone(), "lifetime").await;

        assert!(matches!(result, Err(BillingError::GatewayUnavailable(_))));
        assert!(fx
            .sessions
            .get_conversation(&phone())
            .await
            .unwrap()
            .is_none());
    }

    // ══════════════════════════════════════════════════════════════
    // Success Event Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn success_event_activates_user_with_plan_window() {
        let fx = fixture();

        let outcome = apply_signed(&fx, &success_body("1_month")).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Activated {
                phone: phone(),
                plan: SubscriptionPlan::Monthly,
            }
        );

        let user = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();
        assert_eq!(user.subscription_status, SubscriptionStatus::Active);
        assert_eq!(user.subscription_plan, Some(SubscriptionPlan::Monthly));

        let paid_at = Timestamp::parse_rfc3339("2024-10-01T21:25:51.000Z").unwrap();
        assert_eq!(user.entitlement_expires_at, Some(paid_at.add_months(1)));
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));

        let sent = fx.notifier.sent_to(&phone());
        assert!(sent.iter().any(|m| m.contains("Subscription activated")));
    }

    #[tokio::test]
    async fn success_event_is_idempotent_for_every_plan() {
        for plan_code in ["1_month", "3_months", "lifetime"] {
            let fx = fixture();
            let body = success_body(plan_code);

            apply_signed(&fx, &body).await.unwrap();
            let first = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();

            apply_signed(&fx, &body).await.unwrap();
            let second = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();

            assert_eq!(
                first.entitlement_expires_at, second.entitlement_expires_at,
                "expiry drifted for {}",
                plan_code
            );
            assert_eq!(first.subscription_status, second.subscription_status);
            assert_eq!(first.subscription_plan, second.subscription_plan);
        }
    }

    #[tokio::test]
    async fn tampered_body_is_rejected_without_mutation() {
        let fx = fixture();
        let body = success_body("1_month");
        let signature = compute_test_signature(SECRET, &body);

        let mut tampered = body.clone();
        let pos = tampered.iter().position(|b| *b == b'5').unwrap();
        tampered[pos] = b'9';

        let result = fx.reconciler.verify_and_apply(&tampered, &signature).await;

        assert!(matches!(result, Err(BillingError::SignatureInvalid)));
        assert!(fx.users.find_by_phone(&phone()).await.unwrap().is_none());
        assert!(fx.notifier.all_sent().is_empty());
    }

    #[tokio::test]
    async fn success_event_clears_pending_session() {
        let fx = fixture();
        fx.reconciler.initiate(&phone(), "1_month").await.unwrap();
        assert!(fx
            .sessions
            .get_conversation(&phone())
            .await
            .unwrap()
            .is_some());

        apply_signed(&fx, &success_body("1_month")).await.unwrap();

        assert!(fx
            .sessions
            .get_conversation(&phone())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn success_without_phone_tag_falls_back_to_reference() {
        let fx = fixture();
        // Initiation stored reference ref_test_1 against this user.
        fx.reconciler.initiate(&phone(), "3_months").await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": "ref_test_1",
                "paid_at": "2024-10-01T21:25:51.000Z",
                "metadata": { "plan": "3_months" }
            }
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &body).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Activated {
                phone: phone(),
                plan: SubscriptionPlan::Quarterly,
            }
        );
    }

    #[tokio::test]
    async fn success_without_any_correlation_is_unmatched() {
        let fx = fixture();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "charge.success",
            "data": { "amount": 50000 }
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &body).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Unmatched);
    }

    #[tokio::test]
    async fn plan_falls_back_to_pending_intent() {
        let fx = fixture();
        fx.reconciler.initiate(&phone(), "lifetime").await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": "ref_test_1",
                "paid_at": "2024-10-01T21:25:51.000Z",
                "metadata": { "phone_number": phone().as_str() }
            }
        }))
        .unwrap();

        apply_signed(&fx, &body).await.unwrap();

        let user = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();
        assert_eq!(user.subscription_plan, Some(SubscriptionPlan::Lifetime));
    }

    #[tokio::test]
    async fn authorization_credential_is_stored_as_digest_only() {
        let fx = fixture();

        apply_signed(&fx, &success_body("1_month")).await.unwrap();

        let user = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();
        let digest = user.authorization_digest.unwrap();
        assert_ne!(digest, "AUTH_clear");
        assert_eq!(digest, sha256_hex("AUTH_clear"));
        assert_eq!(digest.len(), 64);
    }

    #[tokio::test]
    async fn persistent_activation_failure_sends_support_notice() {
        let fx = fixture();
        fx.users.fail_next_activations(5);

        let result = apply_signed(&fx, &success_body("1_month")).await;

        assert!(matches!(result, Err(BillingError::EntitlementNotApplied(_))));
        // One retry happened before giving up.
        assert_eq!(fx.users.activation_attempts(), 2);
        let sent = fx.notifier.sent_to(&phone());
        assert!(sent.iter().any(|m| m.contains("contact support")));
    }

    #[tokio::test]
    async fn transient_activation_failure_recovers_on_retry() {
        let fx = fixture();
        fx.users.fail_next_activations(1);

        let outcome = apply_signed(&fx, &success_body("1_month")).await.unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Activated { .. }));
        let user = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();
        assert_eq!(user.subscription_status, SubscriptionStatus::Active);
    }

    // ══════════════════════════════════════════════════════════════
    // Failure Event Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn failed_charge_never_deactivates_active_user() {
        let fx = fixture();
        apply_signed(&fx, &success_body("1_month")).await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "charge.failed",
            "data": {
                "reference": "ref_test_2",
                "gateway_response": "Insufficient funds",
                "metadata": { "phone_number": phone().as_str() }
            }
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &body).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::FailureNoticed);
        let user = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();
        assert_eq!(user.subscription_status, SubscriptionStatus::Active);

        let sent = fx.notifier.sent_to(&phone());
        assert!(sent.iter().any(|m| m.contains("Insufficient funds")));
    }

    #[tokio::test]
    async fn invoice_failure_produces_notice_only() {
        let fx = fixture();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "invoice.payment_failed",
            "data": {
                "gateway_response": "Card expired",
                "metadata": { "phone_number": phone().as_str() }
            }
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &body).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::FailureNoticed);
        assert!(fx.users.find_by_phone(&phone()).await.unwrap().is_none());
    }

    // ══════════════════════════════════════════════════════════════
    // Cancellation Event Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn cancellation_deactivates_active_user() {
        let fx = fixture();
        apply_signed(&fx, &success_body("1_month")).await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "subscription.disable",
            "data": {
                "subscription_code": "SUB_1",
                "metadata": { "phone_number": phone().as_str() }
            }
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &body).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::CancellationApplied);
        let user = fx.users.find_by_phone(&phone()).await.unwrap().unwrap();
        assert_eq!(user.subscription_status, SubscriptionStatus::Inactive);
    }

    #[tokio::test]
    async fn cancellation_for_inactive_user_is_noop() {
        let fx = fixture();
        fx.users.get_or_create(&phone()).await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "subscription.disable",
            "data": { "metadata": { "phone_number": phone().as_str() } }
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &body).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::CancellationNoop);

        // Replay converges on the same outcome.
        let outcome = apply_signed(&fx, &body).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::CancellationNoop);
    }

    #[tokio::test]
    async fn cancellation_correlates_by_subscription_code() {
        let fx = fixture();
        apply_signed(&fx, &success_body("1_month")).await.unwrap();
        // The activation stored no subscription code; write one through a
        // second success event that carries it.
        let body = serde_json::to_vec(&serde_json::json!({
            "event": "subscription.create",
            "data": {
                "reference": "ref_test_1",
                "subscription_code": "SUB_9",
                "paid_at": "2024-10-01T21:25:51.000Z",
                "metadata": { "phone_number": phone().as_str(), "plan": "1_month" }
            }
        }))
        .unwrap();
        apply_signed(&fx, &body).await.unwrap();

        let cancel = serde_json::to_vec(&serde_json::json!({
            "event": "subscription.disable",
            "data": { "subscription_code": "SUB_9" }
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &cancel).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::CancellationApplied);
    }

    // ══════════════════════════════════════════════════════════════
    // Unknown Event Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_event_types_are_ignored() {
        let fx = fixture();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "customer.identification.success",
            "data": {}
        }))
        .unwrap();

        let outcome = apply_signed(&fx, &body).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Ignored);
        assert!(fx.notifier.all_sent().is_empty());
    }
}
