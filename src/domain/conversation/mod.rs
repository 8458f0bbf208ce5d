//! Generic conversational session state.
//!
//! Unlike exam sessions, this state has no machine of its own: it is a mode
//! flag the bot reads to interpret the next free-form message. It lives in
//! the ephemeral store under `session:<phone>` with a 24-hour TTL and is
//! overwritten wholesale on every update.

use serde::{Deserialize, Serialize};

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{PhoneNumber, Timestamp};

/// Store TTL for conversational sessions, in seconds.
pub const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// What the bot is currently expecting from this user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SessionMode {
    /// No flow in progress.
    Idle,

    /// First-run subject selection.
    Onboarding {
        step: OnboardingStep,
        selected_subjects: Vec<String>,
    },

    /// Plan menu was shown; the next reply should pick one.
    AwaitingPlanSelection,

    /// A payment link was issued; holds the pending intent until the
    /// matching webhook arrives (or the session expires).
    PaymentPending {
        plan: SubscriptionPlan,
        reference: String,
        access_code: String,
        initiated_at: Timestamp,
    },
}

/// Onboarding progress marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Welcome,
    SelectingSubjects,
    Completed,
}

/// Conversational session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub phone_number: PhoneNumber,
    #[serde(flatten)]
    pub mode: SessionMode,
    pub created_at: Timestamp,
    pub last_activity: Timestamp,
}

impl Session {
    /// Creates a session in the given mode.
    pub fn new(phone_number: PhoneNumber, mode: SessionMode) -> Self {
        let now = Timestamp::now();
        Self {
            phone_number,
            mode,
            created_at: now,
            last_activity: now,
        }
    }

    /// Replaces the mode and touches the activity timestamp.
    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self.last_activity = Timestamp::now();
        self
    }

    /// Pending payment intent, if one is held.
    pub fn pending_payment(&self) -> Option<(&SubscriptionPlan, &str)> {
        match &self.mode {
            SessionMode::PaymentPending {
                plan, reference, ..
            } => Some((plan, reference.as_str())),
            _ => None,
        }
    }
}
