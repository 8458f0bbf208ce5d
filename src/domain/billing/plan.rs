//! Subscription plan definitions.
//!
//! Plans are priced in naira and identified on the wire by the codes the
//! payment gateway echoes back inside webhook metadata.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Subscription plan purchased through the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    /// One month of premium access.
    Monthly,
    /// Three months of premium access.
    Quarterly,
    /// Lifetime access, represented as a 100-year entitlement window.
    Lifetime,
}

impl SubscriptionPlan {
    /// Parses the wire code used in gateway metadata and button ids.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1_month" => Some(Self::Monthly),
            "3_months" => Some(Self::Quarterly),
            "lifetime" => Some(Self::Lifetime),
            _ => None,
        }
    }

    /// Wire code carried in gateway metadata.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Monthly => "1_month",
            Self::Quarterly => "3_months",
            Self::Lifetime => "lifetime",
        }
    }

    /// Display name shown to users.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Monthly => "Monthly Premium",
            Self::Quarterly => "3-Month Premium",
            Self::Lifetime => "Lifetime Premium",
        }
    }

    /// Price in naira.
    pub fn amount_naira(&self) -> u32 {
        match self {
            Self::Monthly => 500,
            Self::Quarterly => 1_300,
            Self::Lifetime => 5_000,
        }
    }

    /// Price in kobo, the unit the gateway expects.
    pub fn amount_kobo(&self) -> u32 {
        self.amount_naira() * 100
    }

    /// Formatted price with currency symbol.
    pub fn display_amount(&self) -> &'static str {
        match self {
            Self::Monthly => "\u{20a6}500",
            Self::Quarterly => "\u{20a6}1,300",
            Self::Lifetime => "\u{20a6}5,000",
        }
    }

    /// Entitlement expiry for a purchase made at `from`.
    ///
    /// Lifetime uses an intentionally long but finite 100-year window rather
    /// than an unbounded sentinel.
    pub fn entitlement_expiry(&self, from: Timestamp) -> Timestamp {
        match self {
            Self::Monthly => from.add_months(1),
            Self::Quarterly => from.add_months(3),
            Self::Lifetime => from.add_years(100),
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
