//! Durable result log port.
//!
//! Completed sessions leave a record here before the ephemeral session is
//! deleted. Practice results roll into a per-subject best-score aggregate;
//! mock results are stored raw.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::exam::ScoreSummary;
use crate::domain::foundation::DomainError;

/// Port for persisting exam results.
#[async_trait]
pub trait ResultLog: Send + Sync {
    /// Records a completed practice session and folds the percentage into
    /// the user's best-score aggregate for the subject.
    async fn record_practice(
        &self,
        user_id: Uuid,
        subject: &str,
        score: ScoreSummary,
    ) -> Result<(), DomainError>;

    /// Records a completed (or timed-out) mock exam with its raw score.
    async fn record_mock(&self, user_id: Uuid, score: ScoreSummary) -> Result<(), DomainError>;
}
