//! Question bank port.
//!
//! The textual content library is an external collaborator; the core only
//! needs lookups and randomized draws.

use async_trait::async_trait;

use crate::domain::exam::ExamQuestion;
use crate::domain::foundation::DomainError;

/// Port for question material.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Direct lookup by subject, year, and question number.
    async fn find(
        &self,
        subject: &str,
        year: u16,
        number: u32,
    ) -> Result<Option<ExamQuestion>, DomainError>;

    /// Draws a randomized practice set for a subject. May return fewer than
    /// `count` questions when the bank is thin; never errors on that.
    async fn practice_set(
        &self,
        subject: &str,
        count: usize,
    ) -> Result<Vec<ExamQuestion>, DomainError>;

    /// Draws the full mock exam set across all subjects.
    async fn mock_set(&self) -> Result<Vec<ExamQuestion>, DomainError>;

    /// Questions for the set novel, used by the novel tutor.
    async fn novel_set(&self) -> Result<Vec<ExamQuestion>, DomainError>;
}
