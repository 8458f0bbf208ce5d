//! In-memory result log.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::exam::ScoreSummary;
use crate::domain::foundation::DomainError;
use crate::ports::ResultLog;

/// One recorded practice completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeRecord {
    pub user_id: Uuid,
    pub subject: String,
    pub score: ScoreSummary,
}

/// One recorded mock completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRecord {
    pub user_id: Uuid,
    pub score: ScoreSummary,
}

/// Vec-backed implementation of the ResultLog port, with the same
/// best-score aggregate the Postgres adapter maintains.
pub struct InMemoryResultLog {
    practice: Mutex<Vec<PracticeRecord>>,
    mocks: Mutex<Vec<MockRecord>>,
    best_scores: Mutex<Vec<(Uuid, String, u32)>>,
}

impl InMemoryResultLog {
    pub fn new() -> Self {
        Self {
            practice: Mutex::new(Vec::new()),
            mocks: Mutex::new(Vec::new()),
            best_scores: Mutex::new(Vec::new()),
        }
    }

    pub fn practice_records(&self) -> Vec<PracticeRecord> {
        self.practice.lock().unwrap().clone()
    }

    pub fn mock_records(&self) -> Vec<MockRecord> {
        self.mocks.lock().unwrap().clone()
    }

    /// Best practice percentage for (user, subject), if any.
    pub fn best_score(&self, user_id: Uuid, subject: &str) -> Option<u32> {
        self.best_scores
            .lock()
            .unwrap()
            .iter()
            .find(|(u, s, _)| *u == user_id && s == subject)
            .map(|(_, _, best)| *best)
    }
}

impl Default for InMemoryResultLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultLog for InMemoryResultLog {
    async fn record_practice(
        &self,
        user_id: Uuid,
        subject: &str,
        score: ScoreSummary,
    ) -> Result<(), DomainError> {
        self.practice.lock().unwrap().push(PracticeRecord {
            user_id,
            subject: subject.to_string(),
            score,
        });

        let mut best = self.best_scores.lock().unwrap();
        match best
            .iter_mut()
            .find(|(u, s, _)| *u == user_id && s == subject)
        {
            Some((_, _, current)) => *current = (*current).max(score.percentage),
            None => best.push((user_id, subject.to_string(), score.percentage)),
        }

        Ok(())
    }

    async fn record_mock(&self, user_id: Uuid, score: ScoreSummary) -> Result<(), DomainError> {
        self.mocks.lock().unwrap().push(MockRecord { user_id, score });
        Ok(())
    }
}
