//! PostgreSQL implementation of ResultLog.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::exam::ScoreSummary;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::ResultLog;

/// PostgreSQL implementation of the ResultLog port.
pub struct PostgresResultLog {
    pool: PgPool,
}

impl PostgresResultLog {
    /// Creates a new log with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl ResultLog for PostgresResultLog {
    async fn record_practice(
        &self,
        user_id: Uuid,
        subject: &str,
        score: ScoreSummary,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO practice_logs (user_id, subject, questions_count, correct_answers, completed_at, status)
            VALUES ($1, $2, $3, $4, NOW(), 'completed')
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .bind(score.total as i32)
        .bind(score.correct as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to record practice log", e))?;

        // Percentage rolls into the per-subject best-score aggregate.
        sqlx::query(
            r#"
            INSERT INTO user_scores (user_id, subject, score, attempts, best_score)
            VALUES ($1, $2, $3, 1, $3)
            ON CONFLICT (user_id, subject) DO UPDATE SET
                score = EXCLUDED.score,
                attempts = user_scores.attempts + 1,
                best_score = GREATEST(user_scores.best_score, EXCLUDED.best_score),
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .bind(score.percentage as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to update score aggregate", e))?;

        Ok(())
    }

    async fn record_mock(&self, user_id: Uuid, score: ScoreSummary) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO mock_exam_logs (user_id, total_questions, correct_answers, final_score, completed_at, status)
            VALUES ($1, $2, $3, $4, NOW(), 'completed')
            "#,
        )
        .bind(user_id)
        .bind(score.total as i32)
        .bind(score.correct as i32)
        .bind(score.percentage as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to record mock exam log", e))?;

        Ok(())
    }
}
