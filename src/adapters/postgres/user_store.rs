//! PostgreSQL implementation of UserStore.
//!
//! Provides the durable identity and entitlement records behind the
//! subscription reconciler. Activation is a single UPDATE whose values come
//! entirely from the webhook event, which makes replayed deliveries
//! converge on the same row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{DomainError, ErrorCode, PhoneNumber, Timestamp};
use crate::domain::user::{SubscriptionStatus, User};
use crate::ports::{SubscriptionActivation, UserStore};

/// PostgreSQL implementation of the UserStore port.
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    phone_number: String,
    email: Option<String>,
    subscription_status: String,
    subscription_plan: Option<String>,
    entitlement_expires_at: Option<DateTime<Utc>>,
    payment_reference: Option<String>,
    subscription_code: Option<String>,
    authorization_digest: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let phone_number = PhoneNumber::new(&row.phone_number).map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid phone_number in row: {}", e),
            )
        })?;
        let subscription_status = SubscriptionStatus::parse(&row.subscription_status)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid status value: {}", row.subscription_status),
                )
            })?;
        let subscription_plan = match row.subscription_plan.as_deref() {
            Some(code) => Some(SubscriptionPlan::from_code(code).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid plan value: {}", code),
                )
            })?),
            None => None,
        };

        Ok(User {
            id: row.id,
            phone_number,
            email: row.email,
            subscription_status,
            subscription_plan,
            entitlement_expires_at: row.entitlement_expires_at.map(Timestamp::from_datetime),
            payment_reference: row.payment_reference,
            subscription_code: row.subscription_code,
            authorization_digest: row.authorization_digest,
            metadata: row.metadata,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE phone_number = $1")
                .bind(phone.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("Failed to fetch user", e))?;

        row.map(User::try_from).transpose()
    }

    async fn get_or_create(&self, phone: &PhoneNumber) -> Result<User, DomainError> {
        // Insert-if-absent, then read back. Concurrent first messages from
        // the same phone both land here; the conflict clause makes the race
        // benign.
        sqlx::query(
            r#"
            INSERT INTO users (id, phone_number, subscription_status, metadata, created_at, updated_at)
            VALUES ($1, $2, 'inactive', '{}', NOW(), NOW())
            ON CONFLICT (phone_number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(phone.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to create user", e))?;

        self.find_by_phone(phone).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::UserNotFound, phone.to_string())
        })
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE payment_reference = $1")
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("Failed to fetch user by reference", e))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_subscription_code(&self, code: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE subscription_code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("Failed to fetch user by subscription code", e))?;

        row.map(User::try_from).transpose()
    }

    async fn store_payment_reference(
        &self,
        phone: &PhoneNumber,
        reference: &str,
        plan: SubscriptionPlan,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE users SET
                payment_reference = $2,
                subscription_plan = $3,
                updated_at = NOW()
            WHERE phone_number = $1
            "#,
        )
        .bind(phone.as_str())
        .bind(reference)
        .bind(plan.code())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to store payment reference", e))?;

        Ok(())
    }

    async fn apply_activation(
        &self,
        phone: &PhoneNumber,
        activation: &SubscriptionActivation,
    ) -> Result<User, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                subscription_status = 'active',
                subscription_plan = $3,
                entitlement_expires_at = $4,
                payment_reference = COALESCE($5, payment_reference),
                subscription_code = COALESCE($6, subscription_code),
                authorization_digest = COALESCE($7, authorization_digest),
                metadata = $8,
                updated_at = NOW()
            WHERE phone_number = $1
            RETURNING *
            "#,
        )
        .bind(phone.as_str())
        .bind(&activation.email)
        .bind(activation.plan.code())
        .bind(activation.expires_at.as_datetime())
        .bind(&activation.payment_reference)
        .bind(&activation.subscription_code)
        .bind(&activation.authorization_digest)
        .bind(&activation.metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to apply activation", e))?;

        match row {
            Some(row) => User::try_from(row),
            None => Err(DomainError::new(ErrorCode::UserNotFound, phone.to_string())),
        }
    }

    async fn deactivate(
        &self,
        phone: &PhoneNumber,
        reason: &str,
    ) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users SET
                subscription_status = 'inactive',
                metadata = jsonb_build_object('deactivated_reason', $2::text),
                updated_at = NOW()
            WHERE phone_number = $1
            RETURNING *
            "#,
        )
        .bind(phone.as_str())
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to deactivate user", e))?;

        row.map(User::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_user() {
        let row = UserRow {
            id: Uuid::new_v4(),
            phone_number: "2348012345678".to_string(),
            email: Some("ada@example.com".to_string()),
            subscription_status: "active".to_string(),
            subscription_plan: Some("1_month".to_string()),
            entitlement_expires_at: Some(Utc::now()),
            payment_reference: Some("ref_1".to_string()),
            subscription_code: None,
            authorization_digest: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let user = User::try_from(row).unwrap();
        assert_eq!(user.subscription_status, SubscriptionStatus::Active);
        assert_eq!(user.subscription_plan, Some(SubscriptionPlan::Monthly));
    }

    #[test]
    fn row_with_bad_status_is_rejected() {
        let row = UserRow {
            id: Uuid::new_v4(),
            phone_number: "2348012345678".to_string(),
            email: None,
            subscription_status: "suspended".to_string(),
            subscription_plan: None,
            entitlement_expires_at: None,
            payment_reference: None,
            subscription_code: None,
            authorization_digest: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(User::try_from(row).is_err());
    }

    #[test]
    fn row_with_bad_plan_is_rejected() {
        let row = UserRow {
            id: Uuid::new_v4(),
            phone_number: "2348012345678".to_string(),
            email: None,
            subscription_status: "inactive".to_string(),
            subscription_plan: Some("2_weeks".to_string()),
            entitlement_expires_at: None,
            payment_reference: None,
            subscription_code: None,
            authorization_digest: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(User::try_from(row).is_err());
    }
}
