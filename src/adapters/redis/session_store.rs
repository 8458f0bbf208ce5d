//! Redis-backed session store for production deployments.
//!
//! Sessions are stored as JSON strings under namespaced keys
//! (`session:<phone>`, `practice:<phone>`, `mock:<phone>`) with `SETEX`, so
//! every write resets the TTL and reads never extend it. Redis handles
//! expiry itself; an expired key simply reads as absent.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::conversation::{Session, SESSION_TTL_SECS};
use crate::domain::exam::{ExamKind, ExamSession};
use crate::domain::foundation::{DomainError, PhoneNumber};
use crate::ports::SessionStore;

/// Redis implementation of the SessionStore port.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
}

impl RedisSessionStore {
    /// Creates a store over an established connection.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn conversation_key(id: &PhoneNumber) -> String {
        format!("session:{}", id)
    }

    fn exam_key(id: &PhoneNumber, kind: ExamKind) -> String {
        format!("{}:{}", kind.key_prefix(), id)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, DomainError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(key)
            .await
            .map_err(|e: redis::RedisError| DomainError::cache(e.to_string()))?;

        match payload {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| DomainError::cache(format!("corrupt session payload: {}", e))),
            None => Ok(None),
        }
    }

    async fn put_json<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), DomainError> {
        let payload =
            serde_json::to_string(value).map_err(|e| DomainError::cache(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, payload, ttl_secs)
            .await
            .map_err(|e: redis::RedisError| DomainError::cache(e.to_string()))
    }

    async fn delete_key(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e: redis::RedisError| DomainError::cache(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_conversation(&self, id: &PhoneNumber) -> Result<Option<Session>, DomainError> {
        self.get_json(&Self::conversation_key(id)).await
    }

    async fn put_conversation(&self, session: &Session) -> Result<(), DomainError> {
        self.put_json(
            &Self::conversation_key(&session.phone_number),
            session,
            SESSION_TTL_SECS,
        )
        .await
    }

    async fn delete_conversation(&self, id: &PhoneNumber) -> Result<(), DomainError> {
        self.delete_key(&Self::conversation_key(id)).await
    }

    async fn get_exam(
        &self,
        id: &PhoneNumber,
        kind: ExamKind,
    ) -> Result<Option<ExamSession>, DomainError> {
        self.get_json(&Self::exam_key(id, kind)).await
    }

    async fn put_exam(&self, id: &PhoneNumber, session: &ExamSession) -> Result<(), DomainError> {
        self.put_json(
            &Self::exam_key(id, session.kind),
            session,
            session.kind.ttl_secs(),
        )
        .await
    }

    async fn delete_exam(&self, id: &PhoneNumber, kind: ExamKind) -> Result<(), DomainError> {
        self.delete_key(&Self::exam_key(id, kind)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> PhoneNumber {
        PhoneNumber::new("2348012345678").unwrap()
    }

    #[test]
    fn keys_are_namespaced_by_kind() {
        assert_eq!(
            RedisSessionStore::conversation_key(&phone()),
            "session:2348012345678"
        );
        assert_eq!(
            RedisSessionStore::exam_key(&phone(), ExamKind::Practice),
            "practice:2348012345678"
        );
        assert_eq!(
            RedisSessionStore::exam_key(&phone(), ExamKind::Mock),
            "mock:2348012345678"
        );
    }
}
