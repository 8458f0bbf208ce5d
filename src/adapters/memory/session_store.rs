//! In-memory session store.
//!
//! Backs tests and single-process development runs. TTLs are honored by
//! storing an expiry deadline with each entry and filtering lazily on read,
//! mirroring how the Redis adapter behaves without a clock dependency in
//! the store contract.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::conversation::{Session, SESSION_TTL_SECS};
use crate::domain::exam::{ExamKind, ExamSession};
use crate::domain::foundation::{DomainError, PhoneNumber, Timestamp};
use crate::ports::SessionStore;

struct Entry {
    payload: String,
    expires_at: Timestamp,
}

/// HashMap-backed implementation of the SessionStore port.
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn conversation_key(id: &PhoneNumber) -> String {
        format!("session:{}", id)
    }

    fn exam_key(id: &PhoneNumber, kind: ExamKind) -> String {
        format!("{}:{}", kind.key_prefix(), id)
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|entry| {
            if entry.expires_at.is_after(&Timestamp::now()) {
                Some(entry.payload.clone())
            } else {
                None
            }
        })
    }

    fn put_raw(&self, key: String, payload: String, ttl_secs: u64) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Entry {
                payload,
                expires_at: Timestamp::now().plus_secs(ttl_secs as i64),
            },
        );
    }

    fn delete_raw(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    /// Force-expires an entry, for tests exercising TTL behavior.
    pub fn expire_now(&self, id: &PhoneNumber, kind: Option<ExamKind>) {
        let key = match kind {
            Some(kind) => Self::exam_key(id, kind),
            None => Self::conversation_key(id),
        };
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(&key) {
            entry.expires_at = Timestamp::now().plus_secs(-1);
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_conversation(&self, id: &PhoneNumber) -> Result<Option<Session>, DomainError> {
        match self.get_raw(&Self::conversation_key(id)) {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| DomainError::cache(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put_conversation(&self, session: &Session) -> Result<(), DomainError> {
        let payload =
            serde_json::to_string(session).map_err(|e| DomainError::cache(e.to_string()))?;
        self.put_raw(
            Self::conversation_key(&session.phone_number),
            payload,
            SESSION_TTL_SECS,
        );
        Ok(())
    }

    async fn delete_conversation(&self, id: &PhoneNumber) -> Result<(), DomainError> {
        self.delete_raw(&Self::conversation_key(id));
        Ok(())
    }

    async fn get_exam(
        &self,
        id: &PhoneNumber,
        kind: ExamKind,
    ) -> Result<Option<ExamSession>, DomainError> {
        match self.get_raw(&Self::exam_key(id, kind)) {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| DomainError::cache(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put_exam(&self, id: &PhoneNumber, session: &ExamSession) -> Result<(), DomainError> {
        let payload =
            serde_json::to_string(session).map_err(|e| DomainError::cache(e.to_string()))?;
        self.put_raw(
            Self::exam_key(id, session.kind),
            payload,
            session.kind.ttl_secs(),
        );
        Ok(())
    }

    async fn delete_exam(&self, id: &PhoneNumber, kind: ExamKind) -> Result<(), DomainError> {
        self.delete_raw(&Self::exam_key(id, kind));
        Ok(())
    }
}
