//! Ephemeral session store port.
//!
//! Key-scoped get/put/delete with no cross-key transactions. Every `put`
//! resets the entry's TTL; reads never extend it. Keys are namespaced
//! `session:<phone>`, `practice:<phone>`, `mock:<phone>`.
//!
//! Losing this store interrupts an in-progress exam but can never corrupt a
//! user's subscription state, which lives in the durable [`UserStore`].
//!
//! [`UserStore`]: super::UserStore

use async_trait::async_trait;

use crate::domain::conversation::Session;
use crate::domain::exam::{ExamKind, ExamSession};
use crate::domain::foundation::{DomainError, PhoneNumber};

/// Port for the TTL-bound session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches the conversational session, if one is live.
    async fn get_conversation(&self, id: &PhoneNumber) -> Result<Option<Session>, DomainError>;

    /// Writes the conversational session wholesale, resetting its 24 h TTL.
    async fn put_conversation(&self, session: &Session) -> Result<(), DomainError>;

    /// Deletes the conversational session.
    async fn delete_conversation(&self, id: &PhoneNumber) -> Result<(), DomainError>;

    /// Fetches the exam session of the given kind, if one is live.
    async fn get_exam(
        &self,
        id: &PhoneNumber,
        kind: ExamKind,
    ) -> Result<Option<ExamSession>, DomainError>;

    /// Writes an exam session wholesale, resetting its kind-specific TTL
    /// (practice 1 h, mock 2 h). Replaces any prior session of the same
    /// kind: overwrite, never merge.
    async fn put_exam(&self, id: &PhoneNumber, session: &ExamSession) -> Result<(), DomainError>;

    /// Deletes the exam session of the given kind.
    async fn delete_exam(&self, id: &PhoneNumber, kind: ExamKind) -> Result<(), DomainError>;
}
