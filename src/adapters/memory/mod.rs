//! In-memory adapters.
//!
//! First-class implementations of the ports backed by process memory. They
//! power the test suite and let the bot run end-to-end on a laptop with no
//! Redis or Postgres.

mod notifier;
mod question_bank;
mod result_log;
mod session_store;
mod user_store;

pub use notifier::{RecordingNotifier, SentKind, SentMessage};
pub use question_bank::{InMemoryQuestionBank, SUBJECTS};
pub use result_log::{InMemoryResultLog, MockRecord, PracticeRecord};
pub use session_store::InMemorySessionStore;
pub use user_store::InMemoryUserStore;
