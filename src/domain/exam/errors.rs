//! Exam session error types.

use thiserror::Error;

/// Errors raised by exam session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    /// A session cannot start without questions.
    #[error("Cannot start an exam with an empty question set")]
    EmptyQuestionSet,

    /// Answer index does not refer to a question in the set.
    #[error("Question index {index} out of range (session has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Sequential-answer policy rejected an out-of-order submission.
    #[error("Answer for question {index} rejected: expected question {expected}")]
    OutOfOrderAnswer { index: usize, expected: usize },
}
