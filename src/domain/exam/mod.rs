//! Exam domain: question material and the practice/mock session state machine.

mod errors;
mod question;
mod session;

pub use errors::ExamError;
pub use question::{AnswerChoice, ExamQuestion};
pub use session::{
    ExamKind, ExamPolicy, ExamSession, ExamStatus, ScoreSummary, SubmitOutcome,
    MOCK_DURATION_MINUTES, MOCK_QUESTION_COUNT, PRACTICE_QUESTION_COUNT,
};
