//! Exam session state machine.
//!
//! A session moves `in_progress -> {completed | timed_out}`. There is no
//! backward transition. Timeouts are never detected by a background sweep:
//! the mock deadline is a stored field and `status_at` evaluates it lazily
//! whenever the session is read, submitted to, or resumed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::ExamError;
use super::question::{AnswerChoice, ExamQuestion};
use crate::domain::foundation::Timestamp;

/// Number of questions drawn for a practice set.
pub const PRACTICE_QUESTION_COUNT: usize = 10;

/// Number of questions in a full mock exam.
pub const MOCK_QUESTION_COUNT: usize = 180;

/// Wall-clock limit for a mock exam.
pub const MOCK_DURATION_MINUTES: i64 = 120;

/// The two kinds of exam session, each with its own store key and TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamKind {
    Practice,
    Mock,
}

impl ExamKind {
    /// Key namespace prefix in the ephemeral store.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ExamKind::Practice => "practice",
            ExamKind::Mock => "mock",
        }
    }

    /// Store TTL in seconds.
    pub fn ttl_secs(&self) -> u64 {
        match self {
            ExamKind::Practice => 60 * 60,
            ExamKind::Mock => 2 * 60 * 60,
        }
    }
}

impl std::fmt::Display for ExamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key_prefix())
    }
}

/// Session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    InProgress,
    Completed,
    TimedOut,
}

/// Named policies governing session behavior.
///
/// Out-of-order submission is deliberately permitted by default: the pointer
/// jumps to `index + 1` for whatever index was answered, which lets users
/// skip around and change earlier answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPolicy {
    pub allow_non_sequential_answers: bool,
}

impl Default for ExamPolicy {
    fn default() -> Self {
        Self {
            allow_non_sequential_answers: true,
        }
    }
}

/// Result of grading a session against its canonical answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
}

/// Outcome of recording an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Answer recorded; more questions remain.
    Recorded,
    /// Answer recorded and the pointer moved past the last question.
    LastAnswered,
    /// Answer recorded, but the deadline had already elapsed.
    TimedOut,
}

/// A practice or mock exam in flight for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    pub kind: ExamKind,

    /// Subject for practice sessions; mock exams span all subjects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Ordered question list; grading compares against the embedded keys.
    pub questions: Vec<ExamQuestion>,

    /// Sparse answer map; indices need not be contiguous or complete.
    pub answers: HashMap<usize, AnswerChoice>,

    /// Pointer to the next question to present.
    pub current_index: usize,

    pub started_at: Timestamp,

    /// Hard deadline; set only for mock sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Timestamp>,

    pub status: ExamStatus,

    #[serde(default)]
    pub policy: ExamPolicy,
}

impl ExamSession {
    /// Starts a fresh session.
    ///
    /// Mock sessions get a hard deadline of `now + 120 minutes`. The caller
    /// is responsible for writing the session to the store, which replaces
    /// any prior session of the same kind wholesale.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyQuestionSet` if `questions` is empty.
    pub fn start(
        kind: ExamKind,
        subject: Option<String>,
        questions: Vec<ExamQuestion>,
        now: Timestamp,
    ) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::EmptyQuestionSet);
        }

        let deadline = match kind {
            ExamKind::Mock => Some(now.plus_minutes(MOCK_DURATION_MINUTES)),
            ExamKind::Practice => None,
        };

        Ok(Self {
            kind,
            subject,
            questions,
            answers: HashMap::new(),
            current_index: 0,
            started_at: now,
            deadline,
            status: ExamStatus::InProgress,
            policy: ExamPolicy::default(),
        })
    }

    /// Effective status at `now`.
    ///
    /// Pure function of stored fields: an in-progress mock whose deadline has
    /// elapsed reports `TimedOut` without any store mutation.
    pub fn status_at(&self, now: Timestamp) -> ExamStatus {
        match (self.status, self.deadline) {
            (ExamStatus::InProgress, Some(deadline)) if now.is_after(&deadline) => {
                ExamStatus::TimedOut
            }
            (status, _) => status,
        }
    }

    /// Records an answer and advances the pointer to `index + 1`.
    ///
    /// Last write wins for a repeated index, which is how users change an
    /// earlier answer. A mock submission past the deadline is still recorded
    /// but flips the session to `TimedOut`.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` if the index has no question
    /// - `OutOfOrderAnswer` if the policy forbids non-sequential submission
    pub fn submit_answer(
        &mut self,
        index: usize,
        choice: AnswerChoice,
        now: Timestamp,
    ) -> Result<SubmitOutcome, ExamError> {
        if index >= self.questions.len() {
            return Err(ExamError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        if !self.policy.allow_non_sequential_answers && index != self.current_index {
            return Err(ExamError::OutOfOrderAnswer {
                index,
                expected: self.current_index,
            });
        }

        self.answers.insert(index, choice);
        self.current_index = index + 1;

        if self.status_at(now) == ExamStatus::TimedOut {
            self.status = ExamStatus::TimedOut;
            return Ok(SubmitOutcome::TimedOut);
        }

        if self.current_index >= self.questions.len() {
            Ok(SubmitOutcome::LastAnswered)
        } else {
            Ok(SubmitOutcome::Recorded)
        }
    }

    /// The question the pointer currently rests on, if any remain.
    pub fn current_question(&self) -> Option<&ExamQuestion> {
        self.questions.get(self.current_index)
    }

    /// Grades the session against its embedded answer key.
    ///
    /// A question counts correct iff the stored answer letter equals the
    /// canonical key exactly. Unanswered indices count as incorrect; there is
    /// no partial credit.
    pub fn grade(&self) -> ScoreSummary {
        let total = self.questions.len();
        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| self.answers.get(i) == Some(&q.correct_answer))
            .count();
        let percentage = if total == 0 {
            0
        } else {
            ((correct as f64 / total as f64) * 100.0).round() as u32
        };

        ScoreSummary {
            correct,
            total,
            percentage,
        }
    }

    /// Marks the session completed. Grading and deletion are the caller's.
    pub fn mark_completed(&mut self) {
        self.status = ExamStatus::Completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(n: u32, correct: AnswerChoice) -> ExamQuestion {
        ExamQuestion {
            id: n as i64,
            subject: "english".to_string(),
            year: 2023,
            number: n,
            text: format!("Question {}", n),
            option_a: "a".to_string(),
            option_b: "b".to_string(),
            option_c: "c".to_string(),
            option_d: "d".to_string(),
            correct_answer: correct,
            explanation: None,
        }
    }

    fn questions(n: usize) -> Vec<ExamQuestion> {
        (0..n).map(|i| question(i as u32 + 1, AnswerChoice::A)).collect()
    }

    #[test]
    fn start_rejects_empty_question_set() {
        let result = ExamSession::start(ExamKind::Practice, None, vec![], Timestamp::now());
        assert_eq!(result.unwrap_err(), ExamError::EmptyQuestionSet);
    }

    #[test]
    fn start_initializes_pointer_at_zero() {
        let session =
            ExamSession::start(ExamKind::Practice, Some("english".to_string()), questions(10), Timestamp::now())
                .unwrap();

        assert_eq!(session.current_index, 0);
        assert_eq!(session.questions.len(), 10);
        assert_eq!(session.status, ExamStatus::InProgress);
        assert!(session.deadline.is_none());
    }

    #[test]
    fn mock_start_sets_two_hour_deadline() {
        let now = Timestamp::from_unix_secs(1_700_000_000);
        let session = ExamSession::start(ExamKind::Mock, None, questions(3), now).unwrap();

        assert_eq!(session.deadline, Some(now.plus_minutes(120)));
    }

    #[test]
    fn submit_records_answer_and_advances_pointer() {
        let now = Timestamp::now();
        let mut session = ExamSession::start(ExamKind::Practice, None, questions(5), now).unwrap();

        let outcome = session.submit_answer(0, AnswerChoice::B, now).unwrap();

        assert_eq!(outcome, SubmitOutcome::Recorded);
        assert_eq!(session.answers.get(&0), Some(&AnswerChoice::B));
        assert_eq!(session.current_index, 1);
    }

    #[test]
    fn out_of_order_submission_jumps_pointer() {
        let now = Timestamp::now();
        let mut session = ExamSession::start(ExamKind::Practice, None, questions(10), now).unwrap();

        session.submit_answer(7, AnswerChoice::C, now).unwrap();

        assert_eq!(session.current_index, 8);
        assert_eq!(session.answers.len(), 1);
    }

    #[test]
    fn sequential_policy_rejects_out_of_order() {
        let now = Timestamp::now();
        let mut session = ExamSession::start(ExamKind::Practice, None, questions(10), now).unwrap();
        session.policy = ExamPolicy {
            allow_non_sequential_answers: false,
        };

        let result = session.submit_answer(3, AnswerChoice::A, now);

        assert_eq!(
            result.unwrap_err(),
            ExamError::OutOfOrderAnswer {
                index: 3,
                expected: 0
            }
        );
    }

    #[test]
    fn resubmission_overwrites_last_write_wins() {
        let now = Timestamp::now();
        let mut session = ExamSession::start(ExamKind::Practice, None, questions(5), now).unwrap();

        session.submit_answer(2, AnswerChoice::A, now).unwrap();
        session.submit_answer(2, AnswerChoice::D, now).unwrap();

        assert_eq!(session.answers.get(&2), Some(&AnswerChoice::D));
        assert_eq!(session.answers.len(), 1);
    }

    #[test]
    fn submit_out_of_range_fails() {
        let now = Timestamp::now();
        let mut session = ExamSession::start(ExamKind::Practice, None, questions(3), now).unwrap();

        let result = session.submit_answer(3, AnswerChoice::A, now);

        assert_eq!(
            result.unwrap_err(),
            ExamError::IndexOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn last_answer_reports_last_answered() {
        let now = Timestamp::now();
        let mut session = ExamSession::start(ExamKind::Practice, None, questions(2), now).unwrap();

        session.submit_answer(0, AnswerChoice::A, now).unwrap();
        let outcome = session.submit_answer(1, AnswerChoice::A, now).unwrap();

        assert_eq!(outcome, SubmitOutcome::LastAnswered);
    }

    #[test]
    fn mock_past_deadline_reports_timed_out_on_read() {
        let start = Timestamp::from_unix_secs(1_700_000_000);
        let session = ExamSession::start(ExamKind::Mock, None, questions(3), start).unwrap();

        let before = start.plus_minutes(119);
        let after = start.plus_minutes(121);

        assert_eq!(session.status_at(before), ExamStatus::InProgress);
        assert_eq!(session.status_at(after), ExamStatus::TimedOut);
    }

    #[test]
    fn mock_submission_past_deadline_records_but_times_out() {
        let start = Timestamp::from_unix_secs(1_700_000_000);
        let mut session = ExamSession::start(ExamKind::Mock, None, questions(3), start).unwrap();

        let late = start.plus_minutes(121);
        let outcome = session.submit_answer(0, AnswerChoice::B, late).unwrap();

        assert_eq!(outcome, SubmitOutcome::TimedOut);
        assert_eq!(session.answers.get(&0), Some(&AnswerChoice::B));
        assert_eq!(session.status, ExamStatus::TimedOut);
        assert_eq!(session.status_at(late), ExamStatus::TimedOut);
    }

    #[test]
    fn practice_sessions_never_time_out() {
        let start = Timestamp::from_unix_secs(1_700_000_000);
        let session = ExamSession::start(ExamKind::Practice, None, questions(3), start).unwrap();

        assert_eq!(
            session.status_at(start.add_days(365)),
            ExamStatus::InProgress
        );
    }

    #[test]
    fn grading_counts_exact_matches_only() {
        let now = Timestamp::now();
        let qs = vec![
            question(1, AnswerChoice::A),
            question(2, AnswerChoice::B),
            question(3, AnswerChoice::C),
            question(4, AnswerChoice::D),
        ];
        let mut session = ExamSession::start(ExamKind::Practice, None, qs, now).unwrap();

        session.submit_answer(0, AnswerChoice::A, now).unwrap(); // correct
        session.submit_answer(1, AnswerChoice::C, now).unwrap(); // wrong
        session.submit_answer(2, AnswerChoice::C, now).unwrap(); // correct
        // index 3 unanswered -> incorrect

        let score = session.grade();
        assert_eq!(score.correct, 2);
        assert_eq!(score.total, 4);
        assert_eq!(score.percentage, 50);
    }

    #[test]
    fn seventy_percent_from_seven_of_ten() {
        let now = Timestamp::now();
        let mut session = ExamSession::start(ExamKind::Practice, None, questions(10), now).unwrap();

        for i in 0..7 {
            session.submit_answer(i, AnswerChoice::A, now).unwrap();
        }
        for i in 7..10 {
            session.submit_answer(i, AnswerChoice::B, now).unwrap();
        }

        let score = session.grade();
        assert_eq!(score.correct, 7);
        assert_eq!(score.percentage, 70);
    }

    #[test]
    fn kind_key_prefixes_and_ttls() {
        assert_eq!(ExamKind::Practice.key_prefix(), "practice");
        assert_eq!(ExamKind::Mock.key_prefix(), "mock");
        assert_eq!(ExamKind::Practice.ttl_secs(), 3_600);
        assert_eq!(ExamKind::Mock.ttl_secs(), 7_200);
    }

    #[test]
    fn session_serde_roundtrip_preserves_answers() {
        let now = Timestamp::from_unix_secs(1_700_000_000);
        let mut session = ExamSession::start(ExamKind::Mock, None, questions(3), now).unwrap();
        session.submit_answer(1, AnswerChoice::D, now).unwrap();

        let json = serde_json::to_string(&session).unwrap();
        let back: ExamSession = serde_json::from_str(&json).unwrap();

        assert_eq!(back.answers.get(&1), Some(&AnswerChoice::D));
        assert_eq!(back.current_index, 2);
        assert_eq!(back.deadline, session.deadline);
        assert!(back.policy.allow_non_sequential_answers);
    }
}
