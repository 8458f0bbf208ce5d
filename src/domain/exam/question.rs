//! Question material carried inside exam sessions.

use serde::{Deserialize, Serialize};

/// A single multiple-choice question.
///
/// Sessions embed full question records rather than ids so that an exam in
/// flight never depends on the question bank staying reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    /// Stable id within the question bank.
    pub id: i64,

    /// Subject slug (e.g. "english", "physics").
    pub subject: String,

    /// Exam year the question was drawn from.
    pub year: u16,

    /// Question number within that year's paper.
    pub number: u32,

    /// Question text.
    pub text: String,

    /// Answer options in A..D order.
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// Canonical answer letter.
    pub correct_answer: AnswerChoice,

    /// Optional explanation shown after grading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One of the four answer letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerChoice {
    A,
    B,
    C,
    D,
}

impl AnswerChoice {
    /// Parses a single answer letter, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    /// Returns the answer letter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl std::fmt::Display for AnswerChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
