//! In-memory question bank.
//!
//! Serves tests and single-process demo runs from a seeded table. Draws
//! rotate through the table with an incrementing offset so repeated sessions
//! see different question orders without a PRNG dependency.

use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::domain::exam::{AnswerChoice, ExamQuestion};
use crate::domain::foundation::DomainError;
use crate::ports::QuestionBank;

/// Subjects the demo seed covers.
pub const SUBJECTS: [&str; 6] = [
    "english",
    "math",
    "physics",
    "chemistry",
    "biology",
    "govt",
];

static DEMO_SEED: Lazy<Vec<ExamQuestion>> = Lazy::new(|| {
    let mut questions = Vec::new();
    let mut id = 0;
    for subject in SUBJECTS {
        for number in 1..=20u32 {
            id += 1;
            questions.push(ExamQuestion {
                id,
                subject: subject.to_string(),
                year: 2023,
                number,
                text: format!("({} 2023 q{}) Choose the correct option.", subject, number),
                option_a: "Option A".to_string(),
                option_b: "Option B".to_string(),
                option_c: "Option C".to_string(),
                option_d: "Option D".to_string(),
                correct_answer: match number % 4 {
                    0 => AnswerChoice::D,
                    1 => AnswerChoice::A,
                    2 => AnswerChoice::B,
                    _ => AnswerChoice::C,
                },
                explanation: None,
            });
        }
    }
    questions
});

/// Table-backed implementation of the QuestionBank port.
pub struct InMemoryQuestionBank {
    questions: Vec<ExamQuestion>,
    novel_questions: Vec<ExamQuestion>,
    draw_offset: Mutex<usize>,
}

impl InMemoryQuestionBank {
    /// Bank backed by the built-in demo seed.
    pub fn seeded() -> Self {
        Self::with_questions(DEMO_SEED.clone(), Vec::new())
    }

    /// Bank backed by caller-supplied questions.
    pub fn with_questions(
        questions: Vec<ExamQuestion>,
        novel_questions: Vec<ExamQuestion>,
    ) -> Self {
        Self {
            questions,
            novel_questions,
            draw_offset: Mutex::new(0),
        }
    }

    fn draw(&self, filter: impl Fn(&ExamQuestion) -> bool, count: usize) -> Vec<ExamQuestion> {
        let pool: Vec<&ExamQuestion> = self.questions.iter().filter(|q| filter(q)).collect();
        if pool.is_empty() {
            return Vec::new();
        }

        let mut offset = self.draw_offset.lock().unwrap();
        *offset = offset.wrapping_add(1);
        let start = *offset % pool.len();

        pool.iter()
            .cycle()
            .skip(start)
            .take(count.min(pool.len()))
            .map(|q| (*q).clone())
            .collect()
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn find(
        &self,
        subject: &str,
        year: u16,
        number: u32,
    ) -> Result<Option<ExamQuestion>, DomainError> {
        Ok(self
            .questions
            .iter()
            .find(|q| q.subject == subject && q.year == year && q.number == number)
            .cloned())
    }

    async fn practice_set(
        &self,
        subject: &str,
        count: usize,
    ) -> Result<Vec<ExamQuestion>, DomainError> {
        Ok(self.draw(|q| q.subject == subject, count))
    }

    async fn mock_set(&self) -> Result<Vec<ExamQuestion>, DomainError> {
        // 36 questions per subject, matching the 180-question paper when the
        // bank is full; a thinner bank yields a shorter paper.
        let mut set = Vec::new();
        for subject in SUBJECTS {
            set.extend(self.draw(|q| q.subject == subject, 36));
        }
        Ok(set)
    }

    async fn novel_set(&self) -> Result<Vec<ExamQuestion>, DomainError> {
        Ok(self.novel_questions.clone())
    }
}
