//! Command classification rules.
//!
//! Text matching is case-insensitive. The `<subject> <year> q<number>`
//! direct-lookup pattern takes precedence over keyword commands; unmatched
//! text falls back to the help menu.

use crate::domain::exam::AnswerChoice;

/// A classified conversational command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Direct question lookup, e.g. "english 2023 q15".
    DirectLookup {
        subject: String,
        year: u16,
        number: u32,
    },
    /// Show the premium plan menu.
    Subscribe,
    /// A specific plan was chosen, identified by its wire code. The code
    /// is validated by the reconciler, not here.
    PlanSelection(String),
    /// Start a practice session, optionally for a named subject.
    StartPractice { subject: Option<String> },
    /// Start a full timed mock exam.
    StartMock,
    /// Open the novel tutor.
    NovelTutor,
    /// Answer for question `index`.
    SubmitAnswer { index: usize, choice: AnswerChoice },
    /// Report subscription status.
    Status,
    /// Cancel the subscription.
    CancelSubscription,
    /// Resume an interrupted exam session.
    Resume,
    /// Keep the current session alive.
    StayActive,
    /// Abandon the current session.
    ExitSession,
    /// Begin first-run subject selection.
    StartOnboarding,
    /// An onboarding subject was picked.
    SelectSubject(String),
    /// Fallback help menu.
    Help,
}

/// Classifies a free-text message.
pub fn classify_text(body: &str) -> Command {
    let text = body.trim().to_lowercase();
    if text.is_empty() {
        return Command::Help;
    }

    // The direct-lookup pattern wins over every keyword rule.
    if let Some((subject, year, number)) = parse_direct_lookup(&text) {
        return Command::DirectLookup {
            subject,
            year,
            number,
        };
    }

    if text == "cancel" {
        return Command::CancelSubscription;
    }
    if text.contains("subscribe") || text.contains("premium") {
        return Command::Subscribe;
    }
    if text.contains("status") {
        return Command::Status;
    }
    if text.contains("resume") {
        return Command::Resume;
    }
    if matches!(text.as_str(), "1_month" | "3_months" | "lifetime") {
        return Command::PlanSelection(text);
    }
    if let Some(rest) = text.strip_prefix("practice") {
        let subject = rest.trim();
        return Command::StartPractice {
            subject: (!subject.is_empty()).then(|| subject.to_string()),
        };
    }
    if text.contains("mock") {
        return Command::StartMock;
    }
    if text.contains("novel") || text.contains("tutor") {
        return Command::NovelTutor;
    }

    Command::Help
}

/// Classifies an interactive button reply by its id.
pub fn classify_button(id: &str) -> Command {
    if let Some(rest) = id.strip_prefix("premium_") {
        return Command::PlanSelection(rest.replace('-', "_"));
    }
    if let Some(answer) = parse_answer_id(id) {
        return answer;
    }
    match id {
        "stay_active" => Command::StayActive,
        "exit_session" => Command::ExitSession,
        _ => Command::Help,
    }
}

/// Classifies an interactive list selection by its id.
pub fn classify_list(id: &str) -> Command {
    if let Some(subject) = id.strip_prefix("practice_") {
        return Command::StartPractice {
            subject: Some(subject.to_string()),
        };
    }
    if let Some(subject) = id.strip_prefix("subject_") {
        return Command::SelectSubject(subject.to_string());
    }
    match id {
        "menu_onboarding" => Command::StartOnboarding,
        "menu_practice" => Command::StartPractice { subject: None },
        "menu_mock" => Command::StartMock,
        "menu_premium" => Command::Subscribe,
        _ => Command::Help,
    }
}

/// Parses the `<subject> <year> q<number>` pattern.
///
/// Subject must be alphabetic, year exactly four digits, and the last token
/// a `q`-prefixed number.
fn parse_direct_lookup(text: &str) -> Option<(String, u16, u32)> {
    let mut tokens = text.split_whitespace();
    let subject = tokens.next()?;
    let year = tokens.next()?;
    let number = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }

    if subject.is_empty() || !subject.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number = number.strip_prefix('q')?;
    let number: u32 = number.parse().ok()?;

    Some((subject.to_string(), year.parse().ok()?, number))
}

/// Parses an `ans_<letter>_<index>` answer button id.
fn parse_answer_id(id: &str) -> Option<Command> {
    let rest = id.strip_prefix("ans_")?;
    let (letter, index) = rest.split_once('_')?;
    let choice = AnswerChoice::parse(letter)?;
    let index: usize = index.parse().ok()?;
    Some(Command::SubmitAnswer { index, choice })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_lookup_pattern() {
        assert_eq!(
            classify_text("english 2023 q15"),
            Command::DirectLookup {
                subject: "english".to_string(),
                year: 2023,
                number: 15,
            }
        );
    }

    #[test]
    fn direct_lookup_is_case_insensitive() {
        assert_eq!(
            classify_text("  English 2023 Q15 "),
            Command::DirectLookup {
                subject: "english".to_string(),
                year: 2023,
                number: 15,
            }
        );
    }

    #[test]
    fn direct_lookup_takes_precedence_over_keywords() {
        // "govt" could never collide, but a subject literally named after a
        // keyword must still resolve as a lookup.
        assert_eq!(
            classify_text("status 2020 q1"),
            Command::DirectLookup {
                subject: "status".to_string(),
                year: 2020,
                number: 1,
            }
        );
    }

    #[test]
    fn malformed_lookups_fall_through() {
        assert_eq!(classify_text("english 23 q15"), Command::Help);
        assert_eq!(classify_text("english 2023 15"), Command::Help);
        assert_eq!(classify_text("english 2023 q15 extra"), Command::Help);
        assert_eq!(classify_text("3nglish 2023 q15"), Command::Help);
    }

    #[test]
    fn cancel_must_be_exact() {
        assert_eq!(classify_text("cancel"), Command::CancelSubscription);
        assert_eq!(classify_text(" CANCEL "), Command::CancelSubscription);
        // "cancel my subscription" is not the cancel command
        assert_eq!(classify_text("cancel my subscription"), Command::Help);
    }

    #[test]
    fn subscribe_keywords() {
        assert_eq!(classify_text("subscribe"), Command::Subscribe);
        assert_eq!(classify_text("I want premium access"), Command::Subscribe);
    }

    #[test]
    fn status_and_resume_keywords() {
        assert_eq!(classify_text("what is my status?"), Command::Status);
        assert_eq!(classify_text("resume"), Command::Resume);
    }

    #[test]
    fn plan_codes_as_text_replies() {
        assert_eq!(
            classify_text("1_month"),
            Command::PlanSelection("1_month".to_string())
        );
        assert_eq!(
            classify_text("3_months"),
            Command::PlanSelection("3_months".to_string())
        );
        assert_eq!(
            classify_text("lifetime"),
            Command::PlanSelection("lifetime".to_string())
        );
    }

    #[test]
    fn practice_with_and_without_subject() {
        assert_eq!(
            classify_text("practice physics"),
            Command::StartPractice {
                subject: Some("physics".to_string())
            }
        );
        assert_eq!(
            classify_text("practice"),
            Command::StartPractice { subject: None }
        );
    }

    #[test]
    fn mock_and_novel_keywords() {
        assert_eq!(classify_text("start a mock exam"), Command::StartMock);
        assert_eq!(classify_text("novel"), Command::NovelTutor);
        assert_eq!(classify_text("tutor me"), Command::NovelTutor);
    }

    #[test]
    fn unmatched_text_falls_back_to_help() {
        assert_eq!(classify_text("hello there"), Command::Help);
        assert_eq!(classify_text(""), Command::Help);
    }

    #[test]
    fn premium_button_ids_carry_normalized_plan_codes() {
        assert_eq!(
            classify_button("premium_1-month"),
            Command::PlanSelection("1_month".to_string())
        );
        assert_eq!(
            classify_button("premium_3-months"),
            Command::PlanSelection("3_months".to_string())
        );
        assert_eq!(
            classify_button("premium_lifetime"),
            Command::PlanSelection("lifetime".to_string())
        );
        // Unknown codes pass through; the reconciler rejects them.
        assert_eq!(
            classify_button("premium_weekly"),
            Command::PlanSelection("weekly".to_string())
        );
    }

    #[test]
    fn answer_button_ids() {
        assert_eq!(
            classify_button("ans_a_0"),
            Command::SubmitAnswer {
                index: 0,
                choice: AnswerChoice::A
            }
        );
        assert_eq!(
            classify_button("ans_d_179"),
            Command::SubmitAnswer {
                index: 179,
                choice: AnswerChoice::D
            }
        );
        assert_eq!(classify_button("ans_e_1"), Command::Help);
        assert_eq!(classify_button("ans_a_"), Command::Help);
    }

    #[test]
    fn session_keepalive_buttons() {
        assert_eq!(classify_button("stay_active"), Command::StayActive);
        assert_eq!(classify_button("exit_session"), Command::ExitSession);
    }

    #[test]
    fn list_ids() {
        assert_eq!(
            classify_list("practice_chemistry"),
            Command::StartPractice {
                subject: Some("chemistry".to_string())
            }
        );
        assert_eq!(
            classify_list("subject_math"),
            Command::SelectSubject("math".to_string())
        );
        assert_eq!(classify_list("menu_mock"), Command::StartMock);
        assert_eq!(classify_list("menu_premium"), Command::Subscribe);
        assert_eq!(classify_list("menu_onboarding"), Command::StartOnboarding);
        assert_eq!(classify_list("something_else"), Command::Help);
    }
}
