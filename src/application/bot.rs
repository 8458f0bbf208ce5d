//! Bot service.
//!
//! Executes classified commands against the exam state machine, the stores,
//! and the notifier. This is also the dispatcher boundary from the error
//! handling design: any unexpected error inside a per-message handler is
//! caught in [`BotService::handle_event`], logged, and converted to a
//! generic apology so no single bad message can wedge the process.

use std::sync::Arc;

use crate::application::reconciler::SubscriptionReconciler;
use crate::domain::billing::BillingError;
use crate::domain::conversation::{OnboardingStep, Session, SessionMode};
use crate::domain::dispatch::{dispatch, Command, Dispatch, InboundEvent};
use crate::domain::exam::{
    ExamError, ExamKind, ExamSession, ExamStatus, ScoreSummary, SubmitOutcome, AnswerChoice,
    MOCK_DURATION_MINUTES, PRACTICE_QUESTION_COUNT,
};
use crate::domain::foundation::{DomainError, PhoneNumber, Timestamp};
use crate::ports::{
    ListRow, ListSection, Notifier, PaymentGateway, QuestionBank, ReplyButton, ResultLog,
    SessionStore, UserStore,
};

const HELP_MESSAGE: &str = "Welcome to Prepbot! \u{1f4da}\n\nWhat would you like to do?\n\
    1. Query Questions: Send 'english 2023 q15'\n\
    2. Practice: Send 'practice [subject]'\n\
    3. Full Mock Exam: Send 'mock' (premium)\n\
    4. Novel Tutor: Send 'novel' (premium)\n\
    5. Subscribe: Send 'subscribe'\n\
    6. Check Status: Send 'status'\n\
    7. Cancel: Send 'cancel'";

const APOLOGY_MESSAGE: &str =
    "Sorry, an error occurred while processing your request. Please try again.";

/// Orchestrates conversational commands.
pub struct BotService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    questions: Arc<dyn QuestionBank>,
    results: Arc<dyn ResultLog>,
    notifier: Arc<dyn Notifier>,
    gateway: Arc<dyn PaymentGateway>,
    reconciler: Arc<SubscriptionReconciler>,
}

impl BotService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        questions: Arc<dyn QuestionBank>,
        results: Arc<dyn ResultLog>,
        notifier: Arc<dyn Notifier>,
        gateway: Arc<dyn PaymentGateway>,
        reconciler: Arc<SubscriptionReconciler>,
    ) -> Self {
        Self {
            users,
            sessions,
            questions,
            results,
            notifier,
            gateway,
            reconciler,
        }
    }

    /// Entry point for one inbound event. Never returns an error: failures
    /// are logged and answered with an apology (or, for webhook deliveries,
    /// left to the gateway's retry schedule).
    pub async fn handle_event(&self, event: InboundEvent) {
        match dispatch(event) {
            Dispatch::Command(from, command) => {
                tracing::debug!(phone = %from, command = ?command, "handling command");
                if let Err(e) = self.handle_command(&from, command).await {
                    tracing::error!(phone = %from, error = %e, "command handler failed");
                    self.send(&from, APOLOGY_MESSAGE).await;
                }
            }
            Dispatch::PaymentNotification {
                raw_body,
                signature,
            } => {
                if let Err(e) = self
                    .reconciler
                    .verify_and_apply(&raw_body, &signature)
                    .await
                {
                    tracing::error!(error = %e, "payment notification processing failed");
                }
            }
        }
    }

    /// Executes one classified command.
    pub async fn handle_command(
        &self,
        from: &PhoneNumber,
        command: Command,
    ) -> Result<(), DomainError> {
        // Unknown identities start fresh implicitly; no command treats a
        // missing user row as an error.
        let _ = self.users.get_or_create(from).await?;

        match command {
            Command::Help => {
                self.send(from, HELP_MESSAGE).await;
                Ok(())
            }
            Command::DirectLookup {
                subject,
                year,
                number,
            } => self.handle_direct_lookup(from, &subject, year, number).await,
            Command::Subscribe => self.handle_subscribe(from).await,
            Command::PlanSelection(code) => self.handle_plan_selection(from, &code).await,
            Command::StartPractice { subject } => self.handle_start_practice(from, subject).await,
            Command::StartMock => self.handle_start_mock(from).await,
            Command::NovelTutor => self.handle_novel_tutor(from).await,
            Command::SubmitAnswer { index, choice } => {
                self.handle_submit_answer(from, index, choice).await
            }
            Command::Status => self.handle_status(from).await,
            Command::CancelSubscription => self.handle_cancel(from).await,
            Command::Resume => self.handle_resume(from).await,
            Command::StayActive => self.handle_stay_active(from).await,
            Command::ExitSession => self.handle_exit_session(from).await,
            Command::StartOnboarding => self.handle_start_onboarding(from).await,
            Command::SelectSubject(subject) => self.handle_select_subject(from, &subject).await,
        }
    }

    // ── Question lookup ─────────────────────────────────────────────

    async fn handle_direct_lookup(
        &self,
        from: &PhoneNumber,
        subject: &str,
        year: u16,
        number: u32,
    ) -> Result<(), DomainError> {
        match self.questions.find(subject, year, number).await? {
            Some(q) => {
                let reply = format!(
                    "Q{} ({} {}): {}\n\nAnswer: {}",
                    number, subject, year, q.text, q.correct_answer
                );
                self.send(from, &reply).await;
            }
            None => {
                self.send(
                    from,
                    &format!(
                        "Sorry, I couldn't find {} {} q{} in the database.",
                        subject, year, number
                    ),
                )
                .await;
            }
        }
        Ok(())
    }

    // ── Subscription flows ──────────────────────────────────────────

    async fn handle_subscribe(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        let user = self.users.get_or_create(from).await?;
        if user.has_active_subscription(Timestamp::now()) {
            self.send(
                from,
                "You already have an active subscription! Enjoy your premium features.",
            )
            .await;
            return Ok(());
        }

        self.send_plan_menu(from).await;

        let session = Session::new(from.clone(), SessionMode::AwaitingPlanSelection);
        self.sessions.put_conversation(&session).await?;
        Ok(())
    }

    async fn handle_plan_selection(
        &self,
        from: &PhoneNumber,
        code: &str,
    ) -> Result<(), DomainError> {
        match self.reconciler.initiate(from, code).await {
            Ok((plan, handle)) => {
                let message = format!(
                    "Complete your subscription\n\nPlan: {}\nAmount: {}\n\n\
                     Pay securely here:\n{}\n\nYour subscription activates \
                     automatically after payment.",
                    plan.display_name(),
                    plan.display_amount(),
                    handle.authorization_url
                );
                self.send(from, &message).await;
            }
            Err(BillingError::InvalidPlan(_)) => {
                self.send(
                    from,
                    "Invalid plan selected. Please reply with: 1_month, 3_months, or lifetime",
                )
                .await;
            }
            Err(BillingError::GatewayUnavailable(e)) => {
                tracing::warn!(phone = %from, error = %e, "payment link generation failed");
                self.send(
                    from,
                    "Failed to generate payment link. Please try again later or contact support.",
                )
                .await;
            }
            Err(e) => {
                return Err(DomainError::new(
                    crate::domain::foundation::ErrorCode::InternalError,
                    e.to_string(),
                ))
            }
        }
        Ok(())
    }

    async fn handle_status(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        let user = self.users.get_or_create(from).await?;
        let now = Timestamp::now();

        if !user.has_active_subscription(now) {
            self.send(
                from,
                "No active subscription.\n\nSend \"subscribe\" to get premium access.",
            )
            .await;
            return Ok(());
        }

        let plan = user
            .subscription_plan
            .map(|p| p.display_name())
            .unwrap_or("Premium");
        let expiry = user.entitlement_expires_at.expect("active implies expiry");
        let message = format!(
            "Your subscription status:\n\nPlan: {}\nExpires: {}\nDays left: {}",
            plan,
            expiry,
            expiry.days_from(&now)
        );
        self.send(from, &message).await;
        Ok(())
    }

    async fn handle_cancel(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        let user = self.users.get_or_create(from).await?;
        if user.subscription_status != crate::domain::user::SubscriptionStatus::Active {
            self.send(from, "You do not have an active subscription to cancel.")
                .await;
            return Ok(());
        }

        // Gateway disable is best effort; local deactivation proceeds
        // regardless.
        if let Some(code) = &user.subscription_code {
            if let Err(e) = self.gateway.disable_subscription(code).await {
                tracing::warn!(phone = %from, error = %e, "gateway subscription disable failed");
            }
        }

        self.users.deactivate(from, "User cancelled").await?;
        self.send(
            from,
            "Your subscription has been cancelled.\n\nWe hope to see you again soon!",
        )
        .await;
        Ok(())
    }

    // ── Exam flows ──────────────────────────────────────────────────

    async fn handle_start_practice(
        &self,
        from: &PhoneNumber,
        subject: Option<String>,
    ) -> Result<(), DomainError> {
        let Some(subject) = subject else {
            self.send_practice_menu(from).await;
            return Ok(());
        };

        let questions = self
            .questions
            .practice_set(&subject, PRACTICE_QUESTION_COUNT)
            .await?;

        let session = match ExamSession::start(
            ExamKind::Practice,
            Some(subject.clone()),
            questions,
            Timestamp::now(),
        ) {
            Ok(session) => session,
            Err(ExamError::EmptyQuestionSet) => {
                self.send(
                    from,
                    &format!("No {} questions are available yet. Try another subject.", subject),
                )
                .await;
                return Ok(());
            }
            Err(e) => {
                return Err(DomainError::new(
                    crate::domain::foundation::ErrorCode::InternalError,
                    e.to_string(),
                ))
            }
        };

        self.sessions.put_exam(from, &session).await?;
        self.send(
            from,
            &format!(
                "Practice started: {} ({} questions). Answer with the buttons below.",
                subject,
                session.questions.len()
            ),
        )
        .await;
        self.present_current_question(from, &session).await;
        Ok(())
    }

    async fn handle_start_mock(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        let user = self.users.get_or_create(from).await?;
        if !user.has_active_subscription(Timestamp::now()) {
            self.send(
                from,
                "Full mock exams are a premium feature!\n\nWould you like to subscribe now?",
            )
            .await;
            self.send_plan_menu(from).await;
            return Ok(());
        }

        let questions = self.questions.mock_set().await?;
        let session =
            match ExamSession::start(ExamKind::Mock, None, questions, Timestamp::now()) {
                Ok(session) => session,
                Err(ExamError::EmptyQuestionSet) => {
                    self.send(from, "The mock exam bank is empty right now. Try again later.")
                        .await;
                    return Ok(());
                }
                Err(e) => {
                    return Err(DomainError::new(
                        crate::domain::foundation::ErrorCode::InternalError,
                        e.to_string(),
                    ))
                }
            };

        self.sessions.put_exam(from, &session).await?;
        self.send(
            from,
            &format!(
                "Mock exam started: {} questions, {} minutes. The clock is running!",
                session.questions.len(),
                MOCK_DURATION_MINUTES
            ),
        )
        .await;
        self.present_current_question(from, &session).await;
        Ok(())
    }

    async fn handle_novel_tutor(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        let user = self.users.get_or_create(from).await?;
        if !user.has_active_subscription(Timestamp::now()) {
            self.send(
                from,
                "The novel tutor is a premium feature!\n\nWould you like to subscribe now?",
            )
            .await;
            self.send_plan_menu(from).await;
            return Ok(());
        }

        let questions = self.questions.novel_set().await?;
        let session = match ExamSession::start(
            ExamKind::Practice,
            Some("novel".to_string()),
            questions,
            Timestamp::now(),
        ) {
            Ok(session) => session,
            Err(ExamError::EmptyQuestionSet) => {
                self.send(from, "Novel tutor material is being prepared. Check back soon!")
                    .await;
                return Ok(());
            }
            Err(e) => {
                return Err(DomainError::new(
                    crate::domain::foundation::ErrorCode::InternalError,
                    e.to_string(),
                ))
            }
        };

        self.sessions.put_exam(from, &session).await?;
        self.send(from, "Novel tutor: \"The Lekki Headmaster\". Let's begin!")
            .await;
        self.present_current_question(from, &session).await;
        Ok(())
    }

    async fn handle_submit_answer(
        &self,
        from: &PhoneNumber,
        index: usize,
        choice: AnswerChoice,
    ) -> Result<(), DomainError> {
        // Mock sessions take priority: their deadline is hard.
        let (kind, session) = match self.live_session(from).await? {
            Some(found) => found,
            None => {
                self.send(
                    from,
                    "No active session. Send 'practice [subject]' or 'mock' to start one.",
                )
                .await;
                return Ok(());
            }
        };
        let mut session = session;
        let now = Timestamp::now();

        // A past-deadline submission still records the answer; the outcome
        // reports the timeout afterwards.
        match session.submit_answer(index, choice, now) {
            Ok(SubmitOutcome::Recorded) => {
                self.sessions.put_exam(from, &session).await?;
                self.present_current_question(from, &session).await;
            }
            Ok(SubmitOutcome::LastAnswered) => {
                return self.complete_session(from, session).await;
            }
            Ok(SubmitOutcome::TimedOut) => {
                // Answer was still recorded; persist before reporting.
                self.sessions.put_exam(from, &session).await?;
                return self.finalize_timed_out(from, session).await;
            }
            Err(ExamError::IndexOutOfRange { len, .. }) => {
                self.send(
                    from,
                    &format!("That question does not exist; this {} has {} questions.", kind, len),
                )
                .await;
            }
            Err(ExamError::OutOfOrderAnswer { expected, .. }) => {
                self.send(
                    from,
                    &format!("Please answer question {} first.", expected + 1),
                )
                .await;
            }
            Err(ExamError::EmptyQuestionSet) => unreachable!("live sessions have questions"),
        }
        Ok(())
    }

    async fn handle_resume(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        // Mock first; a timed-out mock is reported as such, never silently
        // dropped, so the user sees the "time's up" transition.
        if let Some(session) = self.sessions.get_exam(from, ExamKind::Mock).await? {
            if session.status_at(Timestamp::now()) == ExamStatus::TimedOut {
                return self.finalize_timed_out(from, session).await;
            }
            self.sessions.put_exam(from, &session).await?;
            self.send(from, "Resuming your mock exam. The clock never stopped!")
                .await;
            self.present_current_question(from, &session).await;
            return Ok(());
        }

        if let Some(session) = self.sessions.get_exam(from, ExamKind::Practice).await? {
            self.sessions.put_exam(from, &session).await?;
            self.send(from, "Resuming your practice session.").await;
            self.present_current_question(from, &session).await;
            return Ok(());
        }

        self.send(
            from,
            "No session to resume. Send 'practice [subject]' or 'mock' to start one.",
        )
        .await;
        Ok(())
    }

    async fn handle_stay_active(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        let mut refreshed = false;
        for kind in [ExamKind::Mock, ExamKind::Practice] {
            if let Some(session) = self.sessions.get_exam(from, kind).await? {
                self.sessions.put_exam(from, &session).await?;
                refreshed = true;
            }
        }
        if refreshed {
            self.send(from, "Session extended. Keep going!").await;
        } else {
            self.send(from, "No active session to extend.").await;
        }
        Ok(())
    }

    async fn handle_exit_session(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        self.sessions.delete_exam(from, ExamKind::Mock).await?;
        self.sessions.delete_exam(from, ExamKind::Practice).await?;
        self.send(from, "Session closed. Send 'resume' anytime you start a new one.")
            .await;
        Ok(())
    }

    // ── Onboarding ──────────────────────────────────────────────────

    async fn handle_start_onboarding(&self, from: &PhoneNumber) -> Result<(), DomainError> {
        let session = Session::new(
            from.clone(),
            SessionMode::Onboarding {
                step: OnboardingStep::SelectingSubjects,
                selected_subjects: Vec::new(),
            },
        );
        self.sessions.put_conversation(&session).await?;
        self.send_subject_menu(from, 0).await;
        Ok(())
    }

    async fn handle_select_subject(
        &self,
        from: &PhoneNumber,
        subject: &str,
    ) -> Result<(), DomainError> {
        let Some(session) = self.sessions.get_conversation(from).await? else {
            self.send(from, HELP_MESSAGE).await;
            return Ok(());
        };

        let SessionMode::Onboarding {
            mut selected_subjects,
            ..
        } = session.mode.clone()
        else {
            self.send(from, HELP_MESSAGE).await;
            return Ok(());
        };

        if !selected_subjects.iter().any(|s| s == subject) {
            selected_subjects.push(subject.to_string());
        }

        if selected_subjects.len() >= 4 {
            let updated = session.with_mode(SessionMode::Onboarding {
                step: OnboardingStep::Completed,
                selected_subjects: selected_subjects.clone(),
            });
            self.sessions.put_conversation(&updated).await?;
            self.send(
                from,
                &format!(
                    "Setup complete! Your subjects: {}.\n\nSend 'practice {}' to begin.",
                    selected_subjects.join(", "),
                    selected_subjects[0]
                ),
            )
            .await;
        } else {
            let count = selected_subjects.len();
            let updated = session.with_mode(SessionMode::Onboarding {
                step: OnboardingStep::SelectingSubjects,
                selected_subjects,
            });
            self.sessions.put_conversation(&updated).await?;
            self.send_subject_menu(from, count).await;
        }
        Ok(())
    }

    // ── Session completion ──────────────────────────────────────────

    async fn complete_session(
        &self,
        from: &PhoneNumber,
        mut session: ExamSession,
    ) -> Result<(), DomainError> {
        session.mark_completed();
        let score = session.grade();
        let user = self.users.get_or_create(from).await?;

        match session.kind {
            ExamKind::Practice => {
                let subject = session.subject.as_deref().unwrap_or("general");
                self.results
                    .record_practice(user.id, subject, score)
                    .await?;
            }
            ExamKind::Mock => {
                self.results.record_mock(user.id, score).await?;
            }
        }

        self.sessions.delete_exam(from, session.kind).await?;
        self.send(from, &score_message(&session, score)).await;
        Ok(())
    }

    async fn finalize_timed_out(
        &self,
        from: &PhoneNumber,
        session: ExamSession,
    ) -> Result<(), DomainError> {
        let score = session.grade();
        let user = self.users.get_or_create(from).await?;
        self.results.record_mock(user.id, score).await?;
        self.sessions.delete_exam(from, session.kind).await?;

        self.send(
            from,
            &format!(
                "Time's up! Your mock exam has ended.\n\nScore: {}%\nCorrect: {}/{}",
                score.percentage, score.correct, score.total
            ),
        )
        .await;
        Ok(())
    }

    /// Highest-priority live exam session: mock before practice.
    async fn live_session(
        &self,
        from: &PhoneNumber,
    ) -> Result<Option<(ExamKind, ExamSession)>, DomainError> {
        if let Some(session) = self.sessions.get_exam(from, ExamKind::Mock).await? {
            return Ok(Some((ExamKind::Mock, session)));
        }
        if let Some(session) = self.sessions.get_exam(from, ExamKind::Practice).await? {
            return Ok(Some((ExamKind::Practice, session)));
        }
        Ok(None)
    }

    // ── Outbound helpers ────────────────────────────────────────────

    /// Best-effort send; delivery failures never fail the triggering flow.
    async fn send(&self, to: &PhoneNumber, body: &str) {
        if let Err(e) = self.notifier.send_text(to, body).await {
            tracing::warn!(phone = %to, error = %e, "outbound message failed");
        }
    }

    async fn present_current_question(&self, to: &PhoneNumber, session: &ExamSession) {
        let Some(question) = session.current_question() else {
            return;
        };
        let index = session.current_index;
        let header = format!("Question {}/{}", index + 1, session.questions.len());
        let buttons = vec![
            ReplyButton::new(format!("ans_a_{}", index), format!("A: {}", question.option_a)),
            ReplyButton::new(format!("ans_b_{}", index), format!("B: {}", question.option_b)),
            ReplyButton::new(format!("ans_c_{}", index), format!("C: {}", question.option_c)),
            ReplyButton::new(format!("ans_d_{}", index), format!("D: {}", question.option_d)),
        ];
        if let Err(e) = self
            .notifier
            .send_buttons(to, &header, &question.text, "Select your answer", buttons)
            .await
        {
            tracing::warn!(phone = %to, error = %e, "question presentation failed");
        }
    }

    async fn send_plan_menu(&self, to: &PhoneNumber) {
        let body = "Choose your premium plan:\n\n\u{20a6}500/month - Monthly Access\n\
                    \u{20a6}1,300 - 3 Months Access\n\u{20a6}5,000 - Lifetime Access";
        let buttons = vec![
            ReplyButton::new("premium_1-month", "\u{20a6}500 - Monthly"),
            ReplyButton::new("premium_3-months", "\u{20a6}1,300 - 3 Months"),
            ReplyButton::new("premium_lifetime", "\u{20a6}5,000 - Lifetime"),
        ];
        if let Err(e) = self
            .notifier
            .send_buttons(to, "Unlock Premium", body, "Pick a plan", buttons)
            .await
        {
            tracing::warn!(phone = %to, error = %e, "plan menu failed");
        }
    }

    async fn send_practice_menu(&self, to: &PhoneNumber) {
        let sections = vec![ListSection {
            title: "Subjects".to_string(),
            rows: vec![
                ListRow::new("practice_english", "English"),
                ListRow::new("practice_math", "Mathematics"),
                ListRow::new("practice_physics", "Physics"),
                ListRow::new("practice_chemistry", "Chemistry"),
                ListRow::new("practice_biology", "Biology"),
                ListRow::new("practice_govt", "Government"),
            ],
        }];
        if let Err(e) = self
            .notifier
            .send_list(
                to,
                "Practice Mode",
                "Select a subject to practice:",
                "Choose one to continue",
                sections,
            )
            .await
        {
            tracing::warn!(phone = %to, error = %e, "practice menu failed");
        }
    }

    async fn send_subject_menu(&self, to: &PhoneNumber, selected: usize) {
        let sections = vec![
            ListSection {
                title: "Required Subject".to_string(),
                rows: vec![ListRow::new("subject_english", "English (Required)")],
            },
            ListSection {
                title: "Electives (Select 3)".to_string(),
                rows: vec![
                    ListRow::new("subject_math", "Mathematics"),
                    ListRow::new("subject_physics", "Physics"),
                    ListRow::new("subject_chemistry", "Chemistry"),
                    ListRow::new("subject_biology", "Biology"),
                    ListRow::new("subject_govt", "Government"),
                ],
            },
        ];
        if let Err(e) = self
            .notifier
            .send_list(
                to,
                "Select 4 Subjects",
                &format!(
                    "You must select English + 3 other subjects. Current selection: {}/4",
                    selected
                ),
                "Tap to select subjects",
                sections,
            )
            .await
        {
            tracing::warn!(phone = %to, error = %e, "subject menu failed");
        }
    }
}

fn score_message(session: &ExamSession, score: ScoreSummary) -> String {
    match session.kind {
        ExamKind::Practice => format!(
            "Practice complete!\n\nScore: {}%\nCorrect: {}/{}\n\nSend 'practice {}' to go again.",
            score.percentage,
            score.correct,
            score.total,
            session.subject.as_deref().unwrap_or("english")
        ),
        ExamKind::Mock => {
            let grade = if score.percentage >= 80 {
                "Excellent!"
            } else if score.percentage >= 60 {
                "Good"
            } else {
                "Keep practicing"
            };
            format!(
                "{}\n\nMock exam results\nScore: {}%\nCorrect: {}/{}\n\n\
                 Great effort! Review your mistakes and practice more.",
                grade, score.percentage, score.correct, score.total
            )
        }
    }
}
