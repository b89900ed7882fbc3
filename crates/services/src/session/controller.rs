use std::sync::Arc;

use quiz_core::model::{Question, RoundProgress};
use tracing::{debug, info, warn};

use super::events::{SessionEvent, SessionHandle};
use super::scheduler::{ScheduledTask, Scheduler};
use super::state::SessionState;
use super::view::{
    LOAD_ERROR_TITLE, LifetimeStats, PLAY_AGAIN_BUTTON, QuizStep, RETRY_BUTTON, RoundSummary,
};
use crate::config::QuizConfig;
use crate::error::SessionError;
use crate::presentation::{AlertModel, PresentationGateway};
use crate::questions::QuestionSource;
use crate::statistics::StatisticsService;

/// Drives one quiz session: loading, a round of questions, and the result.
///
/// Not thread-safe by itself; `SessionRuntime` owns it and feeds it events
/// one at a time.
pub struct SessionController {
    config: QuizConfig,
    state: SessionState,
    progress: RoundProgress,
    current_question: Option<Question>,
    pending_advance: Option<(u64, ScheduledTask)>,
    next_ticket: u64,
    source: Arc<dyn QuestionSource>,
    presentation: Arc<dyn PresentationGateway>,
    statistics: Arc<StatisticsService>,
    scheduler: Arc<dyn Scheduler>,
    handle: SessionHandle,
}

impl SessionController {
    #[must_use]
    pub fn new(
        config: QuizConfig,
        source: Arc<dyn QuestionSource>,
        presentation: Arc<dyn PresentationGateway>,
        statistics: Arc<StatisticsService>,
        scheduler: Arc<dyn Scheduler>,
        handle: SessionHandle,
    ) -> Self {
        Self {
            config,
            state: SessionState::AwaitingQuestion,
            progress: RoundProgress::new(),
            current_question: None,
            pending_advance: None,
            next_ticket: 0,
            source,
            presentation,
            statistics,
            scheduler,
            handle,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn progress(&self) -> RoundProgress {
        self.progress
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` when the event does not apply
    /// to the current state. The state is left untouched in that case.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::Load => self.load(),
            SessionEvent::DataLoaded => self.on_data_loaded(),
            SessionEvent::DataLoadFailed { message } => self.on_data_load_failed(message),
            SessionEvent::Start => self.start(),
            SessionEvent::QuestionReceived(question) => self.on_question_received(question),
            SessionEvent::Answer { is_yes } => self.answer(is_yes),
            SessionEvent::AdvanceDue { ticket } => self.advance(ticket).await,
            SessionEvent::Shutdown => {
                self.cancel_pending_advance();
                Ok(())
            }
        }
    }

    /// Prepare the question pool.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if a load is already running.
    pub fn load(&mut self) -> Result<(), SessionError> {
        self.ensure_not("load", &[SessionState::Loading])?;
        self.unlock_answer();
        self.current_question = None;
        self.state = SessionState::Loading;
        self.presentation.show_loading();
        self.source.load_data();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless loading.
    pub fn on_data_loaded(&mut self) -> Result<(), SessionError> {
        self.ensure_state("data_loaded", SessionState::Loading)?;
        self.presentation.hide_loading();
        self.begin_round();
        Ok(())
    }

    /// Show a retryable error; dismissing it reloads the pool.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless loading.
    pub fn on_data_load_failed(&mut self, message: String) -> Result<(), SessionError> {
        self.ensure_state("data_load_failed", SessionState::Loading)?;
        self.presentation.hide_loading();
        self.state = SessionState::LoadFailed;
        warn!(%message, "question pool failed to load");

        let handle = self.handle.clone();
        self.presentation.present_alert(AlertModel::new(
            LOAD_ERROR_TITLE,
            message,
            RETRY_BUTTON,
            move || {
                handle.load();
            },
        ));
        Ok(())
    }

    /// Start a new round, abandoning any round in progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` while the pool is not loaded.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if matches!(self.state, SessionState::Loading | SessionState::LoadFailed) {
            return Err(self.invalid("start"));
        }
        self.begin_round();
        Ok(())
    }

    /// `None` means the source had nothing to offer and is ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless awaiting a question.
    pub fn on_question_received(
        &mut self,
        question: Option<Question>,
    ) -> Result<(), SessionError> {
        self.ensure_state("question_received", SessionState::AwaitingQuestion)?;
        let Some(question) = question else {
            debug!("no question available");
            return Ok(());
        };

        let step =
            QuizStep::from_question(&question, &self.progress, self.config.questions_per_round());
        self.current_question = Some(question);
        self.state = SessionState::QuestionShown;
        self.presentation.render_question(step);
        Ok(())
    }

    /// Score the shown question and schedule the advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a question is shown.
    pub fn answer(&mut self, is_yes: bool) -> Result<(), SessionError> {
        if !self.state.accepts_answer() {
            return Err(self.invalid("answer"));
        }
        let Some(question) = &self.current_question else {
            return Err(self.invalid("answer"));
        };
        let is_correct = question.is_correct(is_yes);

        self.state = SessionState::AnswerLocked;
        self.presentation.disable_input();
        self.progress.record_answer(is_correct);
        self.presentation.render_answer_highlight(is_correct);

        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        let task = self
            .scheduler
            .schedule(self.config.answer_delay(), SessionEvent::AdvanceDue { ticket });
        self.pending_advance = Some((ticket, task));
        Ok(())
    }

    /// Move past the answered question once its delay elapsed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` for a stale ticket or when no
    /// answer is pending.
    pub async fn advance(&mut self, ticket: u64) -> Result<(), SessionError> {
        self.ensure_state("advance", SessionState::AnswerLocked)?;
        match &self.pending_advance {
            Some((pending, _)) if *pending == ticket => {}
            _ => return Err(self.invalid("advance")),
        }
        self.pending_advance = None;

        self.presentation.clear_highlight();
        self.presentation.enable_input();
        self.current_question = None;

        let total = self.config.questions_per_round();
        if self.progress.is_last(total) {
            self.finish_round(total).await;
        } else {
            self.progress.advance();
            self.state = SessionState::AwaitingQuestion;
            self.source.request_next();
        }
        Ok(())
    }

    async fn finish_round(&mut self, total: u32) {
        let correct = self.progress.correct_count();
        let lifetime = match self.statistics.record_round(correct, total).await {
            Ok(record) => Some(LifetimeStats::from_record(&record, total)),
            Err(err) => {
                warn!(error = %err, "failed to record round statistics");
                None
            }
        };
        let summary = RoundSummary {
            correct,
            total,
            lifetime,
        };
        info!(correct, total, "round complete");

        self.state = SessionState::RoundComplete;
        let handle = self.handle.clone();
        self.presentation.present_alert(AlertModel::new(
            summary.title(),
            summary.message(),
            PLAY_AGAIN_BUTTON,
            move || {
                handle.start();
            },
        ));
    }

    fn begin_round(&mut self) {
        self.unlock_answer();
        self.progress.reset();
        self.current_question = None;
        self.state = SessionState::AwaitingQuestion;
        self.source.request_next();
    }

    /// Drop a pending advance and undo the answer lock it left on screen.
    fn unlock_answer(&mut self) {
        if self.cancel_pending_advance() {
            self.presentation.clear_highlight();
            self.presentation.enable_input();
        }
    }

    /// Returns whether an advance was pending.
    fn cancel_pending_advance(&mut self) -> bool {
        match self.pending_advance.take() {
            Some((ticket, task)) => {
                debug!(ticket, "cancelling pending advance");
                task.cancel();
                true
            }
            None => false,
        }
    }

    fn ensure_state(
        &self,
        event: &'static str,
        wanted: SessionState,
    ) -> Result<(), SessionError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(self.invalid(event))
        }
    }

    fn ensure_not(
        &self,
        event: &'static str,
        rejected: &[SessionState],
    ) -> Result<(), SessionError> {
        if rejected.contains(&self.state) {
            Err(self.invalid(event))
        } else {
            Ok(())
        }
    }

    fn invalid(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            event,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Clock;
    use crate::test_harness::{
        ManualScheduler, PresentationCall, RecordingPresentation, ScriptedQuestionSource,
    };
    use quiz_core::model::QuestionImage;
    use quiz_core::time::fixed_now;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        controller: SessionController,
        source: Arc<ScriptedQuestionSource>,
        presentation: Arc<RecordingPresentation>,
        scheduler: Arc<ManualScheduler>,
        statistics: Arc<StatisticsService>,
        rx: UnboundedReceiver<SessionEvent>,
    }

    fn fixture(questions_per_round: u32) -> Fixture {
        let config = QuizConfig::default().with_questions_per_round(questions_per_round);
        let source = Arc::new(ScriptedQuestionSource::new());
        let presentation = Arc::new(RecordingPresentation::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let statistics = Arc::new(StatisticsService::in_memory(
            Clock::fixed(fixed_now()),
            questions_per_round,
        ));
        let (handle, rx) = SessionHandle::channel();
        let controller = SessionController::new(
            config,
            Arc::clone(&source) as Arc<dyn QuestionSource>,
            Arc::clone(&presentation) as Arc<dyn PresentationGateway>,
            Arc::clone(&statistics),
            Arc::clone(&scheduler) as Arc<dyn Scheduler>,
            handle,
        );
        Fixture {
            controller,
            source,
            presentation,
            scheduler,
            statistics,
            rx,
        }
    }

    fn question(correct_answer: bool) -> Question {
        Question::new(QuestionImage::Named("Old".into()), "Question Text", correct_answer)
    }

    impl Fixture {
        async fn fire_due(&mut self) {
            for event in self.scheduler.take_due() {
                self.controller.handle(event).await.unwrap();
            }
        }

        /// Deliver a question, answer it, and let the delay elapse.
        async fn play(&mut self, correct_answer: bool, is_yes: bool) {
            self.controller
                .on_question_received(Some(question(correct_answer)))
                .unwrap();
            self.controller.answer(is_yes).unwrap();
            self.fire_due().await;
        }
    }

    #[tokio::test]
    async fn starts_awaiting_question() {
        let fx = fixture(10);
        assert_eq!(fx.controller.state(), SessionState::AwaitingQuestion);
        assert_eq!(fx.controller.progress(), RoundProgress::new());
        assert!(fx.controller.current_question().is_none());
    }

    #[tokio::test]
    async fn first_question_renders_one_based_counter() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        assert_eq!(fx.source.requests(), 1);

        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();

        assert_eq!(fx.controller.state(), SessionState::QuestionShown);
        let step = fx.presentation.last_step().unwrap();
        assert_eq!(step.question, "Question Text");
        assert_eq!(step.question_number, "1/10");
    }

    #[tokio::test]
    async fn correct_answer_highlights_and_locks() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();
        fx.presentation.take_calls();

        fx.controller.answer(true).unwrap();

        assert_eq!(fx.controller.state(), SessionState::AnswerLocked);
        assert_eq!(fx.controller.progress().correct_count(), 1);
        assert_eq!(
            fx.presentation.take_calls(),
            vec![PresentationCall::DisableInput, PresentationCall::Highlight(true)]
        );
        assert_eq!(fx.scheduler.last_delay(), Some(Duration::from_secs(1)));

        let err = fx.controller.answer(false).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                event: "answer",
                state: SessionState::AnswerLocked
            }
        ));
        assert_eq!(fx.controller.progress().correct_count(), 1);
    }

    #[tokio::test]
    async fn wrong_answer_does_not_score() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();
        fx.controller.answer(false).unwrap();

        assert_eq!(fx.controller.progress().correct_count(), 0);
        assert_eq!(fx.presentation.count(&PresentationCall::Highlight(false)), 1);
    }

    #[tokio::test]
    async fn advance_requests_next_question() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.play(false, false).await;

        assert_eq!(fx.controller.state(), SessionState::AwaitingQuestion);
        assert_eq!(fx.controller.progress().index(), 1);
        assert_eq!(fx.source.requests(), 2);
        assert!(fx.controller.current_question().is_none());
        assert_eq!(fx.presentation.count(&PresentationCall::ClearHighlight), 1);
        assert_eq!(fx.presentation.count(&PresentationCall::EnableInput), 1);

        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();
        assert_eq!(fx.presentation.last_step().unwrap().question_number, "2/10");
    }

    #[tokio::test]
    async fn empty_delivery_is_ignored() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.presentation.take_calls();

        fx.controller.on_question_received(None).unwrap();

        assert_eq!(fx.controller.state(), SessionState::AwaitingQuestion);
        assert!(fx.presentation.calls().is_empty());
    }

    #[tokio::test]
    async fn question_outside_awaiting_is_rejected() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();

        let err = fx
            .controller
            .on_question_received(Some(question(false)))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert!(fx.controller.current_question().unwrap().correct_answer());
    }

    #[tokio::test]
    async fn last_answer_completes_round_and_records_statistics() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        for i in 0..10 {
            // Seven correct answers out of ten.
            fx.play(true, i < 7).await;
        }

        assert_eq!(fx.controller.state(), SessionState::RoundComplete);
        assert_eq!(fx.statistics.games_played().await.unwrap(), 1);

        let alert = fx.presentation.take_alert().unwrap();
        assert_eq!(alert.title, "This round is over!");
        assert_eq!(alert.button_text, "Play again");
        assert_eq!(
            alert.message,
            "Your result: 7/10\n\
             Quizzes played: 1\n\
             Record: 7/10 (14.11.23 22:13)\n\
             Average accuracy: 70.00%"
        );
    }

    #[tokio::test]
    async fn second_round_keeps_better_record() {
        let mut fx = fixture(10);
        fx.statistics.record_round(7, 10).await.unwrap();

        fx.controller.start().unwrap();
        for i in 0..10 {
            fx.play(false, i >= 5).await;
        }

        let alert = fx.presentation.take_alert().unwrap();
        assert_eq!(
            alert.message,
            "Your result: 5/10\n\
             Quizzes played: 2\n\
             Record: 7/10 (14.11.23 22:13)\n\
             Average accuracy: 60.00%"
        );
    }

    #[tokio::test]
    async fn play_again_starts_fresh_round() {
        let mut fx = fixture(3);
        fx.controller.start().unwrap();
        for _ in 0..3 {
            fx.play(true, true).await;
        }
        assert_eq!(fx.controller.state(), SessionState::RoundComplete);

        let mut alert = fx.presentation.take_alert().unwrap();
        assert!(alert.message.starts_with("Your result: 3/3"));
        alert.dismiss();
        let event = fx.rx.try_recv().unwrap();
        assert!(matches!(event, SessionEvent::Start));
        fx.controller.handle(event).await.unwrap();

        assert_eq!(fx.controller.state(), SessionState::AwaitingQuestion);
        assert_eq!(fx.controller.progress(), RoundProgress::new());
        assert_eq!(fx.source.requests(), 4);
    }

    #[tokio::test]
    async fn restart_cancels_pending_advance() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();
        fx.controller.answer(true).unwrap();
        assert_eq!(fx.scheduler.pending_len(), 1);
        fx.presentation.take_calls();

        fx.controller.start().unwrap();

        assert_eq!(fx.scheduler.pending_len(), 0);
        assert_eq!(fx.controller.state(), SessionState::AwaitingQuestion);
        assert_eq!(fx.controller.progress(), RoundProgress::new());
        assert_eq!(
            fx.presentation.take_calls(),
            vec![PresentationCall::ClearHighlight, PresentationCall::EnableInput]
        );
        assert!(fx.scheduler.take_due().is_empty());
    }

    #[tokio::test]
    async fn stale_ticket_is_ignored() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();
        fx.controller.answer(true).unwrap();

        let err = fx.controller.advance(42).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                event: "advance",
                ..
            }
        ));
        assert_eq!(fx.controller.state(), SessionState::AnswerLocked);
        assert_eq!(fx.scheduler.pending_len(), 1);
    }

    #[tokio::test]
    async fn load_success_starts_round() {
        let mut fx = fixture(10);
        fx.controller.handle(SessionEvent::Load).await.unwrap();
        assert_eq!(fx.controller.state(), SessionState::Loading);
        assert_eq!(fx.source.loads(), 1);
        assert_eq!(fx.source.requests(), 0);

        fx.controller.handle(SessionEvent::DataLoaded).await.unwrap();

        assert_eq!(fx.controller.state(), SessionState::AwaitingQuestion);
        assert_eq!(fx.source.requests(), 1);
        assert_eq!(
            fx.presentation.calls(),
            vec![PresentationCall::ShowLoading, PresentationCall::HideLoading]
        );
    }

    #[tokio::test]
    async fn load_failure_offers_retry() {
        let mut fx = fixture(10);
        fx.controller.load().unwrap();
        fx.controller
            .on_data_load_failed("Invalid API Key".into())
            .unwrap();

        assert_eq!(fx.controller.state(), SessionState::LoadFailed);
        assert!(fx.controller.start().is_err());

        let mut alert = fx.presentation.take_alert().unwrap();
        assert_eq!(alert.title, "Error");
        assert_eq!(alert.message, "Invalid API Key");
        assert_eq!(alert.button_text, "Try again");

        alert.dismiss();
        let event = fx.rx.try_recv().unwrap();
        assert!(matches!(event, SessionEvent::Load));
        fx.controller.handle(event).await.unwrap();
        assert_eq!(fx.controller.state(), SessionState::Loading);
        assert_eq!(fx.source.loads(), 2);
    }

    #[tokio::test]
    async fn late_load_result_is_rejected() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        assert!(fx.controller.on_data_loaded().is_err());
        assert!(fx.controller.on_data_load_failed("late".into()).is_err());
        assert_eq!(fx.controller.state(), SessionState::AwaitingQuestion);
    }

    #[tokio::test]
    async fn reload_during_answer_lock_restores_input() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.controller
            .on_question_received(Some(question(true)))
            .unwrap();
        fx.controller.answer(true).unwrap();
        fx.presentation.take_calls();

        fx.controller.load().unwrap();
        assert_eq!(fx.scheduler.pending_len(), 0);
        assert_eq!(
            fx.presentation.take_calls(),
            vec![
                PresentationCall::ClearHighlight,
                PresentationCall::EnableInput,
                PresentationCall::ShowLoading,
            ]
        );

        fx.controller.on_data_loaded().unwrap();
        fx.controller
            .on_question_received(Some(question(false)))
            .unwrap();
        assert_eq!(fx.controller.progress(), RoundProgress::new());
        fx.controller.answer(false).unwrap();
        assert_eq!(fx.controller.progress().correct_count(), 1);
        assert_eq!(fx.scheduler.pending_len(), 1);
    }

    #[tokio::test]
    async fn reload_without_pending_answer_leaves_input_alone() {
        let mut fx = fixture(10);
        fx.controller.start().unwrap();
        fx.presentation.take_calls();

        fx.controller.load().unwrap();
        assert_eq!(fx.presentation.take_calls(), vec![PresentationCall::ShowLoading]);
    }

    #[tokio::test]
    async fn score_matches_correct_answers() {
        for questions_per_round in [1_u32, 2, 3, 7, 10] {
            for seed in 0..4_u32 {
                let mut fx = fixture(questions_per_round);
                fx.controller.start().unwrap();

                let mut expected = 0;
                for i in 0..questions_per_round {
                    // Vary both the expected answer and the given one per round.
                    let correct_answer = (i + seed) % 2 == 0;
                    let is_yes = (i * (seed + 1)) % 3 != 0;
                    if correct_answer == is_yes {
                        expected += 1;
                    }
                    fx.play(correct_answer, is_yes).await;
                }

                assert_eq!(fx.controller.state(), SessionState::RoundComplete);
                let snapshot = fx.statistics.snapshot().await.unwrap();
                assert_eq!(snapshot.cumulative_correct(), expected);
                let alert = fx.presentation.take_alert().unwrap();
                assert!(
                    alert
                        .message
                        .starts_with(&format!("Your result: {expected}/{questions_per_round}\n")),
                    "N={questions_per_round} seed={seed}: {}",
                    alert.message
                );
            }
        }
    }
}
