//! Deterministic doubles for driving a session without a UI, network or timers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::presentation::{AlertModel, PresentationGateway};
use crate::questions::QuestionSource;
use crate::session::{QuizStep, ScheduledTask, Scheduler, SessionEvent};

/// One call made on a `PresentationGateway`.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCall {
    ShowLoading,
    HideLoading,
    DisableInput,
    EnableInput,
    RenderQuestion(QuizStep),
    Highlight(bool),
    ClearHighlight,
    Alert {
        title: String,
        message: String,
        button_text: String,
    },
}

/// Records every presentation call; alerts are kept so tests can dismiss them.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    calls: Mutex<Vec<PresentationCall>>,
    alerts: Mutex<Vec<AlertModel>>,
}

impl RecordingPresentation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<PresentationCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded calls.
    pub fn take_calls(&self) -> Vec<PresentationCall> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Oldest undismissed alert, if any.
    pub fn take_alert(&self) -> Option<AlertModel> {
        let mut alerts = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        if alerts.is_empty() {
            None
        } else {
            Some(alerts.remove(0))
        }
    }

    #[must_use]
    pub fn last_step(&self) -> Option<QuizStep> {
        self.calls().into_iter().rev().find_map(|call| match call {
            PresentationCall::RenderQuestion(step) => Some(step),
            _ => None,
        })
    }

    #[must_use]
    pub fn count(&self, wanted: &PresentationCall) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    fn push(&self, call: PresentationCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl PresentationGateway for RecordingPresentation {
    fn show_loading(&self) {
        self.push(PresentationCall::ShowLoading);
    }

    fn hide_loading(&self) {
        self.push(PresentationCall::HideLoading);
    }

    fn disable_input(&self) {
        self.push(PresentationCall::DisableInput);
    }

    fn enable_input(&self) {
        self.push(PresentationCall::EnableInput);
    }

    fn render_question(&self, step: QuizStep) {
        self.push(PresentationCall::RenderQuestion(step));
    }

    fn render_answer_highlight(&self, is_correct: bool) {
        self.push(PresentationCall::Highlight(is_correct));
    }

    fn clear_highlight(&self) {
        self.push(PresentationCall::ClearHighlight);
    }

    fn present_alert(&self, alert: AlertModel) {
        self.push(PresentationCall::Alert {
            title: alert.title.clone(),
            message: alert.message.clone(),
            button_text: alert.button_text.clone(),
        });
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert);
    }
}

/// Counts calls and delivers nothing; tests feed results to the controller directly.
#[derive(Debug, Default)]
pub struct ScriptedQuestionSource {
    loads: AtomicUsize,
    requests: AtomicUsize,
}

impl ScriptedQuestionSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl QuestionSource for ScriptedQuestionSource {
    fn load_data(&self) {
        self.loads.fetch_add(1, Ordering::SeqCst);
    }

    fn request_next(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

struct Pending {
    delay: Duration,
    event: SessionEvent,
    task: ScheduledTask,
}

/// Holds scheduled events until the test releases them.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<Pending>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every event that was not cancelled, oldest first.
    pub fn take_due(&self) -> Vec<SessionEvent> {
        let pending =
            std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
        pending
            .into_iter()
            .filter(|entry| !entry.task.is_cancelled())
            .map(|entry| entry.event)
            .collect()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| !entry.task.is_cancelled())
            .count()
    }

    #[must_use]
    pub fn last_delay(&self) -> Option<Duration> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|entry| entry.delay)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, event: SessionEvent) -> ScheduledTask {
        let task = ScheduledTask::new(None);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Pending {
                delay,
                event,
                task: task.clone(),
            });
        task
    }
}
