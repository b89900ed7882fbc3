//! Boundary between the session controller and whatever draws the quiz.

use std::fmt;

use crate::session::QuizStep;

/// Action run when the user dismisses an alert.
pub type DismissAction = Box<dyn FnOnce() + Send>;

/// Modal alert request: round results or a retryable error.
pub struct AlertModel {
    pub title: String,
    pub message: String,
    pub button_text: String,
    on_dismiss: Option<DismissAction>,
}

impl AlertModel {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        button_text: impl Into<String>,
        on_dismiss: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            button_text: button_text.into(),
            on_dismiss: Some(Box::new(on_dismiss)),
        }
    }

    /// Run the dismiss action. Calling it again does nothing.
    pub fn dismiss(&mut self) {
        if let Some(action) = self.on_dismiss.take() {
            action();
        }
    }
}

impl fmt::Debug for AlertModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertModel")
            .field("title", &self.title)
            .field("message", &self.message)
            .field("button_text", &self.button_text)
            .field("has_action", &self.on_dismiss.is_some())
            .finish()
    }
}

/// Implemented by the host UI.
///
/// All calls arrive from the session runtime task, in order. Implementations
/// must not call back into the controller synchronously; use the
/// `SessionHandle` instead.
pub trait PresentationGateway: Send + Sync {
    fn show_loading(&self);
    fn hide_loading(&self);
    fn disable_input(&self);
    fn enable_input(&self);
    fn render_question(&self, step: QuizStep);
    fn render_answer_highlight(&self, is_correct: bool);
    fn clear_highlight(&self);
    fn present_alert(&self, alert: AlertModel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dismiss_runs_action_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut alert = AlertModel::new("t", "m", "ok", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        alert.dismiss();
        alert.dismiss();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(format!("{alert:?}").contains("has_action: false"));
    }
}
