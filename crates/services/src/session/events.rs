use quiz_core::model::Question;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::FeedError;
use crate::questions::QuestionListener;

/// Everything that can happen to a session, in arrival order.
#[derive(Debug)]
pub enum SessionEvent {
    /// (Re)load the question pool.
    Load,
    DataLoaded,
    DataLoadFailed { message: String },
    /// Start a new round, abandoning the current one.
    Start,
    QuestionReceived(Option<Question>),
    Answer { is_yes: bool },
    /// The post-answer delay for `ticket` elapsed.
    AdvanceDue { ticket: u64 },
    Shutdown,
}

/// Cloneable sender side of a session's event queue.
///
/// Holding a handle does not keep the session alive; sends after the
/// runtime stopped are dropped.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an event. Returns false if the session is gone.
    pub fn send(&self, event: SessionEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!(event = ?err.0, "session closed, dropping event");
                false
            }
        }
    }

    pub fn load(&self) -> bool {
        self.send(SessionEvent::Load)
    }

    pub fn start(&self) -> bool {
        self.send(SessionEvent::Start)
    }

    pub fn answer_yes(&self) -> bool {
        self.send(SessionEvent::Answer { is_yes: true })
    }

    pub fn answer_no(&self) -> bool {
        self.send(SessionEvent::Answer { is_yes: false })
    }

    pub fn shutdown(&self) -> bool {
        self.send(SessionEvent::Shutdown)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl QuestionListener for SessionHandle {
    fn did_load_data(&self) {
        self.send(SessionEvent::DataLoaded);
    }

    fn did_fail_to_load_data(&self, error: FeedError) {
        self.send(SessionEvent::DataLoadFailed {
            message: error.to_string(),
        });
    }

    fn did_receive_question(&self, question: Option<Question>) {
        self.send(SessionEvent::QuestionReceived(question));
    }
}
