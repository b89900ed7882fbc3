use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::AbortHandle;

use super::events::{SessionEvent, SessionHandle};

/// Handle to a delayed event that can still be called off.
#[derive(Clone, Debug)]
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl ScheduledTask {
    #[must_use]
    pub fn new(abort: Option<AbortHandle>) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            abort,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Delivers an event back into the session after a delay.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, event: SessionEvent) -> ScheduledTask;
}

/// Timer-backed scheduler feeding the session's own event queue.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: SessionHandle,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, event: SessionEvent) -> ScheduledTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = self.handle.clone();
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                handle.send(event);
            }
        });
        ScheduledTask {
            cancelled,
            abort: Some(join.abort_handle()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (handle, mut rx) = SessionHandle::channel();
        let scheduler = TokioScheduler::new(handle);
        let task = scheduler.schedule(
            Duration::from_secs(1),
            SessionEvent::AdvanceDue { ticket: 4 },
        );

        assert!(rx.try_recv().is_err());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(matches!(
            rx.try_recv(),
            Ok(SessionEvent::AdvanceDue { ticket: 4 })
        ));
        assert!(!task.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_fires() {
        let (handle, mut rx) = SessionHandle::channel();
        let scheduler = TokioScheduler::new(handle);
        let task = scheduler.schedule(
            Duration::from_secs(1),
            SessionEvent::AdvanceDue { ticket: 1 },
        );
        task.cancel();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(task.is_cancelled());
        assert!(rx.try_recv().is_err());
    }
}
