use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::controller::SessionController;
use super::events::SessionEvent;

/// Single task that owns the controller and applies events in arrival order.
pub struct SessionRuntime {
    controller: SessionController,
    events: UnboundedReceiver<SessionEvent>,
}

impl SessionRuntime {
    #[must_use]
    pub fn new(controller: SessionController, events: UnboundedReceiver<SessionEvent>) -> Self {
        Self { controller, events }
    }

    /// Process events until `Shutdown` arrives.
    ///
    /// Invalid transitions are logged and skipped; they never stop the loop.
    pub async fn run(mut self) -> SessionController {
        while let Some(event) = self.events.recv().await {
            let is_shutdown = matches!(event, SessionEvent::Shutdown);
            if let Err(err) = self.controller.handle(event).await {
                debug!(error = %err, "ignored session event");
            }
            if is_shutdown {
                break;
            }
        }
        info!(state = ?self.controller.state(), "session stopped");
        self.controller
    }

    pub fn spawn(self) -> JoinHandle<SessionController> {
        tokio::spawn(self.run())
    }
}
