mod controller;
mod events;
mod runtime;
mod scheduler;
mod state;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::SessionController;
pub use events::{SessionEvent, SessionHandle};
pub use runtime::SessionRuntime;
pub use scheduler::{ScheduledTask, Scheduler, TokioScheduler};
pub use state::SessionState;
pub use view::{LifetimeStats, QuizStep, RoundSummary, format_game_date};
