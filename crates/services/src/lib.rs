#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod presentation;
pub mod questions;
pub mod quiz_services;
pub mod session;
pub mod statistics;
#[cfg(any(test, feature = "test-util"))]
pub mod test_harness;

pub use quiz_core::Clock;

pub use config::QuizConfig;
pub use error::{FeedError, QuizServicesError, SessionError, StatisticsServiceError};
pub use presentation::{AlertModel, PresentationGateway};
pub use questions::{
    HttpMovieFeed, MovieEntry, MovieFeed, MovieFeedConfig, MovieFeedSource, QuestionListener,
    QuestionSource, StaticQuestionSource,
};
pub use quiz_services::{QuestionSourceKind, QuizServices, QuizSession};
pub use session::{
    QuizStep, RoundSummary, ScheduledTask, Scheduler, SessionController, SessionEvent,
    SessionHandle, SessionRuntime, SessionState, TokioScheduler,
};
pub use statistics::StatisticsService;
