use std::sync::Arc;

use storage::repository::Storage;
use tokio::task::{JoinError, JoinHandle};
use tracing::info;

use crate::Clock;
use crate::config::QuizConfig;
use crate::error::QuizServicesError;
use crate::presentation::PresentationGateway;
use crate::questions::{
    HttpMovieFeed, MovieFeed, MovieFeedConfig, MovieFeedSource, QuestionListener, QuestionSource,
    StaticQuestionSource,
};
use crate::session::{Scheduler, SessionController, SessionHandle, SessionRuntime, TokioScheduler};
use crate::statistics::StatisticsService;

/// Where a session gets its questions from.
#[derive(Clone)]
pub enum QuestionSourceKind {
    /// The movies shipped with the app.
    Bundled,
    MovieFeed(Arc<dyn MovieFeed>),
}

impl QuestionSourceKind {
    /// The HTTP feed when an API key is configured, the bundled movies otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        match MovieFeedConfig::from_env() {
            Some(config) => Self::MovieFeed(Arc::new(HttpMovieFeed::new(config))),
            None => Self::Bundled,
        }
    }

    fn build(
        self,
        rating_threshold: f32,
        listener: Arc<dyn QuestionListener>,
    ) -> Arc<dyn QuestionSource> {
        match self {
            Self::Bundled => Arc::new(StaticQuestionSource::bundled(rating_threshold, listener)),
            Self::MovieFeed(feed) => {
                Arc::new(MovieFeedSource::new(feed, rating_threshold, listener))
            }
        }
    }
}

/// Assembles the statistics store and spawns quiz sessions.
#[derive(Clone)]
pub struct QuizServices {
    config: QuizConfig,
    statistics: Arc<StatisticsService>,
}

impl QuizServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: QuizConfig,
    ) -> Result<Self, QuizServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, config))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, config: QuizConfig) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, config)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, config: QuizConfig) -> Self {
        let statistics = Arc::new(StatisticsService::new(
            clock,
            Arc::clone(&storage.key_values),
            config.questions_per_round(),
        ));
        Self { config, statistics }
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn statistics(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.statistics)
    }

    /// Spawn a session runtime on the current tokio runtime and begin loading
    /// its questions.
    #[must_use]
    pub fn spawn_session(
        &self,
        presentation: Arc<dyn PresentationGateway>,
        source: QuestionSourceKind,
    ) -> QuizSession {
        let (handle, rx) = SessionHandle::channel();
        let listener: Arc<dyn QuestionListener> = Arc::new(handle.clone());
        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(handle.clone()));
        let controller = SessionController::new(
            self.config.clone(),
            source.build(self.config.rating_threshold(), listener),
            presentation,
            Arc::clone(&self.statistics),
            scheduler,
            handle.clone(),
        );

        let task = SessionRuntime::new(controller, rx).spawn();
        handle.load();
        info!(
            questions_per_round = self.config.questions_per_round(),
            "quiz session started"
        );
        QuizSession { handle, task }
    }
}

/// A running session: the handle for UI input and the runtime task.
pub struct QuizSession {
    handle: SessionHandle,
    task: JoinHandle<SessionController>,
}

impl QuizSession {
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop the runtime after the events already queued and return the controller.
    ///
    /// # Errors
    ///
    /// Returns `JoinError` if the runtime task panicked or was aborted.
    pub async fn shutdown(self) -> Result<SessionController, JoinError> {
        self.handle.shutdown();
        self.task.await
    }
}
