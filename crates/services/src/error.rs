//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{GameResultError, StatisticsError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::session::SessionState;

/// Errors emitted while loading the movie feed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedError {
    #[error("movie feed request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("movie feed returned an unreadable payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("movie feed reported an error: {0}")]
    Api(String),
    #[error("movie feed returned no movies")]
    EmptyPool,
}

/// Errors emitted by `StatisticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatisticsServiceError {
    #[error(transparent)]
    Result(#[from] GameResultError),
    #[error(transparent)]
    Statistics(#[from] StatisticsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{event} is not valid while the session is {state:?}")]
    InvalidTransition {
        event: &'static str,
        state: SessionState,
    },
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
