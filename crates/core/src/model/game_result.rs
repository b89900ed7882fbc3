use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameResultError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Outcome of one completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    correct: u32,
    total: u32,
    date: DateTime<Utc>,
}

impl GameResult {
    /// # Errors
    ///
    /// Returns `GameResultError::CorrectExceedsTotal` if `correct > total`.
    pub fn new(correct: u32, total: u32, date: DateTime<Utc>) -> Result<Self, GameResultError> {
        if correct > total {
            return Err(GameResultError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self {
            correct,
            total,
            date,
        })
    }

    /// Zero-value result used when nothing has been recorded yet.
    #[must_use]
    pub fn empty(date: DateTime<Utc>) -> Self {
        Self {
            correct: 0,
            total: 0,
            date,
        }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Strictly more correct answers than `other`.
    #[must_use]
    pub fn is_better_than(&self, other: &GameResult) -> bool {
        self.correct > other.correct
    }
}
