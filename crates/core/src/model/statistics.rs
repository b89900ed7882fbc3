use thiserror::Error;

use crate::model::{GameResult, GameResultError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatisticsError {
    #[error(transparent)]
    Result(#[from] GameResultError),

    #[error("statistics counter overflow: {field}")]
    Overflow { field: &'static str },
}

/// Lifetime statistics across all completed rounds.
///
/// `best_game.correct` is the maximum over every recorded round and
/// `cumulative_correct` is their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsRecord {
    games_played: u32,
    best_game: GameResult,
    cumulative_correct: u32,
}

impl StatisticsRecord {
    /// Rehydrate a record from persisted counters.
    #[must_use]
    pub fn from_persisted(
        games_played: u32,
        best_game: GameResult,
        cumulative_correct: u32,
    ) -> Self {
        Self {
            games_played,
            best_game,
            cumulative_correct,
        }
    }

    #[must_use]
    pub fn empty(best_game: GameResult) -> Self {
        Self::from_persisted(0, best_game, 0)
    }

    #[must_use]
    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    #[must_use]
    pub fn best_game(&self) -> GameResult {
        self.best_game
    }

    #[must_use]
    pub fn cumulative_correct(&self) -> u32 {
        self.cumulative_correct
    }

    /// Fold one completed round into the record.
    ///
    /// The best game is replaced only when `result` has strictly more correct answers.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError::Overflow` if a counter cannot be incremented.
    pub fn apply_round(&self, result: GameResult) -> Result<Self, StatisticsError> {
        let games_played = self
            .games_played
            .checked_add(1)
            .ok_or(StatisticsError::Overflow {
                field: "games_played",
            })?;
        let cumulative_correct = self
            .cumulative_correct
            .checked_add(result.correct())
            .ok_or(StatisticsError::Overflow {
                field: "cumulative_correct",
            })?;
        let best_game = if result.is_better_than(&self.best_game) {
            result
        } else {
            self.best_game
        };

        Ok(Self {
            games_played,
            best_game,
            cumulative_correct,
        })
    }

    /// Percentage of correct answers across all rounds, in `[0, 100]`.
    ///
    /// Returns `0.0` when no round has been played.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_accuracy(&self, questions_per_round: u32) -> f64 {
        let total_questions = u64::from(self.games_played) * u64::from(questions_per_round);
        if total_questions == 0 {
            return 0.0;
        }
        let accuracy = f64::from(self.cumulative_correct) / total_questions as f64 * 100.0;
        accuracy.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn result(correct: u32) -> GameResult {
        GameResult::new(correct, 10, fixed_now()).unwrap()
    }

    #[test]
    fn empty_record_has_zero_accuracy() {
        let record = StatisticsRecord::empty(GameResult::empty(fixed_now()));
        assert_eq!(record.total_accuracy(10), 0.0);
    }

    #[test]
    fn apply_round_accumulates_and_keeps_best() {
        let record = StatisticsRecord::empty(GameResult::empty(fixed_now()));
        let record = record.apply_round(result(7)).unwrap();
        let record = record.apply_round(result(5)).unwrap();

        assert_eq!(record.games_played(), 2);
        assert_eq!(record.cumulative_correct(), 12);
        assert_eq!(record.best_game().correct(), 7);
        assert!((record.total_accuracy(10) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn accuracy_is_clamped_when_round_size_shrinks() {
        let record = StatisticsRecord::from_persisted(1, result(10), 10);
        assert!((record.total_accuracy(5) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn overflow_is_reported() {
        let record = StatisticsRecord::from_persisted(u32::MAX, result(1), 1);
        let err = record.apply_round(result(1)).unwrap_err();
        assert_eq!(
            err,
            StatisticsError::Overflow {
                field: "games_played"
            }
        );
    }
}
