use std::sync::Arc;

use quiz_core::model::{GameResult, StatisticsRecord};
use storage::repository::{InMemoryStore, KeyValueStore};
use storage::statistics::{RowUpdate, StatisticsRepository, StatisticsRow};
use tracing::info;

use crate::Clock;
use crate::error::StatisticsServiceError;

/// Lifetime quiz statistics over an injected key-value store.
///
/// Every read goes to the store; nothing is cached between calls.
pub struct StatisticsService {
    clock: Clock,
    repo: StatisticsRepository,
    questions_per_round: u32,
}

impl StatisticsService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>, questions_per_round: u32) -> Self {
        Self {
            clock,
            repo: StatisticsRepository::new(store),
            questions_per_round,
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock, questions_per_round: u32) -> Self {
        Self::new(clock, Arc::new(InMemoryStore::new()), questions_per_round)
    }

    #[must_use]
    pub fn questions_per_round(&self) -> u32 {
        self.questions_per_round
    }

    /// Record one completed round and return the updated statistics.
    ///
    /// The read and the write form one atomic update of the store, so services
    /// sharing a store never lose a round.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsServiceError` if `correct > total`, a counter would
    /// overflow, or storage fails. Nothing is written in any of those cases.
    pub async fn record_round(
        &self,
        correct: u32,
        total: u32,
    ) -> Result<StatisticsRecord, StatisticsServiceError> {
        let now = self.clock.now();
        let result = GameResult::new(correct, total, now)?;
        let update = self
            .repo
            .update(|row| {
                let current = row.into_record(now)?;
                let updated = current.apply_round(result)?;
                Ok::<_, StatisticsServiceError>(RowUpdate {
                    row: StatisticsRow::from_record(&updated),
                    include_best: updated.best_game() != current.best_game(),
                })
            })
            .await??;
        let updated = update.row.into_record(now)?;

        info!(
            correct,
            total,
            games_played = updated.games_played(),
            best = updated.best_game().correct(),
            new_best = update.include_best,
            "recorded quiz round"
        );
        Ok(updated)
    }

    /// Current statistics in one consistent read.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsServiceError::Storage` on read failures.
    pub async fn snapshot(&self) -> Result<StatisticsRecord, StatisticsServiceError> {
        Ok(self.repo.load().await?.into_record(self.clock.now())?)
    }

    /// # Errors
    ///
    /// Returns `StatisticsServiceError::Storage` on read failures.
    pub async fn games_played(&self) -> Result<u32, StatisticsServiceError> {
        Ok(self.snapshot().await?.games_played())
    }

    /// Stored best game, or `{0, 0, now}` when none has been recorded.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsServiceError::Storage` on read failures.
    pub async fn best_game(&self) -> Result<GameResult, StatisticsServiceError> {
        Ok(self.snapshot().await?.best_game())
    }

    /// Lifetime accuracy percentage, recomputed from stored counters.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsServiceError::Storage` on read failures.
    pub async fn total_accuracy(&self) -> Result<f64, StatisticsServiceError> {
        Ok(self
            .snapshot()
            .await?
            .total_accuracy(self.questions_per_round))
    }
}
