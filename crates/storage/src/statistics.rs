//! Mapping between lifetime quiz statistics and key-value fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{GameResult, StatisticsRecord};

use crate::repository::{KeyValueStore, StorageError, StoredValue};

/// Persisted statistics fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticsKey {
    GamesPlayed,
    BestCorrect,
    BestTotal,
    BestDate,
    CumulativeCorrect,
}

impl StatisticsKey {
    pub const ALL: [StatisticsKey; 5] = [
        StatisticsKey::GamesPlayed,
        StatisticsKey::BestCorrect,
        StatisticsKey::BestTotal,
        StatisticsKey::BestDate,
        StatisticsKey::CumulativeCorrect,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatisticsKey::GamesPlayed => "games_played",
            StatisticsKey::BestCorrect => "best_game.correct",
            StatisticsKey::BestTotal => "best_game.total",
            StatisticsKey::BestDate => "best_game.date",
            StatisticsKey::CumulativeCorrect => "cumulative_correct",
        }
    }
}

/// Raw persisted statistics. Absent integer keys read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsRow {
    pub games_played: u32,
    pub best_correct: u32,
    pub best_total: u32,
    /// `None` until a best game has been written.
    pub best_date: Option<DateTime<Utc>>,
    pub cumulative_correct: u32,
}

impl StatisticsRow {
    #[must_use]
    pub fn from_record(record: &StatisticsRecord) -> Self {
        let best = record.best_game();
        Self {
            games_played: record.games_played(),
            best_correct: best.correct(),
            best_total: best.total(),
            best_date: Some(best.date()),
            cumulative_correct: record.cumulative_correct(),
        }
    }

    /// Convert into a domain record, using `fallback_date` when no best game date is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored best game is inconsistent.
    pub fn into_record(
        self,
        fallback_date: DateTime<Utc>,
    ) -> Result<StatisticsRecord, StorageError> {
        let best = GameResult::new(
            self.best_correct,
            self.best_total,
            self.best_date.unwrap_or(fallback_date),
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(StatisticsRecord::from_persisted(
            self.games_played,
            best,
            self.cumulative_correct,
        ))
    }
}

fn read_u32(key: StatisticsKey, value: Option<StoredValue>) -> Result<u32, StorageError> {
    let Some(value) = value else {
        return Ok(0);
    };
    let raw = value.as_integer().ok_or_else(|| {
        StorageError::Serialization(format!("{} is not an integer", key.as_str()))
    })?;
    u32::try_from(raw)
        .map_err(|_| StorageError::Serialization(format!("invalid {}: {raw}", key.as_str())))
}

fn read_date(value: Option<StoredValue>) -> Result<Option<DateTime<Utc>>, StorageError> {
    value
        .map(|v| {
            v.as_timestamp().ok_or_else(|| {
                StorageError::Serialization(format!(
                    "{} is not a timestamp",
                    StatisticsKey::BestDate.as_str()
                ))
            })
        })
        .transpose()
}

/// Row to persist after a read-modify-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowUpdate {
    pub row: StatisticsRow,
    /// Also write the best game fields.
    pub include_best: bool,
}

/// Reads and writes `StatisticsRow`s through any `KeyValueStore`.
#[derive(Clone)]
pub struct StatisticsRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StatisticsRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load every statistics field from one snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures or malformed values.
    pub async fn load(&self) -> Result<StatisticsRow, StorageError> {
        let keys = StatisticsKey::ALL.map(StatisticsKey::as_str);
        let values = self.store.get_many(&keys).await?;
        row_from_values(&values)
    }

    /// Read the current row and persist the one `apply` derives from it, as one
    /// atomic unit of the underlying store.
    ///
    /// An `Err` from `apply` aborts without writing and is returned as the
    /// inner result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or write failures or malformed values.
    pub async fn update<E, F>(&self, apply: F) -> Result<Result<RowUpdate, E>, StorageError>
    where
        E: Send,
        F: FnOnce(StatisticsRow) -> Result<RowUpdate, E> + Send,
    {
        let keys = StatisticsKey::ALL.map(StatisticsKey::as_str);
        let mut outcome = None;
        let slot = &mut outcome;
        self.store
            .update(
                &keys,
                Box::new(move |values| {
                    let row = row_from_values(&values)?;
                    match apply(row) {
                        Ok(update) => {
                            *slot = Some(Ok(update));
                            Ok(row_entries(&update.row, update.include_best))
                        }
                        Err(err) => {
                            *slot = Some(Err(err));
                            Ok(Vec::new())
                        }
                    }
                }),
            )
            .await?;
        outcome.ok_or_else(|| StorageError::Connection("store skipped the update".into()))
    }
}

fn row_from_values(values: &[Option<StoredValue>]) -> Result<StatisticsRow, StorageError> {
    let &[games_played, best_correct, best_total, best_date, cumulative_correct] = values else {
        return Err(StorageError::Serialization(format!(
            "expected {} values, got {}",
            StatisticsKey::ALL.len(),
            values.len()
        )));
    };

    Ok(StatisticsRow {
        games_played: read_u32(StatisticsKey::GamesPlayed, games_played)?,
        best_correct: read_u32(StatisticsKey::BestCorrect, best_correct)?,
        best_total: read_u32(StatisticsKey::BestTotal, best_total)?,
        best_date: read_date(best_date)?,
        cumulative_correct: read_u32(StatisticsKey::CumulativeCorrect, cumulative_correct)?,
    })
}

/// Counters always; best game fields only when `include_best` is set.
fn row_entries(row: &StatisticsRow, include_best: bool) -> Vec<(String, StoredValue)> {
    let mut entries = vec![
        (
            StatisticsKey::GamesPlayed,
            StoredValue::Integer(i64::from(row.games_played)),
        ),
        (
            StatisticsKey::CumulativeCorrect,
            StoredValue::Integer(i64::from(row.cumulative_correct)),
        ),
    ];
    if include_best {
        entries.push((
            StatisticsKey::BestCorrect,
            StoredValue::Integer(i64::from(row.best_correct)),
        ));
        entries.push((
            StatisticsKey::BestTotal,
            StoredValue::Integer(i64::from(row.best_total)),
        ));
        if let Some(date) = row.best_date {
            entries.push((StatisticsKey::BestDate, StoredValue::Timestamp(date)));
        }
    }
    entries
        .into_iter()
        .map(|(key, value)| (key.as_str().to_owned(), value))
        .collect()
}
