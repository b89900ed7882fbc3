use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};

use super::SqliteStore;
use crate::repository::{KeyValueStore, StorageError, StoredValue, UpdateFn};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn map_value(row: &sqlx::sqlite::SqliteRow) -> Result<StoredValue, StorageError> {
    let int_value: Option<i64> = row.try_get("int_value").map_err(ser)?;
    let timestamp_value: Option<DateTime<Utc>> = row.try_get("timestamp_value").map_err(ser)?;
    match (int_value, timestamp_value) {
        (Some(v), None) => Ok(StoredValue::Integer(v)),
        (None, Some(t)) => Ok(StoredValue::Timestamp(t)),
        _ => Err(StorageError::Serialization(
            "key_values row must hold exactly one value".into(),
        )),
    }
}

async fn fetch_value(
    db: &mut SqliteConnection,
    key: &str,
) -> Result<Option<StoredValue>, StorageError> {
    let row = sqlx::query(
        r"
        SELECT int_value, timestamp_value
        FROM key_values
        WHERE key = ?1
        ",
    )
    .bind(key)
    .fetch_optional(&mut *db)
    .await
    .map_err(conn)?;
    row.as_ref().map(map_value).transpose()
}

async fn upsert_value(
    db: &mut SqliteConnection,
    key: &str,
    value: StoredValue,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let (int_value, timestamp_value) = match value {
        StoredValue::Integer(v) => (Some(v), None),
        StoredValue::Timestamp(t) => (None, Some(t)),
    };
    sqlx::query(
        r"
        INSERT INTO key_values (key, int_value, timestamp_value, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(key) DO UPDATE SET
            int_value = excluded.int_value,
            timestamp_value = excluded.timestamp_value,
            updated_at = excluded.updated_at
        ",
    )
    .bind(key)
    .bind(int_value)
    .bind(timestamp_value)
    .bind(now)
    .execute(&mut *db)
    .await
    .map_err(conn)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<StoredValue>>, StorageError> {
        // One read transaction so every key comes from the same snapshot.
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(fetch_value(&mut tx, key).await?);
        }
        tx.commit().await.map_err(conn)?;
        Ok(values)
    }

    async fn put_all(&self, entries: &[(&str, StoredValue)]) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for (key, value) in entries {
            upsert_value(&mut tx, key, *value, now).await?;
        }
        // Dropping `tx` on an early return rolls the whole batch back.
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn update(&self, keys: &[&str], apply: UpdateFn<'_>) -> Result<(), StorageError> {
        // Write lock is held from the first read; other writers wait on busy_timeout.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(conn)?;
        let mut current = Vec::with_capacity(keys.len());
        for key in keys {
            current.push(fetch_value(&mut tx, key).await?);
        }

        let entries = apply(current)?;
        let now = Utc::now();
        for (key, value) in &entries {
            upsert_value(&mut tx, key, *value, now).await?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
