use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Scalar value stored under a string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredValue {
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl StoredValue {
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            StoredValue::Integer(v) => Some(*v),
            StoredValue::Timestamp(_) => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredValue::Timestamp(t) => Some(*t),
            StoredValue::Integer(_) => None,
        }
    }
}

/// Computes the entries to write from values read in the same atomic unit.
///
/// Returning an empty batch writes nothing.
pub type UpdateFn<'a> = Box<
    dyn FnOnce(Vec<Option<StoredValue>>) -> Result<Vec<(String, StoredValue)>, StorageError>
        + Send
        + 'a,
>;

/// Durable string-keyed scalar storage.
///
/// Writes must be visible to the next read in the same process once `put_all` returns.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read several keys from one consistent snapshot.
    ///
    /// The result is aligned with `keys`; absent keys yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<StoredValue>>, StorageError>;

    /// Write every entry, or none of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be committed. Nothing is applied in that case.
    async fn put_all(&self, entries: &[(&str, StoredValue)]) -> Result<(), StorageError>;

    /// Read `keys` and write what `apply` returns, with no other writer in between.
    ///
    /// `apply` receives values aligned with `keys`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read or write fails, or `apply` returns an error.
    /// Nothing is applied in that case.
    async fn update(&self, keys: &[&str], apply: UpdateFn<'_>) -> Result<(), StorageError>;

    /// Read a single key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StorageError> {
        let mut values = self.get_many(&[key]).await?;
        Ok(values.pop().flatten())
    }
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    values: Arc<Mutex<HashMap<String, StoredValue>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<StoredValue>>, StorageError> {
        let guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(keys.iter().map(|key| guard.get(*key).copied()).collect())
    }

    async fn put_all(&self, entries: &[(&str, StoredValue)]) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for (key, value) in entries {
            guard.insert((*key).to_owned(), *value);
        }
        Ok(())
    }

    async fn update(&self, keys: &[&str], apply: UpdateFn<'_>) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let current = keys.iter().map(|key| guard.get(*key).copied()).collect();
        for (key, value) in apply(current)? {
            guard.insert(key, value);
        }
        Ok(())
    }
}

/// Storage handles behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub key_values: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let key_values: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        Self { key_values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn absent_keys_read_as_none() {
        let store = InMemoryStore::new();
        let values = store.get_many(&["a", "b"]).await.unwrap();
        assert_eq!(values, vec![None, None]);
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn batch_write_is_visible_to_next_read() {
        let store = InMemoryStore::new();
        store
            .put_all(&[
                ("count", StoredValue::Integer(3)),
                ("date", StoredValue::Timestamp(fixed_now())),
            ])
            .await
            .unwrap();

        let values = store.get_many(&["date", "missing", "count"]).await.unwrap();
        assert_eq!(
            values,
            vec![
                Some(StoredValue::Timestamp(fixed_now())),
                None,
                Some(StoredValue::Integer(3)),
            ]
        );
    }

    #[tokio::test]
    async fn update_writes_entries_computed_from_read() {
        let store = InMemoryStore::new();
        store
            .put_all(&[("count", StoredValue::Integer(3))])
            .await
            .unwrap();

        store
            .update(
                &["count", "missing"],
                Box::new(|values| {
                    assert_eq!(values, vec![Some(StoredValue::Integer(3)), None]);
                    Ok(vec![
                        ("count".to_owned(), StoredValue::Integer(4)),
                        ("missing".to_owned(), StoredValue::Integer(1)),
                    ])
                }),
            )
            .await
            .unwrap();

        let values = store.get_many(&["count", "missing"]).await.unwrap();
        assert_eq!(
            values,
            vec![Some(StoredValue::Integer(4)), Some(StoredValue::Integer(1))]
        );
    }

    #[tokio::test]
    async fn failed_update_writes_nothing() {
        let store = InMemoryStore::new();
        let err = store
            .update(
                &["count"],
                Box::new(|_| Err(StorageError::Serialization("bad row".into()))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
        assert_eq!(store.get("count").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store
            .put_all(&[("count", StoredValue::Integer(1))])
            .await
            .unwrap();
        assert_eq!(
            other.get("count").await.unwrap(),
            Some(StoredValue::Integer(1))
        );
    }

    #[test]
    fn stored_value_accessors_match_variant() {
        assert_eq!(StoredValue::Integer(4).as_integer(), Some(4));
        assert_eq!(StoredValue::Integer(4).as_timestamp(), None);
        assert_eq!(
            StoredValue::Timestamp(fixed_now()).as_timestamp(),
            Some(fixed_now())
        );
    }
}
