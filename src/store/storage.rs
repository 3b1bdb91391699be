// src/store/storage.rs

use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::error::AppError;

/// Durable key/value storage of serialized records, grouped by namespace.
///
/// `list` returns records in the order their keys were first written;
/// overwriting a key keeps its position.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, AppError>;

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), AppError>;

    /// Returns whether a record was removed.
    async fn delete(&self, namespace: &str, key: &str) -> Result<bool, AppError>;

    async fn list(&self, namespace: &str) -> Result<Vec<String>, AppError>;
}

/// Process-local storage. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    namespaces: RwLock<HashMap<String, Vec<(String, String)>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, AppError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.get(namespace).and_then(|records| {
            records
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value.clone())
        }))
    }

    async fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), AppError> {
        let mut namespaces = self.namespaces.write().await;
        let records = namespaces.entry(namespace.to_string()).or_default();
        match records.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => records.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool, AppError> {
        let mut namespaces = self.namespaces.write().await;
        let Some(records) = namespaces.get_mut(namespace) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|(k, _)| k != key);
        Ok(records.len() != before)
    }

    async fn list(&self, namespace: &str) -> Result<Vec<String>, AppError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .map(|records| records.iter().map(|(_, value)| value.clone()).collect())
            .unwrap_or_default())
    }
}

/// Typed JSON view over one namespace of a [`Storage`].
pub struct Records<T> {
    storage: Arc<dyn Storage>,
    namespace: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Records<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            namespace: self.namespace,
            _marker: PhantomData,
        }
    }
}

impl<T> Records<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(storage: Arc<dyn Storage>, namespace: &'static str) -> Self {
        Self {
            storage,
            namespace,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.storage.get(self.namespace, key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn put(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        self.storage.put(self.namespace, key, &raw).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.storage.delete(self.namespace, key).await
    }

    pub async fn list(&self) -> Result<Vec<T>, AppError> {
        self.storage
            .list(self.namespace)
            .await?
            .iter()
            .map(|raw| serde_json::from_str(raw).map_err(AppError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwrite_keeps_insertion_position() {
        let storage = MemoryStorage::new();
        storage.put("ns", "a", "1").await.unwrap();
        storage.put("ns", "b", "2").await.unwrap();
        storage.put("ns", "a", "3").await.unwrap();

        assert_eq!(storage.list("ns").await.unwrap(), vec!["3", "2"]);
        assert_eq!(storage.get("ns", "a").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let storage = MemoryStorage::new();
        storage.put("exams", "k", "exam").await.unwrap();

        assert_eq!(storage.get("results", "k").await.unwrap(), None);
        assert!(!storage.delete("results", "k").await.unwrap());
        assert!(storage.delete("exams", "k").await.unwrap());
        assert!(storage.list("exams").await.unwrap().is_empty());
    }
}
