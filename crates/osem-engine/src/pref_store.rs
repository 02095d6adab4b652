use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::EngineError;

/// A small generic JSON-backed key/value store (spec component 8), built on
/// the same atomic-write discipline `osem-store` uses for the event
/// collection, scaled down to a flat map with no notification fan-out.
#[derive(Clone)]
pub struct PreferenceStore<K, V> {
    inner: Arc<Mutex<HashMap<K, V>>>,
    path: PathBuf,
}

impl<K, V> PreferenceStore<K, V>
where
    K: Eq + Hash + Serialize + DeserializeOwned + Clone,
    V: Serialize + DeserializeOwned + Clone,
{
    /// Loads `path` if it exists, otherwise starts from an empty map.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let map = if path.exists() {
            let content = tokio::fs::read(&path).await?;
            if content.is_empty() {
                HashMap::new()
            } else {
                let entries: Vec<(K, V)> = serde_json::from_slice(&content)?;
                entries.into_iter().collect()
            }
        } else {
            HashMap::new()
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(map)),
            path,
        })
    }

    pub async fn snapshot(&self) -> HashMap<K, V> {
        self.inner.lock().await.clone()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().await.get(key).cloned()
    }

    pub async fn set(&self, key: K, value: V) -> Result<(), EngineError> {
        let mut guard = self.inner.lock().await;
        guard.insert(key, value);
        self.persist(&guard).await
    }

    pub async fn remove(&self, key: &K) -> Result<Option<V>, EngineError> {
        let mut guard = self.inner.lock().await;
        let removed = guard.remove(key);
        self.persist(&guard).await?;
        Ok(removed)
    }

    async fn persist(&self, map: &HashMap<K, V>) -> Result<(), EngineError> {
        let entries: Vec<(&K, &V)> = map.iter().collect();
        let payload = serde_json::to_vec_pretty(&entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp_path, &payload).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}
