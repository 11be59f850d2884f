//! Durable record of asked questions: a JSON array of question keys.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{TriviaError, TriviaResult};
use crate::types::QuestionKey;

/// Reads and atomically replaces the used-questions file.
///
/// All file access goes through `written`, which also remembers the newest
/// generation on disk so an older snapshot never replaces a newer one.
pub struct UsedQuestionStore {
    path: PathBuf,
    written: Mutex<Option<u64>>,
}

impl UsedQuestionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted keys. A missing or unreadable file yields an empty set.
    pub async fn load(&self) -> BTreeSet<QuestionKey> {
        let _guard = self.written.lock().await;

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No used questions file at {}", self.path.display());
                return BTreeSet::new();
            }
            Err(e) => {
                tracing::warn!(
                    "Used questions file ({}) could not be read. No questions loaded. {}",
                    self.path.display(),
                    e
                );
                return BTreeSet::new();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(serde_json::Value::Array(items)) => {
                let keys: BTreeSet<QuestionKey> = items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(key) => Some(key),
                        _ => None,
                    })
                    .collect();
                tracing::debug!(
                    "Loaded {} used questions from {}",
                    keys.len(),
                    self.path.display()
                );
                keys
            }
            Ok(_) => {
                tracing::warn!(
                    "Used questions file ({}) is not an array. No questions loaded.",
                    self.path.display()
                );
                BTreeSet::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Used questions file ({}) is not valid JSON. No questions loaded. {}",
                    self.path.display(),
                    e
                );
                BTreeSet::new()
            }
        }
    }

    /// Write `keys` as snapshot `generation`.
    ///
    /// Returns `Ok(false)` when a newer generation is already on disk.
    pub async fn save(&self, generation: u64, keys: &[QuestionKey]) -> TriviaResult<bool> {
        let mut written = self.written.lock().await;
        if written.is_some_and(|last| last >= generation) {
            tracing::debug!(
                "Skipping stale used questions snapshot (generation {})",
                generation
            );
            return Ok(false);
        }

        let json = serde_json::to_string_pretty(keys).map_err(|e| self.persistence_error(e))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| self.persistence_error(e))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.persistence_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.persistence_error(e))?;

        *written = Some(generation);
        tracing::debug!(
            "Saved {} used questions to {}",
            keys.len(),
            self.path.display()
        );
        Ok(true)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persistence_error(&self, e: impl std::fmt::Display) -> TriviaError {
        TriviaError::Persistence {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> Vec<QuestionKey> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = UsedQuestionStore::new(dir.path().join("used.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("used.json");
        let store = UsedQuestionStore::new(&path);

        assert!(store.save(1, &keys(&["q-1", "q-2"])).await.unwrap());
        assert!(!dir.path().join("nested").join("used.json.tmp").exists());

        let raw: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, vec!["q-1", "q-2"]);

        let reloaded = UsedQuestionStore::new(&path);
        let loaded = reloaded.load().await;
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains("q-1"));
    }

    #[tokio::test]
    async fn test_stale_generation_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used.json");
        let store = UsedQuestionStore::new(&path);

        assert!(store.save(5, &keys(&["newer"])).await.unwrap());
        assert!(!store.save(4, &keys(&["older"])).await.unwrap());

        let loaded = store.load().await;
        assert!(loaded.contains("newer"));
        assert!(!loaded.contains("older"));
    }

    #[tokio::test]
    async fn test_non_array_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used.json");
        std::fs::write(&path, r#"{"q-1": true}"#).unwrap();

        let store = UsedQuestionStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_location_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = UsedQuestionStore::new(blocker.join("used.json"));
        let err = store.save(1, &keys(&["q"])).await.unwrap_err();
        assert!(matches!(err, TriviaError::Persistence { .. }));
    }
}
