//! Token Storage
//!
//! Persistence of the current token between runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;
use crate::types::Token;

/// Credential store interface.
///
/// A store holds at most one token per path; `save` replaces whatever was
/// there before.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the token stored at `path`.
    async fn load(&self, path: &Path) -> Result<Token, StorageError>;

    /// Store `token` at `path`, replacing any previous record.
    async fn save(&self, path: &Path, token: &Token) -> Result<(), StorageError>;

    /// Remove the record at `path`. Returns whether one existed.
    async fn delete(&self, path: &Path) -> Result<bool, StorageError>;
}

/// JSON file store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCredentialStore;

impl FileCredentialStore {
    pub fn new() -> Self {
        Self
    }
}

fn decode(path: &Path, bytes: &[u8]) -> Result<Token, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::CorruptedData {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn encode(path: &Path, token: &Token) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(token).map_err(|e| StorageError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, path: &Path) -> Result<Token, StorageError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                path: path.to_path_buf(),
            },
            _ => StorageError::ReadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        decode(path, &bytes)
    }

    async fn save(&self, path: &Path, token: &Token) -> Result<(), StorageError> {
        let bytes = encode(path, token)?;
        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await.map_err(write_failed)?;
        file.write_all(&bytes).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-memory store keyed by path.
///
/// Records are kept serialized so decoding behaves like the file store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place raw bytes at `path`, bypassing encoding.
    pub fn insert_raw(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into(), bytes.into());
    }

    /// Check whether a record exists at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self, path: &Path) -> Result<Token, StorageError> {
        let bytes = self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_path_buf(),
            })?;

        decode(path, &bytes)
    }

    async fn save(&self, path: &Path, token: &Token) -> Result<(), StorageError> {
        let bytes = encode(path, token)?;
        self.insert_raw(path, bytes);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path)
            .is_some())
    }
}

/// Mock store for testing.
#[derive(Default)]
pub struct MockCredentialStore {
    inner: InMemoryCredentialStore,
    load_history: Mutex<Vec<PathBuf>>,
    save_history: Mutex<Vec<(PathBuf, Token)>>,
    delete_history: Mutex<Vec<PathBuf>>,
    next_load_error: Mutex<Option<StorageError>>,
    fail_saves: Mutex<bool>,
}

impl MockCredentialStore {
    /// Create new mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store already holding `token` at `path`.
    pub fn with_token(path: impl Into<PathBuf>, token: &Token) -> Self {
        let store = Self::new();
        if let Ok(bytes) = serde_json::to_vec(token) {
            store.inner.insert_raw(path, bytes);
        }
        store
    }

    /// Fail the next load with `error`.
    pub fn set_next_load_error(&self, error: StorageError) -> &Self {
        *self.next_load_error.lock().unwrap() = Some(error);
        self
    }

    /// Make every save fail.
    pub fn set_fail_saves(&self, fail: bool) -> &Self {
        *self.fail_saves.lock().unwrap() = fail;
        self
    }

    /// Get load history.
    pub fn get_load_history(&self) -> Vec<PathBuf> {
        self.load_history.lock().unwrap().clone()
    }

    /// Get save history.
    pub fn get_save_history(&self) -> Vec<(PathBuf, Token)> {
        self.save_history.lock().unwrap().clone()
    }

    /// Get delete history.
    pub fn get_delete_history(&self) -> Vec<PathBuf> {
        self.delete_history.lock().unwrap().clone()
    }

    /// Check whether a record exists at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.inner.contains(path)
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn load(&self, path: &Path) -> Result<Token, StorageError> {
        self.load_history.lock().unwrap().push(path.to_path_buf());

        if let Some(error) = self.next_load_error.lock().unwrap().take() {
            return Err(error);
        }

        self.inner.load(path).await
    }

    async fn save(&self, path: &Path, token: &Token) -> Result<(), StorageError> {
        self.save_history
            .lock()
            .unwrap()
            .push((path.to_path_buf(), token.clone()));

        if *self.fail_saves.lock().unwrap() {
            return Err(StorageError::WriteFailed {
                path: path.to_path_buf(),
                message: "mock write failure".to_string(),
            });
        }

        self.inner.save(path, token).await
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        self.delete_history.lock().unwrap().push(path.to_path_buf());
        self.inner.delete(path).await
    }
}
