//! Persistence for the bearer token.
//!
//! A store holds a single named key with the raw token string. The file store
//! backs the command-line client; the memory store serves embedders and tests.

mod file;

pub use file::FileTokenStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Token store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Token store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save_token(&self, token: &str) -> Result<(), StorageError>;

    /// The stored token; blank values read back as `None`
    async fn token(&self) -> Result<Option<String>, StorageError>;

    async fn remove_token(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save_token(&self, token: &str) -> Result<(), StorageError> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .token
            .read()
            .await
            .clone()
            .filter(|t| !t.trim().is_empty()))
    }

    async fn remove_token(&self) -> Result<(), StorageError> {
        *self.token.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_and_clears() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.token().await.unwrap(), None);

        store.save_token("abc.def.ghi").await.unwrap();
        assert_eq!(store.token().await.unwrap().as_deref(), Some("abc.def.ghi"));

        store.remove_token().await.unwrap();
        assert_eq!(store.token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_tokens_read_as_missing() {
        let store = MemoryTokenStore::with_token("   ");
        assert_eq!(store.token().await.unwrap(), None);
    }
}
