use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::{StorageError, TokenStore};

const SESSION_FILE: &str = "session.json";

/// Token kept in `session.json` under the configured key, next to the rest of
/// the CLI configuration. Other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>, key: impl Into<String>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => Ok(map),
                _ => Err(StorageError::Unavailable(format!(
                    "{} does not hold a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, map: Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(map))?;

        // Owner-only from the first byte; an older file is tightened before it is truncated
        restrict_permissions(&self.path).await?;
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    match tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save_token(&self, token: &str) -> Result<(), StorageError> {
        let mut map = self.load().await?;
        map.insert(self.key.clone(), Value::String(token.to_string()));
        self.store(map).await
    }

    async fn token(&self) -> Result<Option<String>, StorageError> {
        let map = self.load().await?;
        Ok(map
            .get(&self.key)
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string))
    }

    async fn remove_token(&self) -> Result<(), StorageError> {
        let mut map = self.load().await?;
        if map.remove(&self.key).is_some() {
            self.store(map).await?;
        }
        Ok(())
    }
}
