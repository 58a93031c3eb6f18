use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codec::lenient;
use crate::config::{UploadConfig, DEFAULT_UPLOAD_FIELD, DEFAULT_UPLOAD_MAX_BYTES};
use crate::error::{ClientError, ClientResult};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file held in memory, ready to be sent as one multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk, refusing it before reading if it is over `max_bytes`
    pub async fn from_path(path: impl AsRef<Path>, max_bytes: u64) -> ClientResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ClientError::invalid_argument(format!("'{}' has no file name", path.display()))
            })?
            .to_string();

        let size = tokio::fs::metadata(path).await?.len();
        if size > max_bytes {
            return Err(ClientError::PayloadTooLarge {
                name,
                size,
                limit: max_bytes,
            });
        }

        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            content_type: content_type_for(path).map(str::to_string),
            name,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Media types for the documents usually attached to procedures
fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(content_type)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub max_bytes: u64,
    pub field_name: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            field_name: DEFAULT_UPLOAD_FIELD.to_string(),
        }
    }
}

impl UploadOptions {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            field_name: config.field_name.clone(),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Everything that can be rejected without touching the network
    pub fn check(&self, file: &UploadFile) -> ClientResult<()> {
        if self.field_name.trim().is_empty() {
            return Err(ClientError::invalid_argument("upload field name is empty"));
        }
        if file.name.trim().is_empty() {
            return Err(ClientError::invalid_argument("upload file has no name"));
        }
        if file.size() > self.max_bytes {
            return Err(ClientError::PayloadTooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Upload result when the backend describes the stored file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(default, with = "lenient::option")]
    pub path: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub url: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub file_name: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub size: Option<i64>,
}

impl StoredDocument {
    pub fn location(&self) -> Option<&str> {
        self.path.as_deref().or(self.url.as_deref())
    }
}
