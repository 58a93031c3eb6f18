use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub login_path: String,
    pub profile_path: String,
    /// Route handed to the navigator when a request comes back 401
    pub login_route: String,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub field_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_key: String,
    pub storage: StorageBackend,
    pub storage_dir: Option<PathBuf>,
    pub enrich_from_profile: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_UPLOAD_FIELD: &str = "file";
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Preset used by tests and embedders that point the client at an explicit backend
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config.auth.storage = StorageBackend::Memory;
        config
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("CRM_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("CRM_API_LOGIN_PATH") {
            self.api.login_path = v;
        }
        if let Ok(v) = env::var("CRM_API_PROFILE_PATH") {
            self.api.profile_path = v;
        }
        if let Ok(v) = env::var("CRM_API_LOGIN_ROUTE") {
            self.api.login_route = v;
        }
        if let Ok(v) = env::var("CRM_API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Upload overrides
        if let Ok(v) = env::var("CRM_UPLOAD_MAX_BYTES") {
            self.upload.max_bytes = v.parse().unwrap_or(self.upload.max_bytes);
        }
        if let Ok(v) = env::var("CRM_UPLOAD_FIELD_NAME") {
            if !v.trim().is_empty() {
                self.upload.field_name = v.trim().to_string();
            }
        }

        // Auth overrides
        if let Ok(v) = env::var("CRM_AUTH_TOKEN_KEY") {
            if !v.trim().is_empty() {
                self.auth.token_key = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("CRM_AUTH_STORAGE") {
            self.auth.storage = match v.as_str() {
                "memory" => StorageBackend::Memory,
                "file" => StorageBackend::File,
                _ => self.auth.storage,
            };
        }
        if let Ok(v) = env::var("CRM_AUTH_STORAGE_DIR") {
            self.auth.storage_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("CRM_AUTH_ENRICH_FROM_PROFILE") {
            self.auth.enrich_from_profile = v.parse().unwrap_or(self.auth.enrich_from_profile);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "https://localhost:7254/".to_string(),
                login_path: "api/Auth/login".to_string(),
                profile_path: "api/Usuarios/perfil".to_string(),
                login_route: "login".to_string(),
                enable_request_logging: true,
            },
            upload: UploadConfig {
                max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
                field_name: DEFAULT_UPLOAD_FIELD.to_string(),
            },
            auth: AuthConfig {
                token_key: DEFAULT_TOKEN_KEY.to_string(),
                storage: StorageBackend::File,
                storage_dir: None,
                enrich_from_profile: false,
            },
        }
    }

    fn staging() -> Self {
        // Same backend as production, with request logging left on
        let mut config = Self::production();
        config.environment = Environment::Staging;
        config.api.enable_request_logging = true;
        config
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://crm-api-myhv.onrender.com/".to_string(),
                login_path: "api/Auth/login".to_string(),
                profile_path: "api/Usuarios/perfil".to_string(),
                login_route: "login".to_string(),
                enable_request_logging: false,
            },
            upload: UploadConfig {
                max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
                field_name: DEFAULT_UPLOAD_FIELD.to_string(),
            },
            auth: AuthConfig {
                token_key: DEFAULT_TOKEN_KEY.to_string(),
                storage: StorageBackend::File,
                storage_dir: None,
                enrich_from_profile: false,
            },
        }
    }
}

// Global singleton config - initialized once at first use
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
