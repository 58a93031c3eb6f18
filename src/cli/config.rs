use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::CrmClient;
use crate::config::{self, AppConfig, StorageBackend};
use crate::navigation::Navigator;

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("CRM_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("crm").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Process configuration with the token kept in the CLI config directory
/// unless a storage directory was configured explicitly
pub fn cli_app_config() -> anyhow::Result<AppConfig> {
    let mut app_config = config::config().clone();
    if app_config.auth.storage == StorageBackend::File && app_config.auth.storage_dir.is_none() {
        app_config.auth.storage_dir = Some(get_config_dir()?);
    }
    Ok(app_config)
}

pub fn build_client() -> anyhow::Result<CrmClient> {
    let client = CrmClient::builder(cli_app_config()?)
        .navigator(Arc::new(CliNavigator))
        .build()?;
    Ok(client)
}

/// Tells the user to sign in again when the backend rejects the session
#[derive(Debug, Default, Clone, Copy)]
pub struct CliNavigator;

#[async_trait]
impl Navigator for CliNavigator {
    async fn navigate_to(&self, route: &str) -> anyhow::Result<()> {
        tracing::debug!("Login route '{}' requested", route);
        eprintln!("Session expired or rejected. Run `crm auth login <email>` to sign in again.");
        Ok(())
    }
}
