use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use super::claims::{self, Identity};
use super::state::AuthStateProvider;
use crate::codec;
use crate::config::AppConfig;
use crate::dto::{LoginRequest, LoginResponse, LoginUser, User};
use crate::error::{ClientError, ClientResult};
use crate::storage::{StorageError, TokenStore};

/// Why a login attempt failed; the display text is meant for the end user
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Invalid login response or missing token.")]
    InvalidResponse,

    #[error("Network failure. Please try again.")]
    Network(#[source] reqwest::Error),

    #[error("Could not store the session: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub access_token: String,
    pub identity: Identity,
    /// User summary embedded in the login response, when the backend sends one
    pub user: Option<LoginUser>,
}

/// Login, logout and token access.
///
/// Uses its own HTTP client without the authorization interceptor, so a
/// rejected login never triggers the 401 logout path.
pub struct AuthService {
    http: reqwest::Client,
    login_url: Url,
    profile_url: Url,
    enrich_from_profile: bool,
    store: Arc<dyn TokenStore>,
    state: Arc<AuthStateProvider>,
}

pub(crate) fn resolve(base_url: &Url, path: &str) -> ClientResult<Url> {
    base_url
        .join(path.trim().trim_start_matches('/'))
        .map_err(|source| ClientError::InvalidEndpoint {
            endpoint: path.to_string(),
            source,
        })
}

pub(crate) fn parse_base_url(base_url: &str) -> ClientResult<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|source| ClientError::InvalidEndpoint {
        endpoint: base_url.to_string(),
        source,
    })
}

impl AuthService {
    pub fn new(
        config: &AppConfig,
        http: reqwest::Client,
        store: Arc<dyn TokenStore>,
        state: Arc<AuthStateProvider>,
    ) -> ClientResult<Self> {
        let base_url = parse_base_url(&config.api.base_url)?;
        Ok(Self {
            http,
            login_url: resolve(&base_url, &config.api.login_path)?,
            profile_url: resolve(&base_url, &config.api.profile_path)?,
            enrich_from_profile: config.auth.enrich_from_profile,
            store,
            state,
        })
    }

    pub fn state(&self) -> &Arc<AuthStateProvider> {
        &self.state
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, LoginError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(self.login_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Login request to {} failed: {}", self.login_url, e);
                LoginError::Network(e)
            })?;

        if !response.status().is_success() {
            tracing::warn!("Login for '{}' rejected with {}", request.email, response.status());
            return Err(LoginError::InvalidCredentials);
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Login response could not be read: {}", e);
            LoginError::Network(e)
        })?;

        let login: LoginResponse = codec::decode(&body).map_err(|e| {
            tracing::warn!("Login response is not valid JSON: {}", e);
            LoginError::InvalidResponse
        })?;

        let token = login.token().ok_or(LoginError::InvalidResponse)?.to_string();
        let mut identity = claims::decode_identity(&token, Utc::now()).map_err(|e| {
            tracing::warn!("Login token cannot be used: {}", e);
            LoginError::InvalidResponse
        })?;
        if let Some(user) = &login.user {
            identity.absorb_login_user(user);
        }

        self.store.save_token(&token).await?;

        if self.enrich_from_profile {
            if let Some(profile) = self.fetch_profile(&token).await {
                identity.enrich(&profile);
            }
        }

        self.state.notify_authenticated(identity.clone());
        Ok(LoginSuccess {
            access_token: token,
            identity,
            user: login.user,
        })
    }

    /// Profile of the freshly authenticated user; failures only get logged
    async fn fetch_profile(&self, token: &str) -> Option<User> {
        let response = match self
            .http
            .get(self.profile_url.clone())
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Profile request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Profile endpoint answered {}", response.status());
            return None;
        }

        match response.bytes().await {
            Ok(body) if body.iter().all(u8::is_ascii_whitespace) => None,
            Ok(body) => codec::decode::<User>(&body)
                .map_err(|e| tracing::warn!("Profile response is not a user: {}", e))
                .ok(),
            Err(e) => {
                tracing::warn!("Profile response could not be read: {}", e);
                None
            }
        }
    }

    /// Clear the token and publish the anonymous state, even when clearing fails
    pub async fn logout(&self) -> Result<(), StorageError> {
        let removed = self.store.remove_token().await;
        if let Err(e) = &removed {
            tracing::warn!("Could not remove stored token: {}", e);
        }
        self.state.notify_logged_out();
        removed
    }

    pub async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.store.token().await
    }
}
