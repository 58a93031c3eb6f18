use std::sync::Arc;
use tower::Layer;
use url::Url;

use crate::api::{ApiClient, Query, UploadOptions};
use crate::auth::service::parse_base_url;
use crate::auth::{
    AuthService, AuthState, AuthStateProvider, AuthorizeLayer, Authorized, LoginError,
    LoginSuccess, SessionContext,
};
use crate::config::{AppConfig, StorageBackend};
use crate::dto::{Company, Entity, User};
use crate::error::{ClientError, ClientResult};
use crate::navigation::{Navigator, TracingNavigator};
use crate::storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};

/// Everything needed to talk to the CRM backend, wired together.
///
/// Owns the token store, the auth state provider, the login service and the
/// authorized transport that every [`ApiClient`] shares.
#[derive(Clone)]
pub struct CrmClient {
    config: AppConfig,
    base_url: Url,
    store: Arc<dyn TokenStore>,
    state: Arc<AuthStateProvider>,
    auth: Arc<AuthService>,
    transport: Authorized<reqwest::Client>,
}

pub struct CrmClientBuilder {
    config: AppConfig,
    store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    http: Option<reqwest::Client>,
}

impl CrmClientBuilder {
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> ClientResult<CrmClient> {
        let base_url = parse_base_url(&self.config.api.base_url)?;
        let store = match self.store {
            Some(store) => store,
            None => default_store(&self.config)?,
        };
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(concat!("maritime-crm/", env!("CARGO_PKG_VERSION")))
                .build()?,
        };

        let state = Arc::new(AuthStateProvider::new(store.clone()));
        let auth = Arc::new(AuthService::new(
            &self.config,
            http.clone(),
            store.clone(),
            state.clone(),
        )?);

        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNavigator) as Arc<dyn Navigator>);
        let transport = AuthorizeLayer::new(auth.clone(), self.config.api.login_route.clone())
            .with_navigator(navigator)
            .layer(http);

        tracing::debug!(
            "CRM client for {} ({:?} environment)",
            base_url,
            self.config.environment
        );

        Ok(CrmClient {
            config: self.config,
            base_url,
            store,
            state,
            auth,
            transport,
        })
    }
}

fn default_store(config: &AppConfig) -> ClientResult<Arc<dyn TokenStore>> {
    match config.auth.storage {
        StorageBackend::Memory => Ok(Arc::new(MemoryTokenStore::new())),
        StorageBackend::File => {
            let dir = config.auth.storage_dir.as_ref().ok_or_else(|| {
                ClientError::Storage(StorageError::Unavailable(
                    "file token storage needs a storage directory".to_string(),
                ))
            })?;
            Ok(Arc::new(FileTokenStore::new(dir, config.auth.token_key.clone())))
        }
    }
}

impl CrmClient {
    pub fn builder(config: AppConfig) -> CrmClientBuilder {
        CrmClientBuilder {
            config,
            store: None,
            navigator: None,
            http: None,
        }
    }

    pub fn new(config: AppConfig) -> ClientResult<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Typed client for `T` over the shared authorized transport
    pub fn api<T>(&self) -> ApiClient<T> {
        ApiClient::new(self.base_url.clone(), self.transport.clone())
            .with_request_logging(self.config.api.enable_request_logging)
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }

    pub fn state(&self) -> &Arc<AuthStateProvider> {
        &self.state
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions::from_config(&self.config.upload)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, LoginError> {
        self.auth.login(email, password).await
    }

    pub async fn logout(&self) -> Result<(), StorageError> {
        self.auth.logout().await
    }

    pub async fn current_state(&self) -> AuthState {
        self.state.current_state().await
    }

    /// Users attached to one company; no content gives an empty list
    pub async fn company_users(&self, company: impl std::fmt::Display) -> ClientResult<Vec<User>> {
        self.api::<User>()
            .get_nested(Company::ITEM, company, Company::USERS, &Query::new())
            .await
    }

    /// Session for the stored token, or `None` when nobody is signed in
    pub async fn session(&self) -> Option<SessionContext> {
        match self.state.current_state().await {
            AuthState::Authenticated(identity) => Some(
                SessionContext::establish(identity, &self.api::<User>(), &self.config.api.profile_path)
                    .await,
            ),
            AuthState::Anonymous => None,
        }
    }
}
