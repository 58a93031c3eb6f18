use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

use super::claims::{self, Identity};
use crate::storage::TokenStore;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Anonymous => None,
        }
    }
}

/// Current authentication state, derived from the stored token.
///
/// Transitions are published on a watch channel. A query publishes only when
/// the derived state differs from the last published one; explicit login and
/// logout notifications always publish.
pub struct AuthStateProvider {
    store: Arc<dyn TokenStore>,
    tx: watch::Sender<AuthState>,
}

impl AuthStateProvider {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (tx, _rx) = watch::channel(AuthState::Anonymous);
        Self { store, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// Last published state, without touching the store
    pub fn last_published(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub async fn current_state(&self) -> AuthState {
        let state = self.derive_state().await;
        self.tx.send_if_modified(|published| {
            if *published == state {
                false
            } else {
                *published = state.clone();
                true
            }
        });
        state
    }

    pub fn notify_authenticated(&self, identity: Identity) {
        tracing::info!("Authenticated as '{}'", identity.display_name());
        self.tx.send_replace(AuthState::Authenticated(identity));
    }

    pub fn notify_logged_out(&self) {
        tracing::info!("Session ended");
        self.tx.send_replace(AuthState::Anonymous);
    }

    async fn derive_state(&self) -> AuthState {
        let token = match self.store.token().await {
            Ok(Some(token)) => token,
            Ok(None) => return AuthState::Anonymous,
            Err(e) => {
                tracing::warn!("Could not read stored token: {}", e);
                return AuthState::Anonymous;
            }
        };

        match claims::decode_identity(&token, Utc::now()) {
            Ok(identity) => {
                // Keep what login enrichment added while the token is unchanged
                if let AuthState::Authenticated(published) = self.last_published() {
                    if published.same_session(&identity) {
                        return AuthState::Authenticated(published);
                    }
                }
                AuthState::Authenticated(identity)
            }
            Err(e) if e.is_stale() => {
                tracing::info!("Discarding stored token: {}", e);
                if let Err(e) = self.store.remove_token().await {
                    tracing::warn!("Could not remove stale token: {}", e);
                }
                AuthState::Anonymous
            }
            Err(e) => {
                tracing::warn!("Stored token is unreadable: {}", e);
                AuthState::Anonymous
            }
        }
    }
}
