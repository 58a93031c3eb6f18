use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use super::claims::Identity;
use crate::api::ApiClient;
use crate::dto::user::DEFAULT_ROLE;
use crate::dto::{Guild, User};

/// Everything known about the signed-in user for one session.
///
/// Built after login or from a state query and handed to whoever needs it;
/// nothing is cached globally, so a new login always starts from fresh claims.
/// Guild changes are published on a watch channel shared by every clone.
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: Uuid,
    identity: Identity,
    user: User,
    guild: Option<Guild>,
    guild_tx: Arc<watch::Sender<Option<Guild>>>,
}

impl User {
    /// Minimal user built from token claims when the profile is unavailable
    pub fn from_identity(identity: &Identity) -> Self {
        User {
            id: identity
                .subject
                .as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(0),
            email: identity.email.clone(),
            nombre: identity.name.clone(),
            nombre_usuario: identity.name.clone(),
            rol: Some(identity.role().unwrap_or(DEFAULT_ROLE).to_string()),
            tipo_usuario: identity.user_type,
            activo: Some(true),
            ..Default::default()
        }
    }
}

impl SessionContext {
    pub fn new(identity: Identity, user: User) -> Self {
        let (guild_tx, _rx) = watch::channel(None);
        Self {
            id: Uuid::new_v4(),
            identity,
            user,
            guild: None,
            guild_tx: Arc::new(guild_tx),
        }
    }

    /// Resolve the profile at `profile_path`, falling back to the claims on
    /// any failure. The token role overrides the profile role.
    pub async fn establish(identity: Identity, users: &ApiClient<User>, profile_path: &str) -> Self {
        let user = match users.get_one(profile_path).await {
            Ok(Some(mut profile)) => {
                if let Some(role) = identity.role() {
                    profile.rol = Some(role.to_string());
                }
                if profile.email().is_none() {
                    profile.email = identity.email.clone();
                }
                profile
            }
            Ok(None) => {
                tracing::debug!("Profile endpoint returned nothing, using token claims");
                User::from_identity(&identity)
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Profile refused ({}), using token claims", e);
                User::from_identity(&identity)
            }
            Err(e) => {
                tracing::warn!("Profile unavailable ({}), using token claims", e);
                User::from_identity(&identity)
            }
        };

        let session = Self::new(identity, user);
        tracing::debug!("Session {} established for '{}'", session.id, session.user.display_name());
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn role(&self) -> &str {
        self.user.role()
    }

    pub fn guild(&self) -> Option<&Guild> {
        self.guild.as_ref()
    }

    pub fn select_guild(&mut self, guild: Guild) {
        tracing::debug!("Session {} working on guild {}", self.id, guild.codigo_cofradia);
        self.guild_tx.send_replace(Some(guild.clone()));
        self.guild = Some(guild);
    }

    pub fn clear_guild(&mut self) -> Option<Guild> {
        let previous = self.guild.take();
        if previous.is_some() {
            tracing::debug!("Session {} left its guild", self.id);
            self.guild_tx.send_replace(None);
        }
        previous
    }

    /// Observe the selected guild; the receiver starts at the current value
    pub fn subscribe_guild(&self) -> watch::Receiver<Option<Guild>> {
        self.guild_tx.subscribe()
    }
}
