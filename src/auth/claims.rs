use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dto::{LoginUser, User};

pub const CLAIM_NAME_IDENTIFIER: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
pub const CLAIM_EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
pub const CLAIM_NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
pub const CLAIM_ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

const SUBJECT_CLAIMS: &[&str] = &[CLAIM_NAME_IDENTIFIER, "nameid", "sub"];
const EMAIL_CLAIMS: &[&str] = &[CLAIM_EMAIL, "email"];
const NAME_CLAIMS: &[&str] = &[CLAIM_NAME, "unique_name", "name"];
const ROLE_CLAIMS: &[&str] = &[CLAIM_ROLE, "role", "roles"];

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("Token has no expiry")]
    MissingExpiry,

    #[error("Token expired at {0}")]
    Expired(DateTime<Utc>),
}

impl ClaimsError {
    /// A well formed token that must not be used any more
    pub fn is_stale(&self) -> bool {
        matches!(self, ClaimsError::MissingExpiry | ClaimsError::Expired(_))
    }
}

/// Who the token says the caller is
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<String>,
    /// Backend user kind, only known after profile enrichment
    pub user_type: Option<i32>,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Same token contents, ignoring what enrichment added
    pub fn same_session(&self, other: &Identity) -> bool {
        self.subject == other.subject && self.expires_at == other.expires_at
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.subject.as_deref())
            .unwrap_or("")
    }

    /// Fill gaps from the user summary of the login response
    pub fn absorb_login_user(&mut self, user: &LoginUser) {
        fill(&mut self.email, user.e_mail.as_deref());
        fill(&mut self.name, user.nombre_usuario.as_deref());
        if self.roles.is_empty() {
            if let Some(role) = non_blank(user.rol.as_deref()) {
                self.roles.push(role.to_string());
            }
        }
        if self.user_type.is_none() {
            self.user_type = user.tipo_usuario;
        }
    }

    /// Fill gaps from the profile endpoint. Token roles win over the profile.
    pub fn enrich(&mut self, profile: &User) {
        fill(&mut self.email, profile.email());
        let display_name = profile.display_name();
        fill(&mut self.name, Some(display_name.as_str()));
        if self.roles.is_empty() {
            if let Some(role) = non_blank(profile.rol.as_deref()) {
                self.roles.push(role.to_string());
            }
        }
        if profile.tipo_usuario.is_some() {
            self.user_type = profile.tipo_usuario;
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_none() {
        *slot = non_blank(value).map(str::to_string);
    }
}

/// Read the payload without checking the signature; the backend is the one
/// that verifies tokens, the client only needs the claims
pub fn read_claims(token: &str) -> Result<Map<String, Value>, ClaimsError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Map<String, Value>>(token.trim(), &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Decode a token into an [`Identity`], rejecting it when it has no expiry
/// or expired before `now`
pub fn decode_identity(token: &str, now: DateTime<Utc>) -> Result<Identity, ClaimsError> {
    let claims = read_claims(token)?;
    let expires_at = claims
        .get("exp")
        .and_then(timestamp)
        .ok_or(ClaimsError::MissingExpiry)?;

    if expires_at <= now {
        return Err(ClaimsError::Expired(expires_at));
    }

    Ok(Identity {
        subject: first_text(&claims, SUBJECT_CLAIMS),
        email: first_text(&claims, EMAIL_CLAIMS),
        name: first_text(&claims, NAME_CLAIMS),
        roles: roles(&claims),
        user_type: None,
        expires_at,
    })
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Utc.timestamp_opt(seconds, 0).single()
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(text),
        _ => None,
    }
}

fn first_text(claims: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| claims.get(*name).and_then(text))
}

fn roles(claims: &Map<String, Value>) -> Vec<String> {
    let mut roles: Vec<String> = Vec::new();
    for name in ROLE_CLAIMS {
        let found: Vec<String> = match claims.get(*name) {
            Some(Value::Array(items)) => items.iter().filter_map(text).collect(),
            Some(value) => text(value).into_iter().collect(),
            None => Vec::new(),
        };
        for role in found {
            if !roles.iter().any(|r| r == &role) {
                roles.push(role);
            }
        }
    }
    roles
}
