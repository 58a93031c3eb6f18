use serde::{Deserialize, Serialize};

use crate::codec::lenient;

/// Body of `POST api/Auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by the login endpoint.
///
/// Decoded through the codec like any other response, so `access_token`
/// and `accessToken` are both accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default, with = "lenient::option")]
    pub access_token: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub token_type: Option<String>,
    /// Seconds until the token expires
    #[serde(default, with = "lenient::option")]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

impl LoginResponse {
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// User summary embedded in the login response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginUser {
    /// Identity provider id, usually a UUID
    #[serde(default, with = "lenient::option")]
    pub id: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nombre_usuario: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub e_mail: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub rol: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub empresa_id: Option<i64>,
    #[serde(default, with = "lenient::option")]
    pub persona_id: Option<i64>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default, with = "lenient::option")]
    pub tipo_usuario: Option<i32>,
}
