use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Company, Entity, Person};
use crate::codec::lenient;

pub const DEFAULT_ROLE: &str = "Usuario";

/// A back-office user ("Usuario").
///
/// The backend returns the id as either `Id` or `IdUsuario` and the address
/// as either `Email` or `EMail`; both spellings are kept and read through
/// [`User::user_id`] and [`User::email`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, with = "lenient")]
    pub id: i64,
    #[serde(default, with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub id_usuario: Option<i64>,
    #[serde(default, with = "lenient::option")]
    pub email: Option<String>,
    #[serde(default, with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub e_mail: Option<String>,
    #[serde(default, with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nombre: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nombre_usuario: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub apellidos: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub telefono: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub rol: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub tipo_usuario: Option<i32>,
    #[serde(default, with = "lenient::option")]
    pub codigo_empresa: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub codigo_persona: Option<i64>,
    #[serde(default, with = "lenient::option")]
    pub nif_acceso: Option<String>,
    #[serde(default, rename = "e_mail_avisos", with = "lenient::option")]
    pub email_avisos: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_alta: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub fecha_baja: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub fecha_registro: Option<NaiveDateTime>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default, with = "lenient::option")]
    pub fecha_ultimo_acceso: Option<NaiveDateTime>,
    #[serde(default)]
    pub empresa: Option<Company>,
    #[serde(default)]
    pub persona: Option<Person>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl User {
    pub fn user_id(&self) -> i64 {
        if self.id != 0 {
            self.id
        } else {
            self.id_usuario.unwrap_or(0)
        }
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref()).or_else(|| non_blank(self.e_mail.as_deref()))
    }

    pub fn role(&self) -> &str {
        non_blank(self.rol.as_deref()).unwrap_or(DEFAULT_ROLE)
    }

    pub fn is_active(&self) -> bool {
        self.activo.unwrap_or(true)
    }

    /// "Nombre Apellidos", falling back to the user name and then the address
    pub fn display_name(&self) -> String {
        let full = [self.nombre.as_deref(), self.apellidos.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        non_blank(self.nombre_usuario.as_deref())
            .or_else(|| self.email())
            .unwrap_or("")
            .to_string()
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "api/Usuarios";
    const ITEM: &'static str = "api/Usuario";

    fn key(&self) -> String {
        self.user_id().to_string()
    }
}
