use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Entity, User};
use crate::codec::lenient;

/// A notification sent to a user ("Aviso"), typically a procedure about to expire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default, with = "lenient")]
    pub id_aviso: i64,
    #[serde(default, with = "lenient::option")]
    pub titulo_aviso: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub mensaje_aviso: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub tipo_aviso: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_aviso: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub fecha_lectura: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub id_usuario: Option<i64>,
    #[serde(default, with = "lenient::option")]
    pub email_destinatario: Option<String>,
    #[serde(default)]
    pub leido: Option<bool>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default)]
    pub usuario: Option<Box<User>>,
}

impl Notice {
    pub fn is_read(&self) -> bool {
        self.leido.unwrap_or(false) || self.fecha_lectura.is_some()
    }
}

impl Entity for Notice {
    const COLLECTION: &'static str = "api/Avisos";
    const ITEM: &'static str = "api/Avisos";

    fn key(&self) -> String {
        self.id_aviso.to_string()
    }
}
