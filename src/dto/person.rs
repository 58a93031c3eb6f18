use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::codec::lenient;

/// A natural person ("Persona") linked from users and crews
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, with = "lenient")]
    pub codigo_persona: i64,
    #[serde(default, with = "lenient::option")]
    pub nombre: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub apellidos: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nif_nie: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub telefono: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub email: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub direccion: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub codigo_postal: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub localidad: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub provincia: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_alta: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub fecha_baja: Option<NaiveDateTime>,
    #[serde(default)]
    pub activo: Option<bool>,
}

impl Entity for Person {
    const COLLECTION: &'static str = "api/Personas";
    const ITEM: &'static str = "api/Personas";

    fn key(&self) -> String {
        self.codigo_persona.to_string()
    }
}
