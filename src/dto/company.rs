use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Boat, Entity};
use crate::codec::lenient;

/// A shipping company ("Empresa"), one per boat in this schema version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, with = "lenient::option")]
    pub codigo_empresa: Option<String>,
    #[serde(default, with = "lenient")]
    pub codigo_barco: i64,
    #[serde(default, with = "lenient::option")]
    pub nombre_armador: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub cif_nif: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub direccion: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub codigo_postal: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub localidad: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub provincia: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub telefono: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub email: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub codigo_banco: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub observaciones: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_alta: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub fecha_baja: Option<NaiveDateTime>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default)]
    pub barco: Option<Boat>,
}

impl Company {
    /// Relation under `api/Empresa/{key}` listing the company's users
    pub const USERS: &'static str = "usuarios";
}

impl Entity for Company {
    const COLLECTION: &'static str = "api/Empresa";
    const ITEM: &'static str = "api/Empresa";

    fn key(&self) -> String {
        self.codigo_empresa.clone().unwrap_or_default()
    }
}
