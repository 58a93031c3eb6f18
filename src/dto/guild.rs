use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::codec::lenient;

/// A fishermen's guild ("Cofradía")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    #[serde(default, with = "lenient")]
    pub codigo_cofradia: i64,
    #[serde(default, with = "lenient::option")]
    pub nombre_cofradia: Option<String>,
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
    pub web: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_alta: Option<NaiveDateTime>,
    #[serde(default)]
    pub activo: Option<bool>,
}

impl Entity for Guild {
    const COLLECTION: &'static str = "api/Cofradias";
    const ITEM: &'static str = "api/Cofradias";

    fn key(&self) -> String {
        self.codigo_cofradia.to_string()
    }
}
