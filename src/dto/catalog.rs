use serde::{Deserialize, Serialize};

use super::Entity;
use crate::codec::lenient;

/// Procedure kind with its default validity and notice lead time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureType {
    #[serde(default, with = "lenient")]
    pub id_tipo_tramite: i64,
    #[serde(default, with = "lenient::option")]
    pub codigo_tipo_tramite: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nombre_tipo_tramite: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub descripcion: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub dias_validez: Option<i32>,
    #[serde(default, with = "lenient::option")]
    pub dias_aviso_defecto: Option<i32>,
    #[serde(default)]
    pub requiere_documento: Option<bool>,
    #[serde(default)]
    pub activo: Option<bool>,
}

impl Entity for ProcedureType {
    const COLLECTION: &'static str = "api/TipoTramite";
    const ITEM: &'static str = "api/TipoTramite";

    fn key(&self) -> String {
        self.id_tipo_tramite.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureStatus {
    #[serde(default, with = "lenient")]
    pub id_estado: i64,
    #[serde(default, with = "lenient::option")]
    pub codigo_estado: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nombre_estado: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub descripcion: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub color: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub orden: Option<i32>,
    #[serde(default)]
    pub activo: Option<bool>,
}

impl Entity for ProcedureStatus {
    const COLLECTION: &'static str = "api/EstadosTramites";
    const ITEM: &'static str = "api/EstadosTramites";

    fn key(&self) -> String {
        self.id_estado.to_string()
    }
}
