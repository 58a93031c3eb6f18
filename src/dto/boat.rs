use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Entity, Procedure};
use crate::codec::lenient;

/// A vessel ("Barco")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boat {
    #[serde(default, with = "lenient")]
    pub codigo_barco: i64,
    /// Official registry number
    #[serde(default, with = "lenient::option")]
    pub censo: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nombre_b: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub nombre_a: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub capitan_nombre: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub tipo_barco: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub puerto: Option<String>,
    // Length, beam and depth
    #[serde(default, with = "lenient::option")]
    pub eslora: Option<Decimal>,
    #[serde(default, with = "lenient::option")]
    pub manga: Option<Decimal>,
    #[serde(default, with = "lenient::option")]
    pub puntal: Option<Decimal>,
    #[serde(default, with = "lenient::option")]
    pub trb: Option<i32>,
    #[serde(default, with = "lenient::option")]
    pub gt: Option<i32>,
    #[serde(default, with = "lenient::option")]
    pub matricula: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub licencia_pesca: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_alta: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub fecha_baja: Option<NaiveDateTime>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default)]
    pub barcos_tramites: Option<Vec<Procedure>>,
}

impl Boat {
    /// First non-blank of the registered name and the alias
    pub fn display_name(&self) -> &str {
        [self.nombre_b.as_deref(), self.nombre_a.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
            .unwrap_or("")
    }

    pub fn procedures(&self) -> &[Procedure] {
        self.barcos_tramites.as_deref().unwrap_or(&[])
    }
}

impl Entity for Boat {
    const COLLECTION: &'static str = "api/Barcos";
    const ITEM: &'static str = "api/Barcos";

    fn key(&self) -> String {
        self.codigo_barco.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use serde_json::json;

    #[test]
    fn decodes_pascal_case_backend_payload() {
        let body = json!({
            "CodigoBarco": "1024",
            "Censo": 27451,
            "NombreB": "Nuevo Ronsel",
            "Eslora": "18,40",
            "GT": "45",
            "FechaAlta": "2019-04-02T00:00:00",
            "Activo": true,
            "BarcosTramites": [
                { "Id": 3, "CodigoBarco": 1024, "Certificado": "Francobordo", "FechaFin": "2026-01-31" }
            ]
        });

        let boat: Boat = codec::decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(boat.codigo_barco, 1024);
        assert_eq!(boat.censo.as_deref(), Some("27451"));
        assert_eq!(boat.eslora, Some(Decimal::new(1840, 2)));
        assert_eq!(boat.gt, Some(45));
        assert_eq!(boat.display_name(), "Nuevo Ronsel");
        assert_eq!(boat.procedures().len(), 1);
        assert_eq!(boat.procedures()[0].certificado.as_deref(), Some("Francobordo"));
    }

    #[test]
    fn single_case_keys_decode() {
        let lower: Boat = codec::decode(br#"{"codigobarco": 5, "nombreb": "Ronsel", "gt": "12"}"#).unwrap();
        assert_eq!(lower.codigo_barco, 5);
        assert_eq!(lower.nombre_b.as_deref(), Some("Ronsel"));
        assert_eq!(lower.gt, Some(12));

        let upper: Boat = codec::decode(
            br#"{"CODIGOBARCO": "6", "NOMBREB": "Ronsel", "BARCOSTRAMITES": [{"ID": 1, "FECHAFIN": "2025-01-01"}]}"#,
        )
        .unwrap();
        assert_eq!(upper.codigo_barco, 6);
        assert_eq!(upper.nombre_b.as_deref(), Some("Ronsel"));
        assert_eq!(upper.procedures()[0].id, 1);
        assert!(upper.procedures()[0].fecha_fin.is_some());
    }

    #[test]
    fn display_name_falls_back_to_alias() {
        let boat = Boat {
            nombre_b: Some("  ".to_string()),
            nombre_a: Some("Ronsel II".to_string()),
            ..Default::default()
        };
        assert_eq!(boat.display_name(), "Ronsel II");
        assert!(boat.procedures().is_empty());
    }
}
