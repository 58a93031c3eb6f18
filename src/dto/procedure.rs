use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Boat, Company, Entity};
use crate::codec::lenient;

pub const DEFAULT_NOTICE_LEAD_DAYS: i32 = 30;
pub const DEFAULT_VALIDITY_MONTHS: u32 = 12;
const EXPIRING_WINDOW_DAYS: i64 = 30;

/// An administrative procedure or permit ("Trámite") attached to a boat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    #[serde(default, with = "lenient")]
    pub id: i64,
    #[serde(default, with = "lenient")]
    pub codigo_barco: i64,
    #[serde(default, with = "lenient::option")]
    pub codigo_empresa: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub certificado: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub tipo_tramite: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_inicio: Option<NaiveDate>,
    #[serde(default, with = "lenient::option")]
    pub fecha_fin: Option<NaiveDate>,
    #[serde(default, with = "lenient::option")]
    pub fecha_aviso: Option<NaiveDate>,
    #[serde(default, with = "lenient::option")]
    pub dias_aviso_tramite: Option<i32>,
    /// Comma separated recipient addresses
    #[serde(default, with = "lenient::option")]
    pub lista_emails_envio_aviso: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub censo_barco: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub fecha_creacion: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub fecha_modificacion: Option<NaiveDateTime>,
    #[serde(default, with = "lenient::option")]
    pub estado: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub observaciones: Option<String>,
    #[serde(default, with = "lenient::option")]
    pub documento_path: Option<String>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default)]
    pub barco: Option<Box<Boat>>,
    #[serde(default)]
    pub empresa: Option<Company>,
}

/// Where a procedure stands relative to a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Current,
    ExpiringSoon { days_left: i64 },
    Expired,
    Unknown,
}

impl Procedure {
    pub fn recipients(&self) -> Vec<String> {
        self.lista_emails_envio_aviso
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn set_recipients<I, S>(&mut self, recipients: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = recipients
            .into_iter()
            .map(|address| address.as_ref().trim().to_string())
            .filter(|address| !address.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        self.lista_emails_envio_aviso = if joined.is_empty() { None } else { Some(joined) };
    }

    /// Fill the dates a new procedure needs before it is saved.
    ///
    /// Start defaults to `today`, end to one year later, the lead time to 30
    /// days and the notice date to end minus the lead time. Values already
    /// present are kept.
    pub fn with_defaults(mut self, today: NaiveDate) -> Self {
        let start = *self.fecha_inicio.get_or_insert(today);
        let end = *self.fecha_fin.get_or_insert_with(|| {
            start
                .checked_add_months(Months::new(DEFAULT_VALIDITY_MONTHS))
                .unwrap_or(start)
        });
        let lead = *self.dias_aviso_tramite.get_or_insert(DEFAULT_NOTICE_LEAD_DAYS);
        if self.fecha_aviso.is_none() {
            self.fecha_aviso = end.checked_sub_days(chrono::Days::new(lead.max(0) as u64));
        }
        self
    }

    pub fn validity(&self, today: NaiveDate) -> Validity {
        match self.fecha_fin {
            None => Validity::Unknown,
            Some(end) if end < today => Validity::Expired,
            Some(end) => {
                let days_left = (end - today).num_days();
                if days_left <= EXPIRING_WINDOW_DAYS {
                    Validity::ExpiringSoon { days_left }
                } else {
                    Validity::Current
                }
            }
        }
    }
}

impl Entity for Procedure {
    const COLLECTION: &'static str = "api/BarcosTramites";
    const ITEM: &'static str = "api/BarcosTramite";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn recipients_split_and_join() {
        let mut procedure = Procedure {
            lista_emails_envio_aviso: Some(" a@mar.es, ,b@mar.es ,".to_string()),
            ..Default::default()
        };
        assert_eq!(procedure.recipients(), vec!["a@mar.es", "b@mar.es"]);

        procedure.set_recipients(["c@mar.es", " d@mar.es "]);
        assert_eq!(procedure.lista_emails_envio_aviso.as_deref(), Some("c@mar.es,d@mar.es"));

        procedure.set_recipients(Vec::<String>::new());
        assert_eq!(procedure.lista_emails_envio_aviso, None);
        assert!(procedure.recipients().is_empty());
    }

    #[test]
    fn defaults_fill_only_missing_dates() {
        let today = day(2025, 3, 10);
        let filled = Procedure::default().with_defaults(today);
        assert_eq!(filled.fecha_inicio, Some(today));
        assert_eq!(filled.fecha_fin, Some(day(2026, 3, 10)));
        assert_eq!(filled.dias_aviso_tramite, Some(30));
        assert_eq!(filled.fecha_aviso, Some(day(2026, 2, 8)));

        let kept = Procedure {
            fecha_fin: Some(day(2025, 6, 30)),
            dias_aviso_tramite: Some(10),
            ..Default::default()
        }
        .with_defaults(today);
        assert_eq!(kept.fecha_fin, Some(day(2025, 6, 30)));
        assert_eq!(kept.fecha_aviso, Some(day(2025, 6, 20)));
    }

    #[test]
    fn validity_relative_to_today() {
        let today = day(2025, 3, 10);
        let ending = |end| Procedure { fecha_fin: Some(end), ..Default::default() };

        assert_eq!(Procedure::default().validity(today), Validity::Unknown);
        assert_eq!(ending(day(2025, 3, 9)).validity(today), Validity::Expired);
        assert_eq!(
            ending(day(2025, 3, 20)).validity(today),
            Validity::ExpiringSoon { days_left: 10 }
        );
        assert_eq!(ending(day(2025, 9, 1)).validity(today), Validity::Current);
    }

    #[test]
    fn timestamps_in_date_fields_keep_the_day() {
        let body = json!({
            "id": "15",
            "codigoBarco": 7,
            "fechaInicio": "2024-05-01T00:00:00",
            "fechaFin": "2025-05-01",
            "diasAvisoTramite": "15"
        });
        let procedure: Procedure = codec::decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(procedure.id, 15);
        assert_eq!(procedure.fecha_inicio, Some(day(2024, 5, 1)));
        assert_eq!(procedure.fecha_fin, Some(day(2025, 5, 1)));
        assert_eq!(procedure.dias_aviso_tramite, Some(15));

        let encoded = codec::encode(&procedure).unwrap();
        assert_eq!(encoded["fechaFin"], json!("2025-05-01"));
        assert_eq!(encoded["codigoBarco"], json!(7));
    }

    #[test]
    fn single_case_keys_decode() {
        let upper: Procedure =
            codec::decode(br#"{"ID": 4, "FECHAFIN": "2025-01-01", "LISTAEMAILSENVIOAVISO": "a@mar.es"}"#).unwrap();
        assert_eq!(upper.id, 4);
        assert_eq!(upper.fecha_fin, Some(day(2025, 1, 1)));
        assert_eq!(upper.recipients(), vec!["a@mar.es"]);

        let lower: Procedure = codec::decode(br#"{"id": 4, "fechafin": "2025-01-01", "diasavisotramite": 20}"#).unwrap();
        assert_eq!(lower.fecha_fin, Some(day(2025, 1, 1)));
        assert_eq!(lower.dias_aviso_tramite, Some(20));
    }
}
