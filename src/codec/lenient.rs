//! String-or-number tolerant scalars.
//!
//! Apply with `#[serde(with = "lenient")]` on required fields and
//! `#[serde(default, with = "lenient::option")]` on optional ones.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serializer};
use serde_json::Number;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A scalar that may arrive as a JSON number or as a JSON string
pub trait Lenient: Sized {
    const EXPECTED: &'static str;

    fn from_number(number: &Number) -> Option<Self>;
    fn from_text(text: &str) -> Option<Self>;
    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Number(Number),
    Text(String),
    Bool(bool),
}

impl Raw {
    fn describe(&self) -> String {
        match self {
            Raw::Number(n) => format!("number {}", n),
            Raw::Text(s) => format!("string \"{}\"", s),
            Raw::Bool(b) => format!("boolean {}", b),
        }
    }
}

fn convert<T: Lenient, E: de::Error>(raw: Raw) -> Result<T, E> {
    let parsed = match &raw {
        Raw::Number(n) => T::from_number(n),
        Raw::Text(s) => T::from_text(s),
        Raw::Bool(b) => T::from_text(if *b { "true" } else { "false" }),
    };
    parsed.ok_or_else(|| E::custom(format!("expected {}, found {}", T::EXPECTED, raw.describe())))
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Lenient,
{
    convert(Raw::deserialize(deserializer)?)
}

pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Lenient,
{
    value.write(serializer)
}

pub mod option {
    use super::{convert, Lenient, Raw};
    use serde::{Deserialize, Deserializer, Serializer};

    /// `null`, a missing field, or a blank string that `T` cannot read all give `None`
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Lenient,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Text(text)) if text.trim().is_empty() => Ok(T::from_text(&text)),
            Some(raw) => convert(raw).map(Some),
        }
    }

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Lenient,
    {
        match value {
            Some(inner) => inner.write(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// Accepts `12.5` and the Spanish `12,5`
fn normalize_decimal_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

impl Lenient for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_number(number: &Number) -> Option<Self> {
        number.as_i64().or_else(|| number.as_f64().and_then(integral))
    }

    fn from_text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| normalize_decimal_text(trimmed).parse::<f64>().ok().and_then(integral))
    }

    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*self)
    }
}

impl Lenient for i32 {
    const EXPECTED: &'static str = "a 32-bit integer";

    fn from_number(number: &Number) -> Option<Self> {
        i64::from_number(number).and_then(|v| i32::try_from(v).ok())
    }

    fn from_text(text: &str) -> Option<Self> {
        i64::from_text(text).and_then(|v| i32::try_from(v).ok())
    }

    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*self)
    }
}

impl Lenient for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_number(number: &Number) -> Option<Self> {
        number.as_f64()
    }

    fn from_text(text: &str) -> Option<Self> {
        normalize_decimal_text(text).parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*self)
    }
}

impl Lenient for Decimal {
    const EXPECTED: &'static str = "a decimal";

    fn from_number(number: &Number) -> Option<Self> {
        Self::from_text(&number.to_string())
    }

    fn from_text(text: &str) -> Option<Self> {
        let normalized = normalize_decimal_text(text);
        Decimal::from_str(&normalized)
            .ok()
            .or_else(|| Decimal::from_scientific(&normalized).ok())
    }

    /// A JSON number when a double holds the value exactly, the decimal text otherwise
    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let exact = self
            .to_f64()
            .filter(|value| value.is_finite())
            .filter(|value| Decimal::from_str(&value.to_string()).ok() == Some(*self));
        match exact {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl Lenient for String {
    const EXPECTED: &'static str = "a string";

    fn from_number(number: &Number) -> Option<Self> {
        Some(number.to_string())
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self)
    }
}

/// Parse a plain date, a naive timestamp, or an RFC 3339 timestamp
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

impl Lenient for NaiveDate {
    const EXPECTED: &'static str = "a date";

    fn from_number(_number: &Number) -> Option<Self> {
        None
    }

    fn from_text(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
            .ok()
            .or_else(|| parse_date_time(text).map(|dt| dt.date()))
    }

    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format(DATE_FORMAT).to_string())
    }
}

impl Lenient for NaiveDateTime {
    const EXPECTED: &'static str = "a timestamp";

    fn from_number(_number: &Number) -> Option<Self> {
        None
    }

    fn from_text(text: &str) -> Option<Self> {
        parse_date_time(text)
    }

    fn write<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format(DATE_TIME_FORMAT).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        #[serde(with = "crate::codec::lenient")]
        id: i64,
        #[serde(default, with = "crate::codec::lenient::option")]
        gt: Option<i32>,
        #[serde(default, with = "crate::codec::lenient::option")]
        eslora: Option<Decimal>,
        #[serde(default, with = "crate::codec::lenient::option")]
        censo: Option<String>,
        #[serde(default, with = "crate::codec::lenient::option")]
        fecha_fin: Option<NaiveDate>,
        #[serde(default, with = "crate::codec::lenient::option")]
        fecha_alta: Option<NaiveDateTime>,
    }

    #[test]
    fn string_and_number_ids_decode_identically() {
        let from_text: Row = serde_json::from_value(json!({ "id": "42" })).unwrap();
        let from_number: Row = serde_json::from_value(json!({ "id": 42 })).unwrap();
        assert_eq!(from_text.id, 42);
        assert_eq!(from_text, from_number);
    }

    #[test]
    fn strings_accept_numbers() {
        let row: Row = serde_json::from_value(json!({ "id": 1, "censo": 12345 })).unwrap();
        assert_eq!(row.censo.as_deref(), Some("12345"));
    }

    #[test]
    fn decimals_accept_text_number_and_comma() {
        let a: Row = serde_json::from_value(json!({ "id": 1, "eslora": 12.5 })).unwrap();
        let b: Row = serde_json::from_value(json!({ "id": 1, "eslora": "12.5" })).unwrap();
        let c: Row = serde_json::from_value(json!({ "id": 1, "eslora": "12,5" })).unwrap();
        assert_eq!(a.eslora, Some(Decimal::new(125, 1)));
        assert_eq!(a.eslora, b.eslora);
        assert_eq!(b.eslora, c.eslora);
    }

    #[test]
    fn null_missing_and_blank_become_none() {
        let row: Row = serde_json::from_value(json!({ "id": 1, "gt": null, "fecha_fin": "" })).unwrap();
        assert_eq!(row.gt, None);
        assert_eq!(row.fecha_fin, None);
        assert_eq!(row.eslora, None);
    }

    #[test]
    fn dates_accept_plain_dates_and_timestamps() {
        let row: Row = serde_json::from_value(json!({
            "id": 1,
            "fecha_fin": "2025-03-31T00:00:00",
            "fecha_alta": "2024-01-15"
        }))
        .unwrap();
        assert_eq!(row.fecha_fin, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(
            row.fecha_alta,
            NaiveDate::from_ymd_opt(2024, 1, 15).map(|d| d.and_time(NaiveTime::MIN))
        );
    }

    #[test]
    fn garbage_is_rejected_with_a_readable_message() {
        let err = serde_json::from_value::<Row>(json!({ "id": "abc" })).unwrap_err();
        assert!(err.to_string().contains("expected an integer"), "{}", err);
    }

    #[test]
    fn values_serialize_as_native_json() {
        let row = Row {
            id: 9,
            gt: Some(120),
            eslora: Some(Decimal::new(2150, 2)),
            censo: None,
            fecha_fin: NaiveDate::from_ymd_opt(2026, 6, 1),
            fecha_alta: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["id"], json!(9));
        assert_eq!(value["gt"], json!(120));
        assert_eq!(value["eslora"], json!(21.5));
        assert_eq!(value["fecha_fin"], json!("2026-06-01"));
        assert_eq!(value["censo"], json!(null));
    }

    #[test]
    fn decimals_beyond_a_double_keep_every_digit() {
        let precise = Decimal::from_str("12345678901234567.123456789").unwrap();
        let row = Row {
            id: 1,
            gt: None,
            eslora: Some(precise),
            censo: None,
            fecha_fin: None,
            fecha_alta: None,
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["eslora"], json!("12345678901234567.123456789"));

        // And it reads back unchanged
        let back: Row = serde_json::from_value(value).unwrap();
        assert_eq!(back.eslora, Some(precise));
    }
}
