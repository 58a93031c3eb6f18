//! JSON wire conventions for the CRM backend.
//!
//! The backend is inconsistent about property casing (`CodigoBarco`,
//! `codigoBarco`) and about whether numbers travel as JSON numbers or strings.
//! Every response body goes through [`decode`], which matches object keys
//! against the target struct's fields ignoring case and separators, and DTO
//! fields that carry scalars use [`lenient`] so `"42"` and `42` land on the
//! same value.
//! Request bodies go through [`encode`], which emits `camelCase` keys.

mod folded;
pub mod lenient;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Decode a response body into `T` with case-insensitive property matching
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    let value: Value = serde_json::from_slice(bytes)?;
    decode_value(value)
}

/// Same as [`decode`] for an already parsed document.
///
/// Keys of objects that decode into structs are resolved against the field
/// names; keys of free-form maps and `Value`s are left as sent.
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    T::deserialize(folded::Folded::new(value))
}

/// Serialize `value` with the backend's `camelCase` property names
pub fn encode<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    Ok(rewrite_keys(value, &to_camel_case))
}

fn rewrite_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let mut rewritten = Map::with_capacity(map.len());
            for (key, inner) in map {
                rewritten.insert(convert(&key), rewrite_keys(inner, convert));
            }
            Value::Object(rewritten)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

/// Fold `PascalCase`, `camelCase`, `kebab-case` and `snake_case` onto `snake_case`.
///
/// Acronyms stay together (`NIFAcceso` becomes `nif_acceso`) and an all caps
/// key becomes a single lowercase word (`TRB` becomes `trb`).
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = if i > 0 { chars.get(i - 1).copied() } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// `codigo_barco` to `codigoBarco`; keys without underscores pass through
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (index, part) in key.split('_').filter(|p| !p.is_empty()).enumerate() {
        if index == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn snake_case_folds_backend_spellings() {
        assert_eq!(to_snake_case("CodigoBarco"), "codigo_barco");
        assert_eq!(to_snake_case("codigoBarco"), "codigo_barco");
        assert_eq!(to_snake_case("codigo_barco"), "codigo_barco");
        assert_eq!(to_snake_case("NIFAcceso"), "nif_acceso");
        assert_eq!(to_snake_case("EMailAvisos"), "e_mail_avisos");
        assert_eq!(to_snake_case("NombreB"), "nombre_b");
        assert_eq!(to_snake_case("TRB"), "trb");
        assert_eq!(to_snake_case("access_token"), "access_token");
        assert_eq!(to_snake_case("ListaEmailsEnvioAviso"), "lista_emails_envio_aviso");
    }

    #[test]
    fn camel_case_matches_backend_convention() {
        assert_eq!(to_camel_case("codigo_barco"), "codigoBarco");
        assert_eq!(to_camel_case("nombre_b"), "nombreB");
        assert_eq!(to_camel_case("trb"), "trb");
        assert_eq!(to_camel_case("lista_emails_envio_aviso"), "listaEmailsEnvioAviso");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        codigo_barco: i64,
        nombre_b: Option<String>,
        nested: Option<Vec<Inner>>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Inner {
        fecha_fin: String,
    }

    #[test]
    fn decode_is_case_insensitive_at_every_depth() {
        let body = json!({
            "CodigoBarco": 7,
            "nombreB": "Nuevo Ronsel",
            "Nested": [{ "FechaFin": "2025-01-01" }]
        });
        let sample: Sample = decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(sample.codigo_barco, 7);
        assert_eq!(sample.nombre_b.as_deref(), Some("Nuevo Ronsel"));
        assert_eq!(sample.nested.unwrap()[0].fecha_fin, "2025-01-01");
    }

    #[test]
    fn keys_differing_only_in_case_still_match() {
        let lower: Sample = decode(br#"{"codigobarco": 5, "nombreb": "Ronsel"}"#).unwrap();
        let upper: Sample = decode(br#"{"CODIGOBARCO": 6, "NOMBREB": "Ronsel"}"#).unwrap();
        let kebab: Sample = decode(br#"{"codigo-barco": 7, "Nested": [{"FECHAFIN": "x"}]}"#).unwrap();

        assert_eq!(lower.codigo_barco, 5);
        assert_eq!(lower.nombre_b.as_deref(), Some("Ronsel"));
        assert_eq!(upper.codigo_barco, 6);
        assert_eq!(upper.nombre_b.as_deref(), Some("Ronsel"));
        assert_eq!(kebab.codigo_barco, 7);
        assert_eq!(kebab.nested.unwrap()[0].fecha_fin, "x");
    }

    #[test]
    fn exact_snake_spelling_wins_over_a_looser_match() {
        #[derive(Debug, Deserialize)]
        struct Contact {
            #[serde(default)]
            email: Option<String>,
            #[serde(default)]
            e_mail: Option<String>,
        }

        let contact: Contact = decode(br#"{"EMail": "a@mar.es", "Email": "b@mar.es"}"#).unwrap();
        assert_eq!(contact.e_mail.as_deref(), Some("a@mar.es"));
        assert_eq!(contact.email.as_deref(), Some("b@mar.es"));
    }

    #[test]
    fn two_spellings_of_one_field_are_not_a_duplicate() {
        let sample: Sample = decode(br#"{"CodigoBarco": 1, "codigobarco": 1}"#).unwrap();
        assert_eq!(sample.codigo_barco, 1);
    }

    #[test]
    fn free_form_values_keep_their_keys() {
        let value: Value = decode(br#"{"CodigoBarco": 1, "inner": {"NombreB": "x"}}"#).unwrap();
        assert_eq!(value, json!({ "CodigoBarco": 1, "inner": { "NombreB": "x" } }));
    }

    #[test]
    fn encode_emits_camel_case() {
        #[derive(Serialize)]
        struct Out {
            codigo_empresa: &'static str,
            nombre_armador: &'static str,
        }
        let value = encode(&Out { codigo_empresa: "E-1", nombre_armador: "Pesca Norte" }).unwrap();
        assert_eq!(value, json!({ "codigoEmpresa": "E-1", "nombreArmador": "Pesca Norte" }));
    }
}
