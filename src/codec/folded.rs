//! A `serde_json::Value` deserializer that resolves object keys against the
//! field list serde hands to `deserialize_struct`.

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

use super::to_snake_case;

pub(crate) struct Folded(Value);

impl Folded {
    pub(crate) fn new(value: Value) -> Self {
        Self(value)
    }
}

/// Lowercase with every separator dropped: `CODIGO_BARCO`, `codigoBarco` and
/// `codigobarco` all give `codigobarco`
fn flat(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Field a wire key belongs to. The snake_case spelling is tried first so
/// that `EMail` stays on `e_mail` when a struct also has `email`.
fn resolve(key: String, fields: &'static [&'static str]) -> String {
    let snake = to_snake_case(&key);
    if fields.contains(&snake.as_str()) {
        return snake;
    }
    let wanted = flat(&key);
    fields
        .iter()
        .find(|field| flat(field) == wanted)
        .map(|field| field.to_string())
        .unwrap_or(snake)
}

fn resolve_keys(map: Map<String, Value>, fields: &'static [&'static str]) -> Map<String, Value> {
    let mut resolved = Map::with_capacity(map.len());
    for (key, value) in map {
        resolved.insert(resolve(key, fields), value);
    }
    resolved
}

impl<'de> Deserializer<'de> for Folded {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => visitor.visit_seq(FoldedSeq {
                items: items.into_iter(),
            }),
            Value::Object(map) => visitor.visit_map(FoldedMap::new(map)),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(Folded(other)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(FoldedMap::new(resolve_keys(map, fields))),
            other => Folded(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

struct FoldedSeq {
    items: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for FoldedSeq {
    type Error = serde_json::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        match self.items.next() {
            Some(item) => seed.deserialize(Folded(item)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct FoldedMap {
    entries: serde_json::map::IntoIter,
    pending: Option<Value>,
}

impl FoldedMap {
    fn new(map: Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for FoldedMap {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.entries.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(Value::String(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        match self.pending.take() {
            Some(value) => seed.deserialize(Folded(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }
}
