//! The `{ success, message, data }` wrapper returned by every mutating call.
//!
//! The raw `data` member is untyped on the wire. [`MutationResponse`] replaces
//! it with an [`Outcome`] tagged by the operation that produced it, so callers
//! match on known shapes.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::codec::{self, lenient};

use super::upload::StoredDocument;

/// Envelope exactly as the backend sends it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, with = "lenient::option")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    /// Read a decoded body as an envelope.
    ///
    /// A body without a `success` member is not an envelope; the backend
    /// answered with the bare payload, which is taken as a success carrying
    /// that payload.
    pub fn from_body(body: Value) -> Result<Self, serde_json::Error> {
        let is_envelope = matches!(
            &body,
            Value::Object(map) if map.keys().any(|key| codec::to_snake_case(key) == "success")
        );
        if is_envelope {
            return codec::decode_value(body);
        }

        match body {
            Value::Null => Ok(Self::succeeded(None)),
            other => Ok(Self::succeeded(Some(other))),
        }
    }

    pub fn succeeded(data: Option<Value>) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Upload,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// What the backend put in `data`
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Empty,
    Entity(T),
    /// A bare scalar, usually the key of the affected record or a stored path
    Key(String),
    Other(Value),
}

impl<T: DeserializeOwned> Payload<T> {
    pub fn from_data(data: Option<Value>) -> Self {
        match data {
            None | Some(Value::Null) => Payload::Empty,
            Some(Value::String(text)) if text.trim().is_empty() => Payload::Empty,
            Some(Value::String(text)) => Payload::Key(text),
            Some(Value::Number(number)) => Payload::Key(number.to_string()),
            Some(value @ Value::Object(_)) => match codec::decode_value::<T>(value.clone()) {
                Ok(entity) => Payload::Entity(entity),
                Err(e) => {
                    tracing::debug!("Envelope data is not the expected record: {}", e);
                    Payload::Other(value)
                }
            },
            Some(other) => Payload::Other(other),
        }
    }
}

impl<T> Payload<T> {
    pub fn entity(&self) -> Option<&T> {
        match self {
            Payload::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn into_entity(self) -> Option<T> {
        match self {
            Payload::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Payload::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

/// Result data of a mutation, tagged by the operation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Created(Payload<T>),
    Updated(Payload<T>),
    Deleted(Payload<T>),
    Uploaded(Payload<StoredDocument>),
}

impl<T> Outcome<T> {
    pub fn operation(&self) -> Operation {
        match self {
            Outcome::Created(_) => Operation::Create,
            Outcome::Updated(_) => Operation::Update,
            Outcome::Deleted(_) => Operation::Delete,
            Outcome::Uploaded(_) => Operation::Upload,
        }
    }

    /// The record payload; `None` for uploads
    pub fn payload(&self) -> Option<&Payload<T>> {
        match self {
            Outcome::Created(p) | Outcome::Updated(p) | Outcome::Deleted(p) => Some(p),
            Outcome::Uploaded(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub outcome: Outcome<T>,
}

impl<T: DeserializeOwned> MutationResponse<T> {
    pub fn from_envelope(operation: Operation, envelope: ResponseEnvelope) -> Self {
        let outcome = match operation {
            Operation::Create => Outcome::Created(Payload::from_data(envelope.data)),
            Operation::Update => Outcome::Updated(Payload::from_data(envelope.data)),
            Operation::Delete => Outcome::Deleted(Payload::from_data(envelope.data)),
            Operation::Upload => Outcome::Uploaded(Payload::from_data(envelope.data)),
        };
        Self {
            success: envelope.success,
            message: envelope.message.filter(|m| !m.trim().is_empty()),
            outcome,
        }
    }

    /// A 2xx answer with no body
    pub fn empty_success(operation: Operation) -> Self {
        Self::from_envelope(operation, ResponseEnvelope::succeeded(None))
    }
}

impl<T> MutationResponse<T> {
    pub fn entity(&self) -> Option<&T> {
        self.outcome.payload().and_then(Payload::entity)
    }

    /// Key of the affected record, from a scalar payload
    pub fn key(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Uploaded(payload) => payload.key(),
            other => other.payload().and_then(Payload::key),
        }
    }

    /// Where an upload was stored
    pub fn document_location(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Uploaded(Payload::Key(path)) => Some(path),
            Outcome::Uploaded(Payload::Entity(document)) => document.location(),
            _ => None,
        }
    }

    /// The backend message, or a generic one for the operation
    pub fn message_or_default(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None if self.success => format!("{} succeeded", self.outcome.operation()),
            None => format!("{} failed", self.outcome.operation()),
        }
    }
}
