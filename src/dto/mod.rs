//! Mirrors of the backend records.
//!
//! Field names follow the backend's property names in `snake_case`; the codec
//! takes care of the casing on the wire. Scalars go through
//! [`lenient`](crate::codec::lenient) because the backend sends ids and
//! amounts either as numbers or as strings.

pub mod auth;
pub mod boat;
pub mod catalog;
pub mod company;
pub mod guild;
pub mod notice;
pub mod person;
pub mod procedure;
pub mod user;

pub use auth::{LoginRequest, LoginResponse, LoginUser};
pub use boat::Boat;
pub use catalog::{ProcedureStatus, ProcedureType};
pub use company::Company;
pub use guild::Guild;
pub use notice::Notice;
pub use person::Person;
pub use procedure::{Procedure, Validity};
pub use user::User;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A backend record with its REST endpoints.
///
/// `COLLECTION` serves listing and creation, `ITEM` is the base for
/// `ITEM/{key}` updates and deletes. They differ for a few resources
/// (`api/BarcosTramites` vs `api/BarcosTramite`).
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const ITEM: &'static str;

    fn key(&self) -> String;
}
