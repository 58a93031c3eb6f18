pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod codec;
pub mod config;
pub mod dto;
pub mod error;
pub mod navigation;
pub mod storage;

pub use api::{ApiClient, MutationResponse, Outcome, Payload, Query};
pub use auth::{AuthState, AuthStateProvider, Identity, LoginError, SessionContext};
pub use client::CrmClient;
pub use error::{ClientError, ClientResult};
