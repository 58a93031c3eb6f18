pub mod client;
pub mod envelope;
pub mod query;
pub mod upload;

pub use client::ApiClient;
pub use envelope::{MutationResponse, Operation, Outcome, Payload, ResponseEnvelope};
pub use query::Query;
pub use upload::{StoredDocument, UploadFile, UploadOptions};
