//! Token authentication pipeline: claim extraction, the state provider, the
//! login service, the outbound interceptor and the per-session context.

pub mod claims;
pub mod interceptor;
pub mod service;
pub mod session;
pub mod state;

pub use claims::{ClaimsError, Identity};
pub use interceptor::{AuthorizeLayer, Authorized};
pub use service::{AuthService, LoginError, LoginSuccess};
pub use session::SessionContext;
pub use state::{AuthState, AuthStateProvider};
