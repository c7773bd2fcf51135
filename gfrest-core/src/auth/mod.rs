//! Request authentication for the REST API.
//!
//! - [`Authenticator`]: resolves signed requests to a principal.
//! - [`AuthenticationSession`]: the per-request authenticate / resolve-error
//!   pair hosts wire into their request pipeline.
//! - [`UserDirectory`]: where per-user keys come from.

mod authenticator;
mod credential;
mod directory;
mod request;
mod session;

pub use authenticator::{AuthFailure, AuthOutcome, Authenticator};
pub use credential::{Credential, PrincipalId};
pub use directory::{DirectoryError, MemoryUserDirectory, PgUserDirectory, UserDirectory};
pub use request::RestRequest;
pub use session::AuthenticationSession;

/// Structured authentication error: code, message and HTTP status.
pub type AuthError = gfrest_sdk::objects::RestErrorBody;
