//! JWT authentication.
//!
//! Dual-token system: short-lived access tokens (10 min) sent as
//! `Authorization: Bearer` headers, and long-lived refresh tokens (7 days)
//! kept in an http-only cookie. Both are stateless; nothing is stored
//! server-side, so a leaked refresh token stays valid until it expires.

mod cookie;
mod errors;
mod extractors;
mod ip;
pub mod password;
mod state;
mod types;

pub use cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
pub use errors::{AuthError, AuthErrorKind};
pub use extractors::{Auth, authenticate_bearer, require_bearer};
pub use ip::{IpSource, extract_client_ip};
pub use state::{HasAuthBackend, IssuedSession};
pub use types::AuthenticatedUser;
