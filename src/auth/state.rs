//! Handler state that can mint sessions.

use super::cookie::refresh_cookie;
use crate::jwt::{Identity, JwtConfig, JwtError};

/// A freshly issued token pair, ready to hand to the client.
pub struct IssuedSession {
    /// Returned in the response body
    pub access_token: String,
    /// Set-Cookie value carrying the refresh token
    pub refresh_cookie: String,
}

/// State types that hold the token codec and cookie policy.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
    fn secure_cookies(&self) -> bool;

    /// Sign an access/refresh pair for `username`.
    fn issue_session(&self, username: &str) -> Result<IssuedSession, JwtError> {
        let identity = Identity::new(username);
        let access = self.jwt().sign_access_token(&identity)?;
        let refresh = self.jwt().sign_refresh_token(&identity)?;

        Ok(IssuedSession {
            access_token: access.token,
            refresh_cookie: refresh_cookie(&refresh.token, refresh.duration, self.secure_cookies()),
        })
    }
}

/// Implement `HasAuthBackend` for a state struct with `jwt: Arc<JwtConfig>`
/// and `secure_cookies: bool` fields.
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
            fn secure_cookies(&self) -> bool {
                self.secure_cookies
            }
        }
    };
}
