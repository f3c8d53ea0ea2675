//! Authentication user types.

use crate::jwt::TokenClaims;

/// Identity attached to a request after its bearer token verified.
/// Lives in the request extensions for the duration of one request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// JWT claims from the access token
    pub claims: TokenClaims,
}

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.claims.username
    }
}
