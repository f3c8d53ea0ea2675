//! Bearer-token middleware and the extractor that reads its result.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::errors::{AuthError, AuthErrorKind};
use super::types::AuthenticatedUser;
use crate::jwt::JwtConfig;

const BEARER_PREFIX: &str = "Bearer ";

/// Validate the `Authorization: Bearer <token>` header against the access secret.
pub fn authenticate_bearer(
    headers: &HeaderMap,
    jwt: &JwtConfig,
) -> Result<AuthenticatedUser, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::new(AuthErrorKind::MissingAuthHeader))?;

    let claims = jwt.verify_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AuthError::new(AuthErrorKind::InvalidToken)
    })?;

    Ok(AuthenticatedUser { claims })
}

/// Middleware gating a router behind a valid access token.
///
/// On success the decoded identity is stored in the request extensions and the
/// request continues untouched; the middleware never writes a response itself.
pub async fn require_bearer(
    State(jwt): State<Arc<JwtConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate_bearer(request.headers(), &jwt)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for handlers behind `require_bearer`.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::new(AuthErrorKind::MissingAuthHeader))
    }
}
