//! Token refresh and logout.
//!
//! - GET `/refresh` - Mint a new access token from the `refreshToken` cookie
//! - POST `/logout` - Clear the `refreshToken` cookie

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{
    AuthError, AuthErrorKind, HasAuthBackend, REFRESH_COOKIE_NAME, clear_refresh_cookie,
    get_cookie,
};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(AuthState);

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/refresh", get(refresh))
        .route("/logout", post(logout))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// The refresh token is neither rotated nor recorded; it stays valid until it expires.
async fn refresh(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, AuthError> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .filter(|t| !t.is_empty())
        .ok_or(AuthErrorKind::MissingRefreshToken)?;

    let claims = state.jwt().verify_refresh_token(token).map_err(|e| {
        debug!(error = %e, "Rejected refresh token");
        AuthErrorKind::InvalidRefreshToken
    })?;

    let access = state
        .jwt()
        .sign_access_token(&claims.identity())
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sign access token");
            AuthErrorKind::InvalidRefreshToken
        })?;

    Ok(Json(RefreshResponse {
        access_token: access.token,
    }))
}

async fn logout(State(state): State<AuthState>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_refresh_cookie(state.secure_cookies()))],
    )
}
