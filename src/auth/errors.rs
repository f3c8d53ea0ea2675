//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why an authentication attempt was rejected.
///
/// The kind is never exposed beyond its fixed message: expired, forged and
/// malformed tokens all collapse into the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    MissingAuthHeader,
    InvalidToken,
    MissingRefreshToken,
    InvalidRefreshToken,
}

/// Unauthorized failure reported as `{statusCode, message}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    pub fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::MissingAuthHeader => "Missing or invalid Authorization header",
            AuthErrorKind::InvalidToken => "Invalid or expired token",
            AuthErrorKind::MissingRefreshToken => "Missing refresh token",
            AuthErrorKind::InvalidRefreshToken => "Invalid or expired refresh token",
        }
    }
}

impl From<AuthErrorKind> for AuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthError {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    status_code: u16,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(ErrorResponse {
                status_code: status.as_u16(),
                message: self.message(),
            }),
        )
            .into_response()
    }
}
