//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with separate secrets, so a token of
//! one class never verifies as the other.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived bearer token sent on every protected request
    Access,
    /// Long-lived token kept in an http-only cookie, only used to refresh
    Refresh,
}

/// The identity a token is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// JWT claims embedded in both token classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username
    pub username: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl TokenClaims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.username.clone())
    }
}

/// Access token duration: 10 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 10 * 60;

/// Refresh token duration: 7 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Signing and verification keys for one token class.
#[derive(Clone)]
struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    duration: u64,
}

impl TokenKeys {
    fn new(secret: &[u8], duration: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            duration,
        }
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    access: TokenKeys,
    refresh: TokenKeys,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// The JWT token string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secrets and default durations.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access: TokenKeys::new(access_secret, ACCESS_TOKEN_DURATION_SECS),
            refresh: TokenKeys::new(refresh_secret, REFRESH_TOKEN_DURATION_SECS),
        }
    }

    /// Override the validity windows (in seconds).
    pub fn with_durations(mut self, access_secs: u64, refresh_secs: u64) -> Self {
        self.access.duration = access_secs;
        self.refresh.duration = refresh_secs;
        self
    }

    pub fn access_duration(&self) -> u64 {
        self.access.duration
    }

    pub fn refresh_duration(&self) -> u64 {
        self.refresh.duration
    }

    /// Sign a short-lived access token for the given identity.
    pub fn sign_access_token(&self, identity: &Identity) -> Result<SignedToken, JwtError> {
        sign(&self.access, identity, TokenType::Access)
    }

    /// Sign a long-lived refresh token for the given identity.
    pub fn sign_refresh_token(&self, identity: &Identity) -> Result<SignedToken, JwtError> {
        sign(&self.refresh, identity, TokenType::Refresh)
    }

    /// Validate and decode an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenClaims, JwtError> {
        verify(&self.access, token, TokenType::Access)
    }

    /// Validate and decode a refresh token.
    pub fn verify_refresh_token(&self, token: &str) -> Result<TokenClaims, JwtError> {
        verify(&self.refresh, token, TokenType::Refresh)
    }
}

fn sign(
    keys: &TokenKeys,
    identity: &Identity,
    token_type: TokenType,
) -> Result<SignedToken, JwtError> {
    if identity.username.is_empty() {
        return Err(JwtError::EmptyUsername);
    }

    let now = now_secs()?;
    let exp = now + keys.duration;

    let claims = TokenClaims {
        username: identity.username.clone(),
        token_type,
        iat: now,
        exp,
    };

    let token = jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(JwtError::Encoding)?;

    Ok(SignedToken {
        token,
        expires_at: exp,
        duration: keys.duration,
    })
}

fn verify(keys: &TokenKeys, token: &str, expected: TokenType) -> Result<TokenClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = jsonwebtoken::decode::<TokenClaims>(token, &keys.decoding_key, &validation)
        .map_err(JwtError::Decoding)?;

    if token_data.claims.token_type != expected {
        return Err(JwtError::WrongTokenType);
    }

    Ok(token_data.claims)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Tried to sign a token without a username
    EmptyUsername,
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Error decoding the token (bad signature, malformed, expired)
    Decoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::EmptyUsername => write!(f, "Username cannot be empty"),
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for JwtError {}
