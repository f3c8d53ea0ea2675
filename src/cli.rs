//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::IpSource;
use crate::db::Database;
use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS, JwtConfig};
use crate::rate_limit::{DEFAULT_LOGIN_PER_MINUTE, DEFAULT_SIGNUP_PER_MINUTE, RateLimitConfig};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

const ACCESS_SECRET_ENV: &str = "JWT_ACCESS_SECRET";
const REFRESH_SECRET_ENV: &str = "JWT_REFRESH_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "postboard",
    about = "Users, posts and comments behind JWT authentication"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Path to SQLite database file (":memory:" for a throwaway database)
    #[arg(short, long, env = "DATABASE_URL", default_value = "postboard.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer the JWT_ACCESS_SECRET env var
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer the JWT_REFRESH_SECRET env var
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = ACCESS_TOKEN_DURATION_SECS)]
    pub access_token_ttl: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = REFRESH_TOKEN_DURATION_SECS)]
    pub refresh_token_ttl: u64,

    /// Omit the Secure flag on the refresh cookie (plain-HTTP development only)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// Read the client IP from this header (e.g. X-Forwarded-For) instead of the socket.
    /// Only use behind a reverse proxy that sets it
    #[arg(long)]
    pub ip_header: Option<String>,

    /// Login attempts allowed per IP per minute
    #[arg(long, default_value_t = DEFAULT_LOGIN_PER_MINUTE)]
    pub login_per_minute: u32,

    /// Signups allowed per IP per minute
    #[arg(long, default_value_t = DEFAULT_SIGNUP_PER_MINUTE)]
    pub signup_per_minute: u32,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a secret from an environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
fn load_secret(env_var: &str, secret_file: Option<&str>, flag: &str) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the {} environment variable (recommended) or use --{}",
            env_var, env_var, flag
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "{} is shorter than {} characters. Use a longer secret",
            env_var, MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Access and refresh signing secrets.
pub struct Secrets {
    pub access: String,
    pub refresh: String,
}

/// Load both signing secrets. They must be distinct so that one class of token
/// can never verify as the other.
pub fn load_secrets(args: &Args) -> Option<Secrets> {
    let access = load_secret(
        ACCESS_SECRET_ENV,
        args.access_secret_file.as_deref(),
        "access-secret-file",
    )?;
    let refresh = load_secret(
        REFRESH_SECRET_ENV,
        args.refresh_secret_file.as_deref(),
        "refresh-secret-file",
    )?;
    validate_secrets(access, refresh)
}

fn validate_secrets(access: String, refresh: String) -> Option<Secrets> {
    if access == refresh {
        error!(
            "{} and {} must be different",
            ACCESS_SECRET_ENV, REFRESH_SECRET_ENV
        );
        return None;
    }
    Some(Secrets { access, refresh })
}

/// Build ServerConfig from validated arguments.
/// Returns None and logs an error if an argument is invalid.
pub fn build_config(args: &Args, db: Database, secrets: Secrets) -> Option<ServerConfig> {
    let ip_source = match IpSource::parse(args.ip_header.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "Invalid --ip-header");
            return None;
        }
    };

    if args.access_token_ttl == 0 || args.refresh_token_ttl == 0 {
        error!("Token lifetimes must be greater than zero");
        return None;
    }

    let jwt = JwtConfig::new(secrets.access.as_bytes(), secrets.refresh.as_bytes())
        .with_durations(args.access_token_ttl, args.refresh_token_ttl);

    Some(ServerConfig {
        db,
        jwt,
        secure_cookies: !args.insecure_cookies,
        rate_limit: Arc::new(RateLimitConfig::new(
            args.login_per_minute,
            args.signup_per_minute,
            ip_source,
        )),
    })
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
