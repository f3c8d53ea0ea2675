//! Rate limiting for credential endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password guessing
//! and signup spam.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tracing::debug;

use crate::auth::{IpSource, extract_client_ip};

/// Default login attempts per IP per minute.
pub const DEFAULT_LOGIN_PER_MINUTE: u32 = 10;

/// Default signups per IP per minute.
pub const DEFAULT_SIGNUP_PER_MINUTE: u32 = 5;

/// Interval between sweeps of idle client buckets.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for credential endpoints.
pub struct RateLimitConfig {
    /// Per-IP limiter for `POST /api/users/login`
    pub login: IpLimiter,
    /// Per-IP limiter for `POST /api/users`
    pub signup: IpLimiter,
    /// Where the client IP is read from
    pub ip_source: IpSource,
}

impl RateLimitConfig {
    /// Create limiters allowing the given number of requests per IP per minute.
    /// Zero is treated as one.
    pub fn new(login_per_minute: u32, signup_per_minute: u32, ip_source: IpSource) -> Self {
        Self {
            login: RateLimiter::keyed(per_minute(login_per_minute)),
            signup: RateLimiter::keyed(per_minute(signup_per_minute)),
            ip_source,
        }
    }

    /// Forget clients whose buckets have refilled completely.
    /// Without this the keyed store grows with every distinct client IP.
    pub fn prune(&self) {
        self.login.retain_recent();
        self.signup.retain_recent();
        self.login.shrink_to_fit();
        self.signup.shrink_to_fit();
    }

    fn check(&self, limiter: &IpLimiter, request: &Request) -> Result<(), Response> {
        let ip = extract_client_ip(request, &self.ip_source).map_err(|reason| {
            debug!(reason, "Unable to determine client IP");
            (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response()
        })?;

        limiter.check_key(&ip).map_err(|_| {
            debug!(ip = %ip, path = %request.uri().path(), "Rate limited");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please try again later.",
            )
                .into_response()
        })
    }
}

fn per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}

/// Spawn a background task that prunes idle buckets periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_prune_scheduler(config: Arc<RateLimitConfig>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);

        loop {
            interval.tick().await;
            config.prune();
        }
    })
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.check(&config.login, &request) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

/// Middleware for rate limiting user creation.
pub async fn rate_limit_signup(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.check(&config.signup, &request) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}
