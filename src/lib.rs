pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use axum::{Json, Router, routing::get};
use db::Database;
use jwt::JwtConfig;
use rate_limit::{RateLimitConfig, spawn_prune_scheduler};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Signing keys and lifetimes for access and refresh tokens
    pub jwt: JwtConfig,
    /// Whether to set Secure flag on the refresh cookie (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Per-IP limits on login and signup, shared with the pruning task
    pub rate_limit: Arc<RateLimitConfig>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: ServerConfig) -> Router {
    let api_router = create_api_router(
        config.db,
        Arc::new(config.jwt),
        config.secure_cookies,
        config.rate_limit,
    );

    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api", api_router)
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Also spawns the task that keeps rate limiter memory bounded.
pub async fn run_server(
    config: ServerConfig,
    listener: TcpListener,
) -> Result<(), std::io::Error> {
    let pruner = spawn_prune_scheduler(config.rate_limit.clone());
    let app = create_app(config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let result = axum::serve(listener, make_service).await;
    pruner.abort();
    result
}
