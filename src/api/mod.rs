mod auth;
mod comments;
mod error;
mod posts;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;
pub use users::UsersState;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
    rate_limit: Arc<RateLimitConfig>,
) -> Router {
    let auth_state = auth::AuthState {
        jwt: jwt.clone(),
        secure_cookies,
    };

    let posts_state = posts::PostsState { db: db.clone() };

    let comments_state = comments::CommentsState { db: db.clone() };

    let users_state = users::UsersState {
        db,
        jwt,
        secure_cookies,
        rate_limit,
    };

    Router::new()
        .nest("/users", users::router(users_state))
        .nest("/auth", auth::router(auth_state))
        .nest("/posts", posts::router(posts_state))
        .nest("/comments", comments::router(comments_state))
}
