//! User accounts, signup and login.
//!
//! - POST `/` - Create an account, returns an access token and sets the refresh cookie
//! - POST `/login` - Exchange username/password for a token pair
//! - GET `/`, GET/PUT/DELETE `/{id}` - Bearer-protected account management

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{ApiError, ResultExt, body_or_default, is_valid_id, trimmed};
use crate::auth::{
    Auth, HasAuthBackend, password::hash_password_blocking, password::verify_password_blocking,
    require_bearer,
};
use crate::db::{Database, NewUser, User, UserUpdate, is_unique_violation};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
    pub rate_limit: Arc<RateLimitConfig>,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    let signup_router = Router::new()
        .route("/", post(create_user))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_signup,
        ));

    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_login,
        ));

    let protected_router = Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(state.clone())
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            require_bearer,
        ));

    Router::new()
        .merge(signup_router)
        .merge(login_router)
        .merge(protected_router)
}

// --- Request/Response types ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    display_name: Option<String>,
    bio: Option<String>,
}

#[derive(Deserialize, Default)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    username: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    bio: Option<String>,
}

/// Public view of a user. The password hash never leaves the store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: String,
    username: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            bio: user.bio,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
struct CreateUserResponse {
    message: &'static str,
    data: UserResponse,
    token: String,
}

#[derive(Serialize)]
struct UserListResponse {
    data: Vec<UserResponse>,
}

#[derive(Serialize)]
struct UserDataResponse {
    data: UserResponse,
}

#[derive(Serialize)]
struct UpdateUserResponse {
    message: &'static str,
    data: UserResponse,
}

// --- Helpers ---

fn validate_user_id(id: &str) -> Result<(), ApiError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid userId"))
    }
}

// --- Handlers ---

async fn create_user(
    State(state): State<UsersState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = body_or_default(body);
    let (Some(username), Some(email), Some(password)) = (
        trimmed(&payload.username),
        trimmed(&payload.email),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "username, email and password are required",
        ));
    };

    let password_hash = hash_password_blocking(password.to_string())
        .await
        .internal_err("Failed to hash password")?;

    let user = state
        .db
        .users()
        .create(&NewUser {
            username,
            email,
            password_hash: &password_hash,
            display_name: trimmed(&payload.display_name),
            bio: trimmed(&payload.bio),
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                debug!(username = %username, "Username or email already taken");
            } else {
                warn!(error = %e, "Failed to create user");
            }
            ApiError::bad_request("Failed to create user")
        })?;

    let session = state
        .issue_session(&user.username)
        .internal_err("Failed to generate token")?;
    info!(user_id = %user.id, username = %user.username, "User created");

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session.refresh_cookie)],
        Json(CreateUserResponse {
            message: "User created successfully",
            data: user.into(),
            token: session.access_token,
        }),
    ))
}

/// Unknown users, wrong passwords and incomplete bodies all get the same 401.
async fn login(
    State(state): State<UsersState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = body_or_default(body);
    let rejected = || ApiError::unauthorized("Username or password is incorrect");

    let (Some(username), Some(password)) = (
        trimmed(&payload.username),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(rejected());
    };

    let user = state
        .db
        .users()
        .get_by_username(username)
        .await
        .internal_err("Login failed")?;

    let Some(user) = user else {
        debug!(username = %username, "Login for unknown user");
        return Err(rejected());
    };

    let matches = verify_password_blocking(password, user.password_hash.clone())
        .await
        .internal_err("Login failed")?;

    if !matches {
        debug!(username = %username, "Login with wrong password");
        return Err(rejected());
    }

    let session = state
        .issue_session(&user.username)
        .internal_err("Failed to generate token")?;

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, session.refresh_cookie)],
        session.access_token,
    ))
}

async fn list_users(
    State(state): State<UsersState>,
    Auth(_user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .db
        .users()
        .list()
        .await
        .internal_err("Failed to fetch users")?;

    Ok(Json(UserListResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}

async fn get_user(
    State(state): State<UsersState>,
    Auth(_user): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_user_id(&id)?;

    let user = state
        .db
        .users()
        .get_by_id(&id)
        .await
        .internal_err("Failed to fetch user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserDataResponse { data: user.into() }))
}

async fn update_user(
    State(state): State<UsersState>,
    Auth(_user): Auth,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = body_or_default(body);
    validate_user_id(&id)?;

    let (Some(username), Some(email)) = (trimmed(&payload.username), trimmed(&payload.email))
    else {
        return Err(ApiError::bad_request("username and email are required"));
    };

    let user = state
        .db
        .users()
        .update(
            &id,
            &UserUpdate {
                username,
                email,
                display_name: trimmed(&payload.display_name),
                bio: trimmed(&payload.bio),
            },
        )
        .await
        .map_err(|e| {
            if !is_unique_violation(&e) {
                warn!(error = %e, "Failed to update user");
            }
            ApiError::bad_request("Failed to update user")
        })?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UpdateUserResponse {
        message: "User updated successfully",
        data: user.into(),
    }))
}

async fn delete_user(
    State(state): State<UsersState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_user_id(&id)?;

    let deleted = state
        .db
        .users()
        .delete(&id)
        .await
        .internal_err("Failed to delete user")?;

    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    info!(user_id = %id, by = %user.username(), "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
