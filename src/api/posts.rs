//! Post API endpoints. All routes are public.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ResultExt, body_or_default, is_valid_id, trimmed};
use crate::db::{Database, NewPost, Post};

#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
}

pub fn router(state: PostsState) -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PostRequest {
    title: Option<String>,
    content: Option<String>,
    user_id: Option<String>,
    publish_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    user_id: Option<String>,
    /// Older clients filter by `sender`.
    sender: Option<String>,
}

#[derive(Serialize)]
struct PostListResponse {
    data: Vec<Post>,
}

#[derive(Serialize)]
struct CreatePostResponse {
    message: &'static str,
    data: Post,
}

#[derive(Serialize)]
struct GetPostResponse {
    post: Post,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostResponse {
    message: &'static str,
    updated_post: Post,
}

// --- Helpers ---

/// Check the author ID is well formed and refers to an existing user.
async fn require_author(db: &Database, user_id: &str) -> Result<(), ApiError> {
    if !is_valid_id(user_id) {
        return Err(ApiError::bad_request("Invalid userId"));
    }
    let exists = db
        .users()
        .exists(user_id)
        .await
        .internal_err("Failed to look up user")?;
    if !exists {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(())
}

// --- Handlers ---

async fn create_post(
    State(state): State<PostsState>,
    body: Result<Json<PostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = body_or_default(body);
    let (Some(title), Some(content), Some(user_id)) = (
        trimmed(&payload.title),
        trimmed(&payload.content),
        trimmed(&payload.user_id),
    ) else {
        return Err(ApiError::bad_request(
            "title, content, and userId are required",
        ));
    };

    require_author(&state.db, user_id).await?;

    let post = state
        .db
        .posts()
        .create(&NewPost {
            title,
            content,
            user_id,
            publish_date: trimmed(&payload.publish_date),
        })
        .await
        .internal_err("Failed to create post")?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            message: "Post created successfully",
            data: post,
        }),
    ))
}

async fn list_posts(
    State(state): State<PostsState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = trimmed(&query.user_id).or(trimmed(&query.sender));

    if user_id.is_some_and(|id| !is_valid_id(id)) {
        return Err(ApiError::bad_request("Invalid userId"));
    }

    let posts = state
        .db
        .posts()
        .list(user_id)
        .await
        .internal_err("Failed to fetch posts")?;

    Ok(Json(PostListResponse { data: posts }))
}

async fn get_post(
    State(state): State<PostsState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_id(&id) {
        return Err(ApiError::not_found("Post not found"));
    }

    let post = state
        .db
        .posts()
        .get_by_id(&id)
        .await
        .internal_err("Failed to fetch post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(GetPostResponse { post }))
}

async fn update_post(
    State(state): State<PostsState>,
    Path(id): Path<String>,
    body: Result<Json<PostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = body_or_default(body);
    let (Some(title), Some(content), Some(user_id), Some(publish_date)) = (
        trimmed(&payload.title),
        trimmed(&payload.content),
        trimmed(&payload.user_id),
        trimmed(&payload.publish_date),
    ) else {
        return Err(ApiError::bad_request(
            "title, content, userId, and publishDate are required",
        ));
    };

    if !is_valid_id(&id) {
        return Err(ApiError::not_found("Post not found"));
    }

    require_author(&state.db, user_id).await?;

    let post = state
        .db
        .posts()
        .update(
            &id,
            &NewPost {
                title,
                content,
                user_id,
                publish_date: Some(publish_date),
            },
        )
        .await
        .internal_err("Failed to update post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(UpdatePostResponse {
        message: "Post updated successfully",
        updated_post: post,
    }))
}
