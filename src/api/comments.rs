//! Comment API endpoints. All routes are public.
//!
//! - POST `/` - Comment on a post
//! - GET `/post/{post_id}` - A post's comments, newest first
//! - GET/PUT/DELETE `/{id}` - A single comment

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ResultExt, body_or_default, is_valid_id, trimmed};
use crate::db::{Comment, Database};

#[derive(Clone)]
pub struct CommentsState {
    pub db: Database,
}

pub fn router(state: CommentsState) -> Router {
    Router::new()
        .route("/", post(create_comment))
        .route("/post/{post_id}", get(list_comments))
        .route(
            "/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .with_state(state)
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest {
    owner: Option<String>,
    post_id: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct UpdateCommentRequest {
    content: Option<String>,
}

#[derive(Serialize)]
struct CommentListResponse {
    count: usize,
    data: Vec<Comment>,
}

#[derive(Serialize)]
struct CommentDataResponse {
    data: Comment,
}

#[derive(Serialize)]
struct CommentMessageResponse {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Comment>,
}

async fn require_post(db: &Database, post_id: &str) -> Result<(), ApiError> {
    let exists = is_valid_id(post_id)
        && db
            .posts()
            .exists(post_id)
            .await
            .internal_err("Failed to look up post")?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::not_found("Post not found"))
    }
}

async fn create_comment(
    State(state): State<CommentsState>,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = body_or_default(body);
    let (Some(owner), Some(post_id), Some(content)) = (
        trimmed(&payload.owner),
        trimmed(&payload.post_id),
        trimmed(&payload.content),
    ) else {
        return Err(ApiError::bad_request(
            "Owner, postId, and content are required",
        ));
    };

    require_post(&state.db, post_id).await?;

    let comment = state
        .db
        .comments()
        .create(post_id, owner, content)
        .await
        .internal_err("Failed to create comment")?;

    Ok((
        StatusCode::CREATED,
        Json(CommentMessageResponse {
            message: "Comment created successfully",
            data: Some(comment),
        }),
    ))
}

async fn list_comments(
    State(state): State<CommentsState>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_post(&state.db, &post_id).await?;

    let comments = state
        .db
        .comments()
        .list_by_post(&post_id)
        .await
        .internal_err("Failed to fetch comments")?;

    Ok(Json(CommentListResponse {
        count: comments.len(),
        data: comments,
    }))
}

async fn get_comment(
    State(state): State<CommentsState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = if is_valid_id(&id) {
        state
            .db
            .comments()
            .get_by_id(&id)
            .await
            .internal_err("Failed to fetch comment")?
    } else {
        None
    };

    let comment = comment.ok_or_else(|| ApiError::not_found("Comment not found"))?;
    Ok(Json(CommentDataResponse { data: comment }))
}

async fn update_comment(
    State(state): State<CommentsState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = body_or_default(body);
    let Some(content) = trimmed(&payload.content) else {
        return Err(ApiError::bad_request("Content is required"));
    };

    if !is_valid_id(&id) {
        return Err(ApiError::not_found("Comment not found"));
    }

    let comment = state
        .db
        .comments()
        .update(&id, content)
        .await
        .internal_err("Failed to update comment")?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    Ok(Json(CommentMessageResponse {
        message: "Comment updated successfully",
        data: Some(comment),
    }))
}

async fn delete_comment(
    State(state): State<CommentsState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = is_valid_id(&id)
        && state
            .db
            .comments()
            .delete(&id)
            .await
            .internal_err("Failed to delete comment")?;

    if !deleted {
        return Err(ApiError::not_found("Comment not found"));
    }

    Ok(Json(CommentMessageResponse {
        message: "Comment deleted successfully",
        data: None,
    }))
}
