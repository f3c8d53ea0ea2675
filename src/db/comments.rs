//! Comment storage.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub owner: String,
    pub post_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a comment on a post. Returns the stored comment.
    pub async fn create(
        &self,
        post_id: &str,
        owner: &str,
        content: &str,
    ) -> Result<Comment, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO comments (id, post_id, owner, content) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(post_id)
            .bind(owner)
            .bind(content)
            .execute(&self.pool)
            .await?;

        self.get_by_id(&id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, owner, post_id, content, created_at, updated_at
             FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List a post's comments, newest first.
    pub async fn list_by_post(&self, post_id: &str) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, owner, post_id, content, created_at, updated_at
             FROM comments WHERE post_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Replace a comment's content. Returns the updated comment, or None if absent.
    pub async fn update(&self, id: &str, content: &str) -> Result<Option<Comment>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE comments SET content = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?",
        )
        .bind(content)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
