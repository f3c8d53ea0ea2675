//! Post storage.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

/// A post as stored and as returned by the API.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub publish_date: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating or replacing a post.
#[derive(Debug, Clone)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub user_id: &'a str,
    /// Defaults to the current time when absent.
    pub publish_date: Option<&'a str>,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post. Returns the stored post.
    pub async fn create(&self, post: &NewPost<'_>) -> Result<Post, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO posts (id, user_id, title, content, publish_date)
             VALUES (?, ?, ?, ?, COALESCE(?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))",
        )
        .bind(&id)
        .bind(post.user_id)
        .bind(post.title)
        .bind(post.content)
        .bind(post.publish_date)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, title, content, user_id, publish_date, created_at, updated_at
             FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Whether a post with this ID exists.
    pub async fn exists(&self, id: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// List posts, optionally only those of one user, latest publish date first.
    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, title, content, user_id, publish_date, created_at, updated_at
             FROM posts WHERE (?1 IS NULL OR user_id = ?1)
             ORDER BY publish_date DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Replace a post's fields. Returns the updated post, or None if absent.
    pub async fn update(&self, id: &str, post: &NewPost<'_>) -> Result<Option<Post>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, user_id = ?,
             publish_date = COALESCE(?, publish_date),
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?",
        )
        .bind(post.title)
        .bind(post.content)
        .bind(post.user_id)
        .bind(post.publish_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }
}
