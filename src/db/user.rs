use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// A stored user, including the credential hash. Never serialize this directly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for a new user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: Option<&'a str>,
    pub bio: Option<&'a str>,
}

/// Replacement profile fields for an existing user.
#[derive(Debug, Clone)]
pub struct UserUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub display_name: Option<&'a str>,
    pub bio: Option<&'a str>,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. Returns the stored user.
    pub async fn create(&self, user: &NewUser<'_>) -> Result<User, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, display_name, bio)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.display_name)
        .bind(user.bio)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, username, email, password_hash, display_name, bio, created_at, updated_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, username, email, password_hash, display_name, bio, created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Whether a user with this ID exists.
    pub async fn exists(&self, id: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// List all users, newest first.
    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, username, email, password_hash, display_name, bio, created_at, updated_at
             FROM users ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Replace a user's profile fields. Returns the updated user, or None if absent.
    pub async fn update(
        &self,
        id: &str,
        update: &UserUpdate<'_>,
    ) -> Result<Option<User>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, email = ?, display_name = ?, bio = ?,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?",
        )
        .bind(update.username)
        .bind(update.email)
        .bind(update.display_name)
        .bind(update.bio)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a user by ID. Their posts (and those posts' comments) go with them.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, is_unique_violation};

    fn alice() -> NewUser<'static> {
        NewUser {
            username: "alice",
            email: "alice@example.com",
            password_hash: "hash",
            display_name: Some("Alice"),
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = Database::open(":memory:").await.unwrap();

        let created = db.users().create(&alice()).await.unwrap();
        assert_eq!(created.username, "alice");
        assert_eq!(created.display_name.as_deref(), Some("Alice"));
        assert!(created.bio.is_none());

        let by_name = db.users().get_by_username("ALICE").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_id = db.users().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");
        assert!(db.users().exists(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users().create(&alice()).await.unwrap();
        let result = db
            .users()
            .create(&NewUser {
                email: "other@example.com",
                ..alice()
            })
            .await;

        assert!(is_unique_violation(&result.unwrap_err()));
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users().create(&alice()).await.unwrap();
        let result = db
            .users()
            .create(&NewUser {
                username: "alice2",
                ..alice()
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.users().create(&alice()).await.unwrap();

        let updated = db
            .users()
            .update(
                &user.id,
                &UserUpdate {
                    username: "alicia",
                    email: "alicia@example.com",
                    display_name: None,
                    bio: Some("hi"),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.username, "alicia");
        assert!(updated.display_name.is_none());
        assert_eq!(updated.bio.as_deref(), Some("hi"));
        assert_eq!(updated.password_hash, "hash");

        let missing = db
            .users()
            .update(
                "nope",
                &UserUpdate {
                    username: "x",
                    email: "x@example.com",
                    display_name: None,
                    bio: None,
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::open(":memory:").await.unwrap();

        db.users().create(&alice()).await.unwrap();
        db.users()
            .create(&NewUser {
                username: "bob",
                email: "bob@example.com",
                ..alice()
            })
            .await
            .unwrap();

        let users = db.users().list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "bob");
        assert_eq!(users[1].username, "alice");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = Database::open(":memory:").await.unwrap();

        let user = db.users().create(&alice()).await.unwrap();
        assert!(db.users().delete(&user.id).await.unwrap());
        assert!(!db.users().delete(&user.id).await.unwrap());
        assert!(db.users().get_by_id(&user.id).await.unwrap().is_none());
    }
}
