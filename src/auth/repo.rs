use crate::auth::repo_types::{CreateUserError, User};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, last_seen, created_at";

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    pub async fn username_taken(db: &PgPool, username: &str) -> anyhow::Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(db)
                .await
                .context("check username taken")?;
        Ok(taken)
    }

    pub async fn email_taken(db: &PgPool, email: &str) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(db)
            .await
            .context("check email taken")?;
        Ok(taken)
    }

    /// Insert a new user. Unique-constraint violations map to
    /// [`CreateUserError::Taken`] so concurrent registrations cannot both win.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, CreateUserError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => CreateUserError::Taken,
            _ => CreateUserError::Db(e),
        })
    }

    /// Bump `last_seen`; returns `None` when the user no longer exists.
    pub async fn touch_last_seen(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET last_seen = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("touch last_seen")?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;

    #[sqlx::test]
    async fn create_rejects_duplicate_username_and_email(pool: PgPool) {
        let hash = hash_password("long-enough-pw").unwrap();
        User::create(&pool, "elena", "elena@example.com", &hash).await.unwrap();

        let same_name = User::create(&pool, "elena", "other@example.com", &hash).await;
        assert!(matches!(same_name, Err(CreateUserError::Taken)));

        let same_email = User::create(&pool, "other", "elena@example.com", &hash).await;
        assert!(matches!(same_email, Err(CreateUserError::Taken)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    async fn touch_last_seen_moves_forward(pool: PgPool) {
        let hash = hash_password("long-enough-pw").unwrap();
        let user = User::create(&pool, "ivan", "ivan@example.com", &hash).await.unwrap();

        let touched = User::touch_last_seen(&pool, user.id).await.unwrap().unwrap();
        assert!(touched.last_seen >= user.last_seen);
        assert!(User::touch_last_seen(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }
}
