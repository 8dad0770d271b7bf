use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub password_hash: String,            // argon2 PHC string
    pub avatar_file_name: Option<String>, // public path, e.g. images/1-me.png
}

/// Fields needed to insert a user; the hash is computed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn create(&self, user: NewUser) -> anyhow::Result<User>;
    /// `Ok(None)` when no user has this id. `path: None` clears the avatar.
    async fn update_avatar(&self, id: i64, path: Option<&str>) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, occupation, email, password_hash, avatar_file_name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, occupation, email, password_hash, avatar_file_name
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, occupation, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, occupation, email, password_hash, avatar_file_name
            "#,
        )
        .bind(&user.name)
        .bind(&user.occupation)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn update_avatar(&self, id: i64, path: Option<&str>) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET avatar_file_name = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, name, occupation, email, password_hash, avatar_file_name
            "#,
        )
        .bind(id)
        .bind(path)
        .fetch_optional(&self.db)
        .await
        .context("update user avatar")?;
        Ok(user)
    }
}
