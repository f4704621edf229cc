/// PostgreSQL implementation of [`UserStore`]
///
/// Tokens live in `user_tokens`, one row per session, and are folded back into
/// `User::tokens` (in insertion order) with an `ARRAY(...)` sub-select on every
/// user read. Avatars stay in `users.avatar` and are only selected by
/// `find_avatar`.
///
/// # Example
///
/// ```no_run
/// use taskapp_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskapp_shared::store::{PgUserStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgUserStore::new(pool);
/// let user = store.find_by_email("ann@example.com").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::db::pool::health_check;
use crate::models::{
    task::{NewTask, Task},
    user::{NewUser, User, UserChanges},
};

const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, age, created_at, updated_at,
    ARRAY(
        SELECT t.token FROM user_tokens t
        WHERE t.user_id = users.id
        ORDER BY t.id
    ) AS tokens
"#;

const TASK_COLUMNS: &str = "id, owner_id, description, completed, created_at, updated_at";

/// sqlx-backed user store
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a unique violation on the email column to `DuplicateEmail`
fn map_email_conflict(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err
            .constraint()
            .is_some_and(|constraint| constraint.contains("email"))
        {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, data), fields(email = %data.email))]
    async fn create_user(&self, data: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, age)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, age, created_at, updated_at,
                      ARRAY[]::TEXT[] AS tokens
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.age)
        .fetch_one(&self.pool)
        .await
        .map_err(map_email_conflict)?;

        debug!(user_id = %user.id, "Inserted user");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id_and_token(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        let query = format!(
            r#"
            SELECT {} FROM users
            WHERE id = $1
              AND EXISTS (
                  SELECT 1 FROM user_tokens t
                  WHERE t.user_id = users.id AND t.token = $2
              )
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, changes))]
    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if changes.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if changes.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if changes.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if changes.age.is_some() {
            bind_count += 1;
            query.push_str(&format!(", age = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 RETURNING id");

        let mut q = sqlx::query_scalar::<_, Uuid>(&query).bind(id);

        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(email) = changes.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = changes.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(age) = changes.age {
            q = q.bind(age);
        }

        let updated = q
            .fetch_optional(&self.pool)
            .await
            .map_err(map_email_conflict)?;

        match updated {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn push_token(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, token)
            SELECT $1::UUID, $2::TEXT
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $1::UUID)
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_token(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_tokens(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_avatar(
        &self,
        user_id: Uuid,
        avatar: Option<Vec<u8>>,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(avatar)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_avatar(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, StoreError> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT avatar FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(avatar,)| avatar))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_task(&self, data: NewTask) -> Result<Task, StoreError> {
        let query = format!(
            "INSERT INTO tasks (owner_id, description, completed) VALUES ($1, $2, $3) RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.owner_id)
            .bind(data.description)
            .bind(data.completed)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn tasks_owned_by(&self, owner_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let query = format!(
            "SELECT {} FROM tasks WHERE owner_id = $1 ORDER BY created_at",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    #[instrument(skip(self))]
    async fn delete_tasks_owned_by(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await?;
        Ok(())
    }
}
