/// User store abstraction
///
/// Everything that persists users, their session tokens, avatars and tasks
/// goes through the [`UserStore`] trait. Two implementations exist:
///
/// - [`PgUserStore`]: PostgreSQL via sqlx, used in production
/// - [`InMemoryUserStore`]: process-local maps, used by tests and for running
///   the server without a database
///
/// Token operations are per-row (`push_token`, `remove_token`,
/// `clear_tokens`) rather than whole-record rewrites, so two sessions of the
/// same user logging in and out concurrently do not clobber each other's
/// tokens.

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    task::{NewTask, Task},
    user::{NewUser, User, UserChanges},
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another user already has this email
    #[error("Email already exists")]
    DuplicateEmail,

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Anything else the backing store reported
    #[error("Store error: {0}")]
    Internal(String),
}

/// Persistence operations for users and the entities they own
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user with an empty token list and no avatar
    ///
    /// Fails with `StoreError::DuplicateEmail` when the email is taken.
    async fn create_user(&self, data: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Looks up a user by their normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Finds the user with this id only if `token` is among their active tokens
    async fn find_by_id_and_token(&self, id: Uuid, token: &str)
        -> Result<Option<User>, StoreError>;

    /// Applies the `Some` fields of `changes`; returns `None` if the user is gone
    async fn update_user(&self, id: Uuid, changes: UserChanges)
        -> Result<Option<User>, StoreError>;

    /// Appends a token to the user's list; returns false if the user is gone
    async fn push_token(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError>;

    /// Removes one token; returns whether anything was removed
    async fn remove_token(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError>;

    /// Removes every token of the user; returns how many were removed
    async fn clear_tokens(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Sets or clears the avatar; returns false if the user is gone
    async fn set_avatar(&self, user_id: Uuid, avatar: Option<Vec<u8>>)
        -> Result<bool, StoreError>;

    /// Returns the avatar bytes, `None` for unknown users or users without one
    async fn find_avatar(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, StoreError>;

    /// Deletes the user row (tokens and avatar go with it); returns false if absent
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_task(&self, data: NewTask) -> Result<Task, StoreError>;

    async fn tasks_owned_by(&self, owner_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Deletes every task owned by the user; returns how many were deleted
    async fn delete_tasks_owned_by(&self, owner_id: Uuid) -> Result<u64, StoreError>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}
