/// Task model
///
/// Tasks belong to exactly one user through `owner_id`. There is no
/// `ON DELETE CASCADE` on that reference: account deletion removes a user's
/// tasks explicitly before removing the user (see
/// [`AccountService::delete_account`](crate::accounts::AccountService::delete_account)).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id),
///     description TEXT NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Task owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning user
    pub owner_id: Uuid,

    pub description: String,

    pub completed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub owner_id: Uuid,
    pub description: String,
    pub completed: bool,
}

impl NewTask {
    /// An open task with a trimmed description
    pub fn open(owner_id: Uuid, description: &str) -> Self {
        Self {
            owner_id,
            description: description.trim().to_string(),
            completed: false,
        }
    }
}
