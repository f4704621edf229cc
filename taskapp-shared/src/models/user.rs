/// User model
///
/// A user owns a password hash, an ordered list of active session tokens, an
/// optional avatar image, and any number of tasks.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE user_tokens (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token TEXT NOT NULL,
///     UNIQUE (user_id, token)
/// );
/// ```
///
/// The avatar is not part of [`User`]; it is read and written on its own
/// through the store so profile reads never drag image bytes along.
///
/// # Serialization
///
/// `User` serializes to its public profile. `password_hash` and `tokens` are
/// never written to JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// User account as loaded from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Trimmed display name
    pub name: String,

    /// Trimmed, lowercased email address; unique across users
    pub email: String,

    /// Argon2id PHC hash of the trimmed password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Non-negative age, 0 when never set
    pub age: i32,

    /// Active session tokens in issue order
    #[serde(skip_serializing)]
    pub tokens: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether `token` is one of this user's active sessions
    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

/// Input for creating a new user
///
/// Fields are expected to be normalized and the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
}

/// Field changes for an existing user
///
/// Only `Some` fields are written. Values must already be normalized.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.age.is_none()
    }
}
