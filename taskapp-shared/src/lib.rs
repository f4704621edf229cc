//! # taskapp shared library
//!
//! Domain logic for the taskapp account backend, used by the `taskapp-api`
//! server.
//!
//! ## Module Organization
//!
//! - `models`: users and tasks
//! - `validation`: field normalization and validation errors
//! - `store`: persistence trait with PostgreSQL and in-memory implementations
//! - `auth`: password hashing, session tokens, auth middleware
//! - `accounts`: registration, profile updates, deletion, avatars
//! - `avatar`: avatar image processing
//! - `notify`: transactional email
//! - `db`: connection pool and migrations

pub mod accounts;
pub mod auth;
pub mod avatar;
pub mod db;
pub mod models;
pub mod notify;
pub mod store;
pub mod validation;

/// Current version of the taskapp shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
