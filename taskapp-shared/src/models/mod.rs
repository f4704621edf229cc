/// Data models for taskapp
///
/// # Models
///
/// - `user`: user accounts, including their active session tokens
/// - `task`: tasks owned by a user, removed together with their owner
///
/// Persistence lives in [`crate::store`]; the models here are plain data.

pub mod task;
pub mod user;
