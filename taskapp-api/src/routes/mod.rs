/// API route handlers
///
/// - `health`: Health check endpoint
/// - `users`: Registration, sessions and the caller's profile
/// - `avatar`: Avatar upload, removal and download

pub mod avatar;
pub mod health;
pub mod users;
