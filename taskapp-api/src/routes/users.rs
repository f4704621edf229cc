/// User and session endpoints
///
/// # Endpoints
///
/// - `POST /users` - Register, returns `201 {user, token}`
/// - `POST /users/login` - Log in, returns `{user, token}`
/// - `POST /users/logout` - End the current session
/// - `POST /users/logoutAll` - End every session of the caller
/// - `GET /users/me` - The caller's profile
/// - `PATCH /users/me` - Update name, email, password or age
/// - `DELETE /users/me` - Delete the account and everything it owns

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use taskapp_shared::{
    accounts::{NewAccount, ProfileUpdate},
    auth::middleware::AuthContext,
    models::user::User,
};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

/// A user together with a freshly issued session token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Register a new user
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// { "name": "Ann", "email": "ann@example.com", "password": "mypw1234", "age": 30 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or the email is taken
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(account) = payload?;

    let (user, token) = state.accounts.register(account).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Log in with email and password
///
/// # Errors
///
/// - `400 Bad Request`: `{"error":"Unable to login"}` for any credential mismatch
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;

    let (user, token) = state.accounts.login(&req.email, &req.password).await?;

    Ok(Json(AuthResponse { user, token }))
}

/// Revoke the token used for this request
pub async fn logout(
    State(state): State<AppState>,
    Extension(mut auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.sessions.revoke_token(&mut auth.user, &auth.token).await?;
    Ok(StatusCode::OK)
}

/// Revoke every token of the caller
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(mut auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.sessions.revoke_all_tokens(&mut auth.user).await?;
    Ok(StatusCode::OK)
}

pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// Update the caller's profile
///
/// Only `name`, `email`, `password` and `age` may be sent; any other key
/// rejects the whole request with `{"error":"Invalid updates!"}` before
/// anything is changed.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(fields) = payload?;

    let update = ProfileUpdate::from_fields(fields)?;
    let user = state.accounts.update_profile(&auth.user, update).await?;

    Ok(Json(user))
}

/// Delete the caller's account and owned tasks; returns the former record
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = state.accounts.delete_account(&auth.user).await?;
    Ok(Json(user))
}
