/// Authentication middleware for Axum
///
/// Resolves the `Authorization: Bearer <token>` header to a live session and
/// adds an [`AuthContext`] to the request extensions. Every way of failing
/// (missing header, wrong scheme, bad signature, revoked token, deleted
/// user) produces the same `401 {"error":"Please authenticate."}` response.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskapp_shared::auth::middleware::{session_auth, AuthContext};
/// use taskapp_shared::auth::session::SessionManager;
///
/// async fn me(Extension(auth): Extension<AuthContext>) -> String {
///     auth.user.name
/// }
///
/// fn routes(sessions: SessionManager) -> Router {
///     Router::new()
///         .route("/users/me", get(me))
///         .layer(middleware::from_fn_with_state(sessions, session_auth))
/// }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use super::session::SessionManager;
use crate::models::user::User;

/// Authentication context added to request extensions
///
/// Carries the authenticated user and the exact token of this request, so
/// logout can revoke precisely this session.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub token: String,
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat,

    /// Token did not resolve to an active session
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        debug!(reason = ?self, "Rejected unauthenticated request");

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Please authenticate." })),
        )
            .into_response()
    }
}

/// Pulls the bearer token out of the request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Session authentication middleware
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn session_auth(
    State(sessions): State<SessionManager>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?.to_string();

    let user = sessions
        .validate_token(&token)
        .await
        .map_err(|_| AuthError::InvalidToken)?;

    req.extensions_mut().insert(AuthContext { user, token });

    Ok(next.run(req).await)
}
