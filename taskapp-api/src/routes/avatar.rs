/// Avatar endpoints
///
/// - `POST /users/me/avatar` - multipart upload in the `avatar` field
/// - `DELETE /users/me/avatar` - remove the caller's avatar
/// - `GET /users/:id/avatar` - public download as `image/png`
/// - `GET /users/me/avatar` - always 404, since `me` is not a user id

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use bytes::Bytes;
use taskapp_shared::{
    auth::middleware::AuthContext,
    avatar::{AvatarError, AVATAR_CONTENT_TYPE},
};
use tracing::debug;
use uuid::Uuid;

/// Multipart field carrying the image
pub const AVATAR_FIELD: &str = "avatar";

/// Upload or replace the caller's avatar
///
/// # Errors
///
/// - `400 Bad Request`: `{"error": "..."}` for a missing field, a file that
///   is not a jpg/jpeg/png, a file over 1 MB, or undecodable image data
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<StatusCode> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        debug!(filename = %filename, bytes = data.len(), "Received avatar upload");

        state
            .accounts
            .set_avatar(&auth.user, &filename, data.to_vec())
            .await?;
        return Ok(StatusCode::OK);
    }

    Err(AvatarError::UnsupportedFile.into())
}

/// Remove the caller's avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.accounts.clear_avatar(&auth.user).await?;
    Ok(StatusCode::OK)
}

/// Serve a user's avatar as PNG; 404 with an empty body when there is none
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;

    let png = state.accounts.avatar(user_id).await?;

    Ok(([(header::CONTENT_TYPE, AVATAR_CONTENT_TYPE)], Bytes::from(png)))
}

/// `GET /users/me/avatar`; "me" never names a user, so this is the same
/// empty 404 as any other unknown id
pub async fn get_own_avatar() -> ApiError {
    ApiError::NotFound
}
