/// Avatar image processing
///
/// Uploaded avatars are checked by file name and size, decoded, squashed to
/// a fixed 250x250 square and stored as PNG regardless of the input format.
/// Decoding is CPU-bound; callers on the async runtime should run
/// [`process_avatar`] through `tokio::task::spawn_blocking`.

use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat, ImageReader};

/// Largest accepted upload, in bytes
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Width and height of every stored avatar
pub const AVATAR_SIZE: u32 = 250;

/// File name endings accepted for upload
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Content type of processed avatars
pub const AVATAR_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("Please upload an image")]
    UnsupportedFile,

    #[error("File too large")]
    TooLarge,

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode avatar: {0}")]
    Encode(String),
}

/// Checks the upload's file name and size before any decoding
pub fn check_upload(filename: &str, len: usize) -> Result<(), AvatarError> {
    let lower = filename.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return Err(AvatarError::UnsupportedFile);
    }
    if len > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge);
    }
    Ok(())
}

/// Validates, resizes and re-encodes an uploaded avatar.
/// Returns PNG bytes of exactly `AVATAR_SIZE` x `AVATAR_SIZE`.
pub fn process_avatar(filename: &str, data: &[u8]) -> Result<Vec<u8>, AvatarError> {
    check_upload(filename, data.len())?;

    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AvatarError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| AvatarError::Decode(e.to_string()))?;

    // Scale to cover the square, then crop the centre
    let resized = img.resize_to_fill(AVATAR_SIZE, AVATAR_SIZE, FilterType::Triangle);

    let mut buf = Cursor::new(Vec::new());
    resized
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AvatarError::Encode(e.to_string()))?;

    Ok(buf.into_inner())
}
