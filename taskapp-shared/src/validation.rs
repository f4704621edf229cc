/// Field validation and normalization for account data
///
/// Every user-supplied field passes through here before it reaches the store.
/// Normalizers return the canonical form that gets persisted (trimmed name,
/// trimmed lowercase email) or a [`FieldError`] describing the problem.
///
/// Errors are collected rather than short-circuited so a registration request
/// with several bad fields reports all of them at once.
///
/// # Example
///
/// ```
/// use taskapp_shared::validation::normalize_email;
///
/// assert_eq!(normalize_email("  Ann@Example.COM ").unwrap(), "ann@example.com");
/// assert!(normalize_email("not-an-email").is_err());
/// ```

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field as it appears in request bodies
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// One or more field errors for a single request
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed for: {}", field_names(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn field_names(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Creates an error with a single field failure
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Whether a given field has at least one error
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Trims a display name, rejecting empty results
pub fn normalize_name(name: &str) -> Result<String, FieldError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new("name", "Name is required"));
    }
    Ok(trimmed.to_string())
}

/// Trims and lowercases an email address, then checks its format
///
/// Lowercasing here is what makes the unique index on `email` behave
/// case-insensitively.
pub fn normalize_email(email: &str) -> Result<String, FieldError> {
    let normalized = email.trim().to_lowercase();
    if !normalized.validate_email() {
        return Err(FieldError::new("email", "Email is invalid"));
    }
    Ok(normalized)
}

/// Checks an age and narrows it to the stored integer width
pub fn validate_age(age: i64) -> Result<i32, FieldError> {
    if age < 0 {
        return Err(FieldError::new("age", "Age must be a positive number"));
    }
    i32::try_from(age).map_err(|_| FieldError::new("age", "Age is out of range"))
}
