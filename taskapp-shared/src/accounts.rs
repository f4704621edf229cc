/// Account lifecycle: registration, profile updates, deletion and avatars
///
/// The steps that a document store would run as save/remove hooks happen
/// explicitly here: passwords are hashed before the user is written, and a
/// user's tasks are deleted before the user is.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskapp_shared::accounts::{AccountService, NewAccount};
/// use taskapp_shared::auth::session::SessionManager;
/// use taskapp_shared::notify::{FakeMailer, Notifier, DEFAULT_FROM};
/// use taskapp_shared::store::InMemoryUserStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(InMemoryUserStore::new());
/// let sessions = SessionManager::new(store.clone(), "secret");
/// let notifier = Notifier::new(Arc::new(FakeMailer::new()), DEFAULT_FROM);
/// let accounts = AccountService::new(store, sessions, notifier);
///
/// let (user, token) = accounts
///     .register(NewAccount {
///         name: "Ann".into(),
///         email: "ann@example.com".into(),
///         password: "mypw1234".into(),
///         age: None,
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::password::validate_password;
use crate::auth::session::{SessionError, SessionManager};
use crate::avatar::{self, AvatarError};
use crate::models::user::{NewUser, User, UserChanges};
use crate::notify::Notifier;
use crate::store::{StoreError, UserStore};
use crate::validation::{
    normalize_email, normalize_name, validate_age, FieldError, ValidationError,
};

/// Fields a user may change on their own profile
pub const ALLOWED_UPDATES: &[&str] = &["name", "email", "password", "age"];

const DUPLICATE_EMAIL: &str = "Email is already registered";

/// Error type for account operations
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Update body named a field outside [`ALLOWED_UPDATES`]
    #[error("Invalid updates!")]
    InvalidUpdates,

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Avatar(#[from] AvatarError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Registration request body
///
/// Missing fields deserialize to empty values so they are reported as
/// field errors rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub age: Option<i64>,
}

/// A partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i64>,
}

impl ProfileUpdate {
    /// Builds an update from a raw JSON object
    ///
    /// Any key outside [`ALLOWED_UPDATES`] rejects the whole update with
    /// `AccountError::InvalidUpdates`; wrongly typed values are validation
    /// errors.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, AccountError> {
        if let Some(key) = fields
            .keys()
            .find(|key| !ALLOWED_UPDATES.contains(&key.as_str()))
        {
            warn!(field = %key, "Rejected update of disallowed field");
            return Err(AccountError::InvalidUpdates);
        }

        let mut errors = ValidationError::default();
        for (key, value) in &fields {
            let error = match key.as_str() {
                // A null age leaves the stored age as it is
                "age" if value.is_null() || value.is_i64() || value.is_u64() => None,
                "age" => Some(format!("Invalid value for {}", key)),
                _ if value.is_string() => None,
                // The remaining fields are required and cannot be cleared
                _ if value.is_null() => Some(required_message(key)),
                _ => Some(format!("Invalid value for {}", key)),
            };
            if let Some(message) = error {
                errors.push(FieldError::new(key.as_str(), message));
            }
        }
        errors.into_result()?;

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| ValidationError::single("body", e.to_string()).into())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.age.is_none()
    }
}

/// Account operations shared by the HTTP handlers
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    sessions: SessionManager,
    notifier: Notifier,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, sessions: SessionManager, notifier: Notifier) -> Self {
        Self {
            store,
            sessions,
            notifier,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Creates a user, starts their first session and sends the welcome email
    ///
    /// All field problems are reported together.
    #[instrument(skip(self, account))]
    pub async fn register(&self, account: NewAccount) -> Result<(User, String), AccountError> {
        let mut errors = ValidationError::default();

        let name = normalize_name(&account.name).map_err(|e| errors.push(e)).ok();
        let email = normalize_email(&account.email).map_err(|e| errors.push(e)).ok();
        let age = validate_age(account.age.unwrap_or(0))
            .map_err(|e| errors.push(e))
            .ok();
        if let Err(message) = validate_password(&account.password) {
            errors.push(FieldError::new("password", message));
        }

        let (Some(name), Some(email), Some(age)) = (name, email, age) else {
            return Err(errors.into());
        };
        errors.into_result()?;

        let password_hash = self.sessions.hash_password(&account.password)?;

        let mut user = self
            .store
            .create_user(NewUser {
                name,
                email,
                password_hash,
                age,
            })
            .await
            .map_err(map_duplicate_email)?;

        let token = self.sessions.issue_token(&mut user).await?;
        self.notifier.send_welcome(&user.email, &user.name);

        info!(user_id = %user.id, "Registered user");
        Ok((user, token))
    }

    /// Checks credentials and starts a new session
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AccountError> {
        let mut user = self.sessions.verify_credentials(email, password).await?;
        let token = self.sessions.issue_token(&mut user).await?;
        Ok((user, token))
    }

    /// Applies a validated partial update to `user`'s profile
    #[instrument(skip(self, user, update), fields(user_id = %user.id))]
    pub async fn update_profile(
        &self,
        user: &User,
        update: ProfileUpdate,
    ) -> Result<User, AccountError> {
        if update.is_empty() {
            return Ok(user.clone());
        }

        let mut errors = ValidationError::default();
        let mut changes = UserChanges::default();

        if let Some(name) = &update.name {
            changes.name = normalize_name(name).map_err(|e| errors.push(e)).ok();
        }
        if let Some(email) = &update.email {
            changes.email = normalize_email(email).map_err(|e| errors.push(e)).ok();
        }
        if let Some(age) = update.age {
            changes.age = validate_age(age).map_err(|e| errors.push(e)).ok();
        }
        if let Some(password) = &update.password {
            if let Err(message) = validate_password(password) {
                errors.push(FieldError::new("password", message));
            }
        }
        errors.into_result()?;

        if let Some(password) = &update.password {
            changes.password_hash = Some(self.sessions.hash_password(password)?);
        }

        let updated = self
            .store
            .update_user(user.id, changes)
            .await
            .map_err(map_duplicate_email)?
            .ok_or(AccountError::NotFound)?;

        info!("Updated profile");
        Ok(updated)
    }

    /// Deletes the user's tasks, then the user, then sends the goodbye email
    ///
    /// Returns the record as it was before deletion.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete_account(&self, user: &User) -> Result<User, AccountError> {
        let tasks = self.store.delete_tasks_owned_by(user.id).await?;

        if !self.store.delete_user(user.id).await? {
            return Err(AccountError::NotFound);
        }
        self.notifier.send_cancellation(&user.email, &user.name);

        info!(tasks, "Deleted account");
        Ok(user.clone())
    }

    /// Processes and stores an uploaded avatar
    #[instrument(skip(self, user, data), fields(user_id = %user.id, bytes = data.len()))]
    pub async fn set_avatar(
        &self,
        user: &User,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<(), AccountError> {
        avatar::check_upload(filename, data.len())?;

        let filename = filename.to_string();
        let png = tokio::task::spawn_blocking(move || avatar::process_avatar(&filename, &data))
            .await
            .map_err(|e| AccountError::Internal(format!("Avatar task failed: {}", e)))??;

        if !self.store.set_avatar(user.id, Some(png)).await? {
            return Err(AccountError::NotFound);
        }
        Ok(())
    }

    pub async fn clear_avatar(&self, user: &User) -> Result<(), AccountError> {
        if !self.store.set_avatar(user.id, None).await? {
            return Err(AccountError::NotFound);
        }
        Ok(())
    }

    /// PNG bytes of a user's avatar; `NotFound` for unknown users and users without one
    pub async fn avatar(&self, user_id: Uuid) -> Result<Vec<u8>, AccountError> {
        self.store
            .find_avatar(user_id)
            .await?
            .ok_or(AccountError::NotFound)
    }
}

fn required_message(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("{}{} is required", first.to_uppercase(), chars.as_str()),
        None => "Field is required".to_string(),
    }
}

fn map_duplicate_email(err: StoreError) -> AccountError {
    match err {
        StoreError::DuplicateEmail => ValidationError::single("email", DUPLICATE_EMAIL).into(),
        other => other.into(),
    }
}
