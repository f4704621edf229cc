/// Session and credential manager
///
/// Owns the whole token lifecycle on top of a [`UserStore`]:
///
/// ```text
/// issue_token ──> active ──> revoke_token / revoke_all_tokens / user deleted
///                   │
///                   └─ validate_token succeeds only while the exact token
///                      string is still in the user's token list
/// ```
///
/// Tokens never expire on their own. A signed token whose string is no
/// longer stored is rejected exactly like a forged one.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskapp_shared::auth::session::SessionManager;
/// use taskapp_shared::store::InMemoryUserStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sessions = SessionManager::new(Arc::new(InMemoryUserStore::new()), "secret");
///
/// let mut user = sessions.verify_credentials("a@x.com", "mypw1234").await?;
/// let token = sessions.issue_token(&mut user).await?;
///
/// let same_user = sessions.validate_token(&token).await?;
/// assert_eq!(same_user.id, user.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::{jwt, password};
use crate::models::user::User;
use crate::store::{StoreError, UserStore};
use crate::validation::ValidationError;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Unable to login")]
    InvalidCredentials,

    /// Any token that does not map to a live session
    #[error("Please authenticate.")]
    NotAuthenticated,

    /// Plaintext password breaks the password rules
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Password(#[from] password::PasswordError),

    #[error(transparent)]
    Token(#[from] jwt::JwtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Password verification and session token bookkeeping
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn UserStore>,
    secret: Arc<str>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn UserStore>, secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            secret: secret.into(),
        }
    }

    /// The store this manager reads and writes sessions through
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Validates a plaintext password and hashes its trimmed form
    ///
    /// Rule violations are reported as a `password` field error before any
    /// hashing work is done.
    pub fn hash_password(&self, plaintext: &str) -> Result<String, SessionError> {
        let trimmed = password::validate_password(plaintext)
            .map_err(|message| ValidationError::single("password", message))?;

        Ok(password::hash_password(trimmed)?)
    }

    /// Looks a user up by email and checks their password
    ///
    /// Both "no such email" and "wrong password" yield
    /// `SessionError::InvalidCredentials`.
    #[instrument(skip(self, plaintext))]
    pub async fn verify_credentials(
        &self,
        email: &str,
        plaintext: &str,
    ) -> Result<User, SessionError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.store.find_by_email(&email).await? else {
            debug!("Login attempt for unknown email");
            return Err(SessionError::InvalidCredentials);
        };

        if !password::verify_password(plaintext, &user.password_hash)? {
            debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Issues a new session token for `user` and records it
    ///
    /// The token is appended to `user.tokens` as well as to the store.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn issue_token(&self, user: &mut User) -> Result<String, SessionError> {
        let claims = jwt::Claims::new(user.id);
        let token = jwt::create_token(&claims, &self.secret)?;

        if !self.store.push_token(user.id, &token).await? {
            // User vanished between lookup and token issue
            return Err(SessionError::NotAuthenticated);
        }
        user.tokens.push(token.clone());

        info!(sessions = user.tokens.len(), "Issued session token");
        Ok(token)
    }

    /// Resolves a token to the user owning that live session
    ///
    /// Every failure (bad signature, malformed token, deleted user, revoked
    /// token, store outage) is reported as `SessionError::NotAuthenticated`;
    /// the cause is only logged.
    pub async fn validate_token(&self, token: &str) -> Result<User, SessionError> {
        let claims = jwt::decode_token(token, &self.secret).map_err(|e| {
            debug!(error = %e, "Rejected token");
            SessionError::NotAuthenticated
        })?;

        match self.store.find_by_id_and_token(claims.sub, token).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                debug!(user_id = %claims.sub, "Token not in any active session");
                Err(SessionError::NotAuthenticated)
            }
            Err(e) => {
                error!(error = %e, "Store failure while validating token");
                Err(SessionError::NotAuthenticated)
            }
        }
    }

    /// Ends one session; removing a token that is not there is a no-op
    #[instrument(skip(self, user, token), fields(user_id = %user.id))]
    pub async fn revoke_token(&self, user: &mut User, token: &str) -> Result<(), SessionError> {
        user.tokens.retain(|t| t != token);
        let removed = self.store.remove_token(user.id, token).await?;

        debug!(removed, "Revoked session token");
        Ok(())
    }

    /// Ends every session of `user`
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn revoke_all_tokens(&self, user: &mut User) -> Result<(), SessionError> {
        user.tokens.clear();
        let removed = self.store.clear_tokens(user.id).await?;

        info!(removed, "Revoked all session tokens");
        Ok(())
    }
}
