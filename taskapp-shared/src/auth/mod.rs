/// Authentication for taskapp
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password rules
/// - [`jwt`]: signing and decoding session tokens
/// - [`session`]: session token lifecycle on top of the user store
/// - [`middleware`]: Axum middleware that resolves `Authorization: Bearer` tokens
///
/// A token is only honoured while its exact string is stored on the user, so
/// logging out (or deleting the account) invalidates it immediately even
/// though the signature stays valid.
///
/// # Example
///
/// ```no_run
/// use taskapp_shared::auth::password::{hash_password, verify_password};
/// use taskapp_shared::auth::jwt::{create_token, decode_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_secret")?;
/// assert!(verify_password("user_secret", &hash)?);
///
/// let claims = Claims::new(uuid::Uuid::new_v4());
/// let token = create_token(&claims, "secret-key")?;
/// assert_eq!(decode_token(&token, "secret-key")?.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;
