/// JWT session token generation and decoding
///
/// Session tokens are HS256-signed JWTs carrying the user id. They have **no
/// expiry**: a token stays valid until it is removed from the user's token
/// list (logout / logout-all) or the user is deleted. Signature checks alone
/// are therefore not enough to accept a token; see
/// [`SessionManager::validate_token`](super::session::SessionManager::validate_token).
///
/// # Claims
///
/// - `sub`: user id
/// - `iss`: always "taskapp"
/// - `iat`: issued-at timestamp
/// - `jti`: random token id, so two tokens issued in the same second differ
///
/// # Example
///
/// ```
/// use taskapp_shared::auth::jwt::{create_token, decode_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id), "your-secret-key")?;
///
/// let claims = decode_token(&token, "your-secret-key")?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer written into and required from every token
pub const ISSUER: &str = "taskapp";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Bad signature, wrong issuer, or malformed token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "taskapp"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token ID
    pub jti: Uuid,
}

impl Claims {
    /// Creates claims for a fresh session of `user_id`
    pub fn new(user_id: Uuid) -> Self {
        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

/// Signs claims into a token string using HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a token's signature and issuer and returns its claims
///
/// Expiry is neither required nor checked.
///
/// # Errors
///
/// Returns `JwtError::ValidationError` for a bad signature, a foreign issuer,
/// missing claims, or anything that is not a JWT at all.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["sub", "iss"]);
    validation.validate_exp = false;
    validation.validate_nbf = false;

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| JwtError::ValidationError(format!("Token validation failed: {}", e)))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "taskapp");
        assert!(claims.iat <= Utc::now().timestamp());
    }

    #[test]
    fn test_create_and_decode_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let decoded = decode_token(&token, SECRET).expect("Should decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_tokens_for_same_user_are_distinct() {
        let user_id = Uuid::new_v4();
        let t1 = create_token(&Claims::new(user_id), SECRET).unwrap();
        let t2 = create_token(&Claims::new(user_id), SECRET).unwrap();

        assert_ne!(t1, t2);
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let token = create_token(&Claims::new(Uuid::new_v4()), "secret1").unwrap();

        assert!(matches!(
            decode_token(&token, "wrong-secret"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_decode_malformed_token() {
        assert!(decode_token("", SECRET).is_err());
        assert!(decode_token("not.a.jwt", SECRET).is_err());
        assert!(decode_token("garbage", SECRET).is_err());
    }

    #[test]
    fn test_decode_rejects_foreign_issuer() {
        let mut claims = Claims::new(Uuid::new_v4());
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_old_tokens_still_decode() {
        // No exp claim: a token issued years ago is still structurally valid
        let mut claims = Claims::new(Uuid::new_v4());
        claims.iat -= 5 * 365 * 24 * 3600;
        let token = create_token(&claims, SECRET).unwrap();

        assert_eq!(decode_token(&token, SECRET).unwrap().sub, claims.sub);
    }
}
