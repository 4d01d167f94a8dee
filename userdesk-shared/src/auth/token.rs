/// Session token generation and validation
///
/// Stateless HS256 tokens carry the session: a short-lived access token used
/// on every request and a long-lived refresh token exchanged for new access
/// tokens. There is no server-side session record; deactivated accounts are
/// cut off by the status gate, which re-reads the user's status from the
/// store on each request.
///
/// # Example
///
/// ```
/// use userdesk_shared::auth::token::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-key-of-at-least-32-bytes!!";
/// let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
///
/// let token = create_token(&claims, secret)?;
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "userdesk";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to create a token
    #[error("failed to create token: {0}")]
    Create(String),

    /// Token failed validation (bad signature, wrong type, malformed)
    #[error("failed to validate token: {0}")]
    Validation(String),

    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("invalid token issuer")]
    InvalidIssuer,
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived, 24 hours)
    Access,

    /// Refresh token (long-lived, 30 days)
    Refresh,
}

impl TokenType {
    /// Default lifetime for this token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }
}

/// Claims carried by a session token
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the token type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID
    pub sub: Uuid,

    /// Issuer, always "userdesk"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Access or refresh (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the token type's default expiration
    pub fn new(user_id: Uuid, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom expiration
    pub fn with_expiration(user_id: Uuid, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }

    /// Whether the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into an HS256 token
///
/// The secret should be at least 32 random bytes; the server refuses to boot
/// with a shorter one.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| TokenError::Create(e.to_string()))
}

/// Validates a token's signature, expiry, nbf, and issuer
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
        _ => TokenError::Validation(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(TokenError::Validation(
            "expected access token, got refresh token".to_string(),
        ));
    }

    Ok(claims)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(TokenError::Validation(
            "expected refresh token, got access token".to_string(),
        ));
    }

    Ok(claims)
}

/// Exchanges a valid refresh token for a new access token
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, TokenError> {
    let refresh_claims = validate_refresh_token(refresh_token, secret)?;

    let access_claims = Claims::new(refresh_claims.sub, TokenType::Access);
    create_token(&access_claims, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_default_lifetimes() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::hours(24));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(30));
    }

    #[test]
    fn test_create_and_validate_roundtrip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenType::Access);

        let token = create_token(&claims, SECRET).unwrap();
        let validated = validate_token(&token, SECRET).unwrap();

        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, ISSUER);
        assert_eq!(validated.token_type, TokenType::Access);
        assert!(!validated.is_expired());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_token(&token, "another-secret-of-sufficient-size").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            TokenType::Access,
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_type_is_enforced() {
        let refresh = Claims::new(Uuid::new_v4(), TokenType::Refresh);
        let token = create_token(&refresh, SECRET).unwrap();

        assert!(validate_refresh_token(&token, SECRET).is_ok());
        assert!(validate_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_refresh_yields_access_token_for_same_user() {
        let user_id = Uuid::new_v4();
        let refresh = Claims::new(user_id, TokenType::Refresh);
        let refresh_token = create_token(&refresh, SECRET).unwrap();

        let access_token = refresh_access_token(&refresh_token, SECRET).unwrap();
        let claims = validate_access_token(&access_token, SECRET).unwrap();

        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_access_token_cannot_refresh() {
        let access = Claims::new(Uuid::new_v4(), TokenType::Access);
        let token = create_token(&access, SECRET).unwrap();

        assert!(refresh_access_token(&token, SECRET).is_err());
    }
}
