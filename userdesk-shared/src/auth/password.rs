/// Password hashing using Argon2id
///
/// Passwords are hashed with Argon2id (64 MB memory, 3 passes, 4 lanes,
/// 32-byte output) and stored as PHC strings; plaintext never reaches the
/// database. Verification is constant-time.
///
/// # Example
///
/// ```
/// use userdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("hunter2hunter2")?;
/// assert!(verify_password("hunter2hunter2", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash a password
    #[error("failed to hash password: {0}")]
    Hash(String),

    /// Failed to verify a password against a hash
    #[error("failed to verify password: {0}")]
    Verify(String),

    /// The stored hash is not a valid PHC string
    #[error("invalid password hash format: {0}")]
    InvalidHash(String),
}

// 64 MB, 3 iterations, 4 lanes, 32-byte output.
const M_COST: u32 = 65536;
const T_COST: u32 = 3;
const P_COST: u32 = 4;
const OUTPUT_LEN: usize = 32;

/// Hashes a password with Argon2id and a fresh random salt
///
/// Returns a PHC string carrying the algorithm, parameters, salt, and hash,
/// e.g. `$argon2id$v=19$m=65536,t=3,p=4$...`.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(M_COST, T_COST, P_COST, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::Hash(format!("invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password; errors are reserved for
/// malformed hashes and operational failures.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    // Parameters are read back out of the PHC string.
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e.to_string())),
    }
}

/// Validates password strength
///
/// Requires at least 8 characters with an uppercase letter, a lowercase
/// letter, a digit, and a non-alphanumeric character. The error string is
/// suitable for a field-level validation message.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_with_configured_params() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("correct horse").unwrap();

        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
        assert!(verify_password("anything", "$argon2id$broken").is_err());
    }

    #[test]
    fn test_strength_accepts_strong_passwords() {
        for password in ["MyP@ssw0rd!", "Str0ng!Pass", "S3cur3$Password"] {
            assert!(validate_password_strength(password).is_ok(), "{}", password);
        }
    }

    #[test]
    fn test_strength_names_the_missing_requirement() {
        let cases = [
            ("Sh0rt!", "8 characters"),
            ("lowercase1!", "uppercase"),
            ("UPPERCASE1!", "lowercase"),
            ("NoDigits!", "digit"),
            ("NoSpecial123", "special character"),
        ];

        for (password, fragment) in cases {
            let err = validate_password_strength(password).unwrap_err();
            assert!(err.contains(fragment), "{}: {}", password, err);
        }
    }
}
