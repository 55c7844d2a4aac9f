//! Password hashing and registration-time credential validation
//!
//! Uses Argon2id for password hashing. Plaintext passwords never leave this
//! module: the account store only ever sees the encoded hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use classchat_core::DomainError;

use crate::error::AppError;

/// Minimum lengths enforced at registration
#[derive(Debug, Clone, Copy)]
pub struct CredentialPolicy {
    pub min_username_len: usize,
    pub min_password_len: usize,
    pub min_display_name_len: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            min_username_len: 3,
            min_password_len: 6,
            min_display_name_len: 2,
        }
    }
}

/// Hash a password using Argon2id
///
/// # Errors
/// Returns an error if hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

/// Verify a password against a stored hash
///
/// # Errors
/// Returns an error if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Validate registration credentials against a policy
///
/// # Errors
/// Returns `DomainError::WeakCredentials` naming the first violated rule
pub fn validate_credentials(
    policy: CredentialPolicy,
    username: &str,
    password: &str,
    display_name: &str,
) -> Result<(), DomainError> {
    if username.trim().len() < policy.min_username_len {
        return Err(DomainError::WeakCredentials(format!(
            "username must be at least {} characters",
            policy.min_username_len
        )));
    }

    if password.len() < policy.min_password_len {
        return Err(DomainError::WeakCredentials(format!(
            "password must be at least {} characters",
            policy.min_password_len
        )));
    }

    if display_name.trim().len() < policy.min_display_name_len {
        return Err(DomainError::WeakCredentials(format!(
            "display name must be at least {} characters",
            policy.min_display_name_len
        )));
    }

    Ok(())
}

/// Password service for dependency injection
#[derive(Debug, Clone, Default)]
pub struct PasswordService {
    policy: CredentialPolicy,
}

impl PasswordService {
    /// Create a password service with the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a password service with a custom policy
    #[must_use]
    pub fn with_policy(policy: CredentialPolicy) -> Self {
        Self { policy }
    }

    /// Hash a password
    ///
    /// # Errors
    /// Returns an error if hashing fails
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_password(password)
    }

    /// Verify a password, failing with `InvalidCredentials` on mismatch
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCredentials` if the password doesn't match
    pub fn verify_or_error(&self, password: &str, hash: &str) -> Result<(), AppError> {
        if verify_password(password, hash)? {
            Ok(())
        } else {
            Err(AppError::Domain(DomainError::InvalidCredentials))
        }
    }

    /// Validate registration fields against this service's policy
    ///
    /// # Errors
    /// Returns `DomainError::WeakCredentials` naming the violated rule
    pub fn validate(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), DomainError> {
        validate_credentials(self.policy, username, password, display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_salts_differ() {
        let hash = hash_password("abc123").unwrap();
        assert!(hash.starts_with("$argon2"));

        let hash2 = hash_password("abc123").unwrap();
        assert_ne!(hash, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("abc123").unwrap();
        assert!(verify_password("abc123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_verify_or_error() {
        let service = PasswordService::new();
        let hash = service.hash("abc123").unwrap();

        assert!(service.verify_or_error("abc123", &hash).is_ok());

        let result = service.verify_or_error("wrong", &hash);
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InvalidCredentials))
        ));
    }

    #[test]
    fn test_validate_accepts_minimal_credentials() {
        let service = PasswordService::new();
        assert!(service.validate("bob", "abc123", "Bo").is_ok());
    }

    #[test]
    fn test_validate_short_username() {
        let service = PasswordService::new();
        let result = service.validate("bo", "abc123", "Bob");
        match result {
            Err(DomainError::WeakCredentials(msg)) => assert!(msg.contains("username")),
            other => panic!("expected WeakCredentials, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_short_password() {
        let service = PasswordService::new();
        let result = service.validate("bob", "abc12", "Bob");
        match result {
            Err(DomainError::WeakCredentials(msg)) => assert!(msg.contains("password")),
            other => panic!("expected WeakCredentials, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_short_display_name() {
        let service = PasswordService::new();
        let result = service.validate("bob", "abc123", "B");
        match result {
            Err(DomainError::WeakCredentials(msg)) => assert!(msg.contains("display name")),
            other => panic!("expected WeakCredentials, got {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_username_is_rejected() {
        let service = PasswordService::new();
        assert!(service.validate("   ", "abc123", "Bob").is_err());
    }
}
