//! Request DTOs
//!
//! Field-level validation runs here via `validator`; the auth service then
//! applies the domain credential policy on top.

use serde::Deserialize;
use validator::Validate;

use classchat_core::{DomainError, Role};

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: String,

    #[validate(length(min = 6, max = 128, message = "password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 2, max = 64, message = "display name must be 2-64 characters"))]
    pub display_name: String,

    pub role: Role,
}

impl RegisterRequest {
    /// Create a request
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            display_name: display_name.into(),
            role,
        }
    }

    /// Run field validation, mapping failures onto the domain taxonomy
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|errors| DomainError::WeakCredentials(first_message(&errors)))
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl LoginRequest {
    /// Create a request
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Run field validation; empty fields read as bad credentials
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate().map_err(|_| DomainError::InvalidCredentials)
    }
}

/// Flatten a validator error set into its first human-readable message
fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .filter_map(|err| err.message.as_ref())
        .map(std::string::ToString::to_string)
        .next()
        .unwrap_or_else(|| "invalid credentials".to_string())
}
