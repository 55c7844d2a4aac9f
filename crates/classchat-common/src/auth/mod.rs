//! Credential hashing and validation

mod credentials;

pub use credentials::{
    hash_password, validate_credentials, verify_password, CredentialPolicy, PasswordService,
};
