// Password hashing and strength policy for the credential store

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::auth::error::AuthError;
use crate::auth::models::IdentityError;

/// Minimum password length enforced by the strength policy
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash a password using Argon2id (PHC string format)
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored Argon2id hash
///
/// Mismatch is `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash =
        argon2::PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(AuthError::PasswordHash),
    }
}

/// Check a candidate password against the store's strength policy
///
/// Every failed rule is reported, so the caller can surface all problems
/// at once. An empty result means the password is acceptable.
pub fn validate_strength(password: &str) -> Vec<IdentityError> {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(IdentityError::new(
            "PasswordTooShort",
            format!(
                "Passwords must be at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(IdentityError::new(
            "PasswordRequiresLower",
            "Passwords must have at least one lowercase letter ('a'-'z').",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(IdentityError::new(
            "PasswordRequiresUpper",
            "Passwords must have at least one uppercase letter ('A'-'Z').",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(IdentityError::new(
            "PasswordRequiresDigit",
            "Passwords must have at least one digit ('0'-'9').",
        ));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(IdentityError::new(
            "PasswordRequiresNonAlphanumeric",
            "Passwords must have at least one non alphanumeric character.",
        ));
    }

    errors
}
