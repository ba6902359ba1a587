/// Password hashing and verification using Argon2id
use crate::error::{IdentityError, Result};
use crate::validators;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id.
///
/// Enforces strength before hashing: composition rules plus a zxcvbn
/// entropy floor. Returns a PHC-formatted hash string safe for storage.
pub fn hash_password(password: &str) -> Result<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; only a malformed hash or a backend
/// failure is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| IdentityError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(IdentityError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if !validators::validate_password_composition(password) {
        return Err(IdentityError::WeakPassword(
            "Password must mix uppercase, lowercase and digits".to_string(),
        ));
    }

    if !validators::validate_password_entropy(password) {
        return Err(IdentityError::WeakPassword(
            "Password is too predictable; use a stronger one".to_string(),
        ));
    }

    Ok(())
}
