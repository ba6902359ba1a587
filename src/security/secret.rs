/// Token-secret generation and the external `tokenId.secret` format.
///
/// The stored hash is Argon2 (slow, salted, non-deterministic per call), so
/// it can never serve as a lookup key; rows are found by the public token id
/// and the secret is verified afterwards.
use crate::error::{IdentityError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use uuid::Uuid;

/// Entropy of the secret half of an external token.
pub const SECRET_BYTES: usize = 32;

const SEPARATOR: char = '.';

/// A freshly generated token: public id plus the one-and-only plaintext
/// secret. The secret must reach the requester and nothing else.
#[derive(Debug)]
pub struct GeneratedSecret {
    pub token_id: Uuid,
    pub secret: String,
}

/// Generate a token id and a URL-safe secret.
pub fn generate() -> GeneratedSecret {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    GeneratedSecret {
        token_id: Uuid::new_v4(),
        secret: URL_SAFE_NO_PAD.encode(bytes),
    }
}

/// Hash a secret for storage (Argon2, PHC format).
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| IdentityError::Internal(format!("Secret hashing failed: {}", e)))?
        .to_string();

    Ok(hash)
}

/// Verify a secret against its stored hash. `Ok(false)` on mismatch.
pub fn verify_secret(secret: &str, secret_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(secret_hash)
        .map_err(|e| IdentityError::Internal(format!("Invalid secret hash format: {}", e)))?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Internal(format!(
            "Secret verification failed: {}",
            e
        ))),
    }
}

/// Build the caller-facing `tokenId.secret` string.
pub fn format_external(token_id: Uuid, secret: &str) -> String {
    format!("{}{}{}", token_id, SEPARATOR, secret)
}

/// Split and parse an external token. Any malformed input is `InvalidToken`;
/// the caller learns nothing about which half was wrong.
pub fn parse_external(raw: &str) -> Result<(Uuid, &str)> {
    let (id_part, secret_part) = raw.split_once(SEPARATOR).ok_or(IdentityError::InvalidToken)?;

    if secret_part.is_empty() {
        return Err(IdentityError::InvalidToken);
    }

    let token_id = Uuid::parse_str(id_part).map_err(|_| IdentityError::InvalidToken)?;

    Ok((token_id, secret_part))
}
