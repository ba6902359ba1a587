/// Security primitives for the identity core
///
/// - **password**: Argon2id password hashing with strength enforcement
/// - **secret**: token-secret generation, hashing, and the external
///   `tokenId.secret` format
pub mod password;
pub mod secret;

pub use password::{hash_password, verify_password};
pub use secret::{format_external, parse_external, GeneratedSecret};
