/// Campus Identity Service Library
///
/// Issues and validates short-lived, single-use secrets bound to accounts
/// (registration verification codes, password-reset and email-change tokens)
/// and allocates unique account code numbers under concurrent write load.
/// Transport, session issuance and caller authentication are the embedding
/// service's concern.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: Database repositories (accounts, codes, tokens, pillar trackers)
/// - `error`: Error taxonomy
/// - `models`: Data models and pure state transitions
/// - `security`: Password hashing, token-secret primitives
/// - `services`: Business logic (allocator, registration, resets, login)
/// - `telemetry`: Tracing setup
/// - `validators`: Input validation
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;
pub mod telemetry;
pub mod validators;

// Re-export commonly used types
pub use error::{IdentityError, Result};
pub use models::{Account, AccountPublic, AccountRole, AccountStatus};

#[cfg(test)]
mod tests;
