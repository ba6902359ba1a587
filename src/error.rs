use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

/// Error taxonomy for the identity core.
///
/// Everything except `Database` and `Internal` is an expected, recoverable
/// outcome that the boundary layer maps to a user-facing response via
/// `kind()` / `as_parts()`.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Verification attempts exhausted; request a new code")]
    RetriesExhausted,

    #[error("No active verification code")]
    NoActiveCode,

    #[error("Invalid email or password")]
    InvalidCredentials,

    // Same kind family as InvalidCredentials, distinguishable message.
    #[error("Account is not active")]
    AccountNotActive,

    #[error("Account is not verified")]
    NotVerified,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Code space exhausted; no partition yielded a free slot")]
    CapacityExhausted,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Stable machine-readable kind for the boundary layer.
    pub fn kind(&self) -> &'static str {
        match self {
            IdentityError::AlreadyExists(_) => "ALREADY_EXISTS",
            IdentityError::NotFound(_) => "NOT_FOUND",
            IdentityError::InvalidCode => "INVALID_CODE",
            IdentityError::RetriesExhausted => "RETRIES_EXHAUSTED",
            IdentityError::NoActiveCode => "NO_ACTIVE_CODE",
            IdentityError::InvalidCredentials | IdentityError::AccountNotActive => {
                "INVALID_CREDENTIALS"
            }
            IdentityError::NotVerified => "NOT_VERIFIED",
            IdentityError::InvalidToken => "INVALID_TOKEN",
            IdentityError::CapacityExhausted => "CAPACITY_EXHAUSTED",
            IdentityError::InvalidArgument(_)
            | IdentityError::WeakPassword(_)
            | IdentityError::Validation(_) => "INVALID_ARGUMENT",
            IdentityError::Database(_) | IdentityError::Internal(_) => "INTERNAL",
        }
    }

    /// `(kind, message)` pair; internal detail never leaks into the message.
    pub fn as_parts(&self) -> (&'static str, String) {
        let message = match self {
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (self.kind(), message)
    }

    /// True for outcomes a caller can recover from without operator attention.
    pub fn is_expected(&self) -> bool {
        !matches!(
            self,
            IdentityError::Database(_)
                | IdentityError::Internal(_)
                | IdentityError::CapacityExhausted
        )
    }
}

impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        // Unique-index races (email, code_number) surface as AlreadyExists;
        // the constraint is the second line of defense behind the
        // service-level checks.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return IdentityError::AlreadyExists("Resource".to_string());
            }
        }
        tracing::error!(error = %err, "Database error");
        IdentityError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for IdentityError {
    fn from(err: validator::ValidationErrors) -> Self {
        IdentityError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_a_kind() {
        assert_eq!(
            IdentityError::InvalidCredentials.kind(),
            IdentityError::AccountNotActive.kind()
        );
        assert_ne!(
            IdentityError::InvalidCredentials.to_string(),
            IdentityError::AccountNotActive.to_string()
        );
    }

    #[test]
    fn test_internal_detail_never_reaches_the_message() {
        let (kind, message) = IdentityError::Database("connection refused".into()).as_parts();
        assert_eq!(kind, "INTERNAL");
        assert!(!message.contains("connection refused"));
    }

    #[test]
    fn test_capacity_exhaustion_is_operational() {
        assert!(!IdentityError::CapacityExhausted.is_expected());
        assert!(IdentityError::InvalidCode.is_expected());
    }
}
