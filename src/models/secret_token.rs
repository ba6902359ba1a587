use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Purpose of a secret token, matching database token_purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "token_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    PasswordReset,
    EmailChange,
}

/// Single-use secret token: public `id` (the lookup key) plus the Argon2 hash
/// of a high-entropy secret. The plaintext secret exists only inside the
/// external `tokenId.secret` string handed to the requester.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecretToken {
    pub id: Uuid,
    pub account_id: Uuid,
    pub secret_hash: String,
    pub purpose: TokenPurpose,
    /// Purpose-specific payload: the pending address for email changes.
    pub new_email: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SecretToken {
    /// valid ⇔ !used ∧ now < expiresAt
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }

    /// Consume the token. Once used it can never be confirmed again.
    pub fn mark_used(mut self, now: DateTime<Utc>) -> Self {
        self.used = true;
        self.used_at = Some(now);
        self
    }
}

/// Password reset initiation request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RequestPasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

/// Password reset completion request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 512))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Email change initiation request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RequestEmailChangeRequest {
    #[validate(email)]
    pub old_email: String,
    #[validate(email)]
    pub new_email: String,
}

/// Email change completion request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ConfirmEmailChangeRequest {
    #[validate(length(min = 1, max = 512))]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token() -> SecretToken {
        let now = Utc::now();
        SecretToken {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            secret_hash: "$argon2id$test".to_string(),
            purpose: TokenPurpose::PasswordReset,
            new_email: None,
            expires_at: now + Duration::hours(1),
            used: false,
            used_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_fresh_token_is_usable() {
        assert!(token().is_usable(Utc::now()));
    }

    #[test]
    fn test_used_token_is_never_usable_again() {
        let now = Utc::now();
        let used = token().mark_used(now);
        assert!(used.used);
        assert_eq!(used.used_at, Some(now));
        assert!(!used.is_usable(now));
    }

    #[test]
    fn test_expired_token_is_not_usable() {
        let mut t = token();
        t.expires_at = Utc::now() - Duration::seconds(1);
        assert!(!t.is_usable(Utc::now()));
    }
}
