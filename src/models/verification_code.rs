use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// A code is burned after this many wrong attempts.
pub const MAX_CODE_ATTEMPTS: i32 = 3;

/// Purpose of a verification code, matching database code_purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "code_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CodePurpose {
    Registration,
    EmailChange,
}

/// One-time verification code bound to an account.
///
/// Codes are stored in the clear: they are short-lived and delivered
/// out-of-band. Expiry is a read-time computation, never written back.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerificationCode {
    pub id: Uuid,
    pub account_id: Uuid,
    pub code: String,
    pub purpose: CodePurpose,
    pub expires_at: DateTime<Utc>,
    pub retry_count: i32,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a verification attempt against an active code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeAttempt {
    /// Supplied value matched; the code is now consumed.
    Match,
    /// Supplied value did not match. When `exhausted`, this was the final
    /// allowed attempt and the code is now consumed (burned).
    Mismatch { exhausted: bool },
}

impl VerificationCode {
    /// valid ⇔ consumedAt == null ∧ now < expiresAt ∧ retryCount < 3
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && now < self.expires_at && self.retry_count < MAX_CODE_ATTEMPTS
    }

    /// Apply one verification attempt, returning the updated record and the
    /// outcome. Must only be called on an active code; a consumed code never
    /// transitions again.
    pub fn register_attempt(mut self, supplied: &str, now: DateTime<Utc>) -> (Self, CodeAttempt) {
        debug_assert!(self.is_active(now));

        if supplied == self.code {
            self.consumed_at = Some(now);
            return (self, CodeAttempt::Match);
        }

        self.retry_count += 1;
        let exhausted = self.retry_count >= MAX_CODE_ATTEMPTS;
        if exhausted {
            self.consumed_at = Some(now);
        }
        (self, CodeAttempt::Mismatch { exhausted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active_code(code: &str) -> VerificationCode {
        let now = Utc::now();
        VerificationCode {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            code: code.to_string(),
            purpose: CodePurpose::Registration,
            expires_at: now + Duration::hours(24),
            retry_count: 0,
            consumed_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_match_consumes_the_code() {
        let code = active_code("560001");
        let now = Utc::now();

        let (updated, outcome) = code.register_attempt("560001", now);

        assert_eq!(outcome, CodeAttempt::Match);
        assert_eq!(updated.consumed_at, Some(now));
        assert!(!updated.is_active(now));
    }

    #[test]
    fn test_mismatch_increments_retries() {
        let code = active_code("560001");
        let now = Utc::now();

        let (updated, outcome) = code.register_attempt("999999", now);

        assert_eq!(outcome, CodeAttempt::Mismatch { exhausted: false });
        assert_eq!(updated.retry_count, 1);
        assert!(updated.consumed_at.is_none());
        assert!(updated.is_active(now));
    }

    #[test]
    fn test_third_mismatch_burns_the_code() {
        // GIVEN: A code that has already been tried twice
        let mut code = active_code("560001");
        code.retry_count = 2;
        let now = Utc::now();

        // WHEN: The third wrong attempt lands
        let (updated, outcome) = code.register_attempt("000000", now);

        // THEN: The code is consumed and can never be tried a fourth time
        assert_eq!(outcome, CodeAttempt::Mismatch { exhausted: true });
        assert_eq!(updated.retry_count, MAX_CODE_ATTEMPTS);
        assert!(updated.consumed_at.is_some());
        assert!(!updated.is_active(now));
    }

    #[test]
    fn test_retry_exhaustion_implies_consumption() {
        // Invariant: retry_count == 3 always comes with consumed_at set.
        let mut code = active_code("123456");
        code.retry_count = 2;
        let (updated, _) = code.register_attempt("000000", Utc::now());
        assert!(updated.retry_count < MAX_CODE_ATTEMPTS || updated.consumed_at.is_some());
    }

    #[test]
    fn test_expiry_is_a_read_time_computation() {
        let mut code = active_code("560001");
        code.expires_at = Utc::now() - Duration::seconds(1);
        assert!(!code.is_active(Utc::now()));
        // Nothing was written to make it inactive.
        assert!(code.consumed_at.is_none());
        assert_eq!(code.retry_count, 0);
    }
}
