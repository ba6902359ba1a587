/// Pure unit tests for the identity core (no database required)
///
/// Exercises the verification-code state machine, the pillar sequence, the
/// secret-token lifecycle and the credential gate at the model layer.
use crate::error::IdentityError;
use crate::models::{
    sub_pillar_base, AccountStatus, CodeAttempt, PillarTracker, MAX_CODE_ATTEMPTS,
    PILLAR_CAPACITY,
};
use crate::security::{password, secret};
use crate::tests::fixtures::*;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

// ============================================================================
// Verification-code state machine
// ============================================================================

#[test]
fn test_burned_code_rejects_the_correct_value() {
    // GIVEN: An active code
    let now = Utc::now();
    let mut code = active_code("560001");

    // WHEN: Three wrong attempts land
    for i in 1..=MAX_CODE_ATTEMPTS {
        assert!(code.is_active(now), "code must stay active before attempt {}", i);
        let (updated, outcome) = code.register_attempt("000000", now);
        code = updated;
        match outcome {
            CodeAttempt::Mismatch { exhausted } => {
                assert_eq!(exhausted, i == MAX_CODE_ATTEMPTS);
            }
            CodeAttempt::Match => panic!("wrong value must never match"),
        }
    }

    // THEN: The code is consumed; even the correct value can never be tried,
    // because the active lookup excludes it.
    assert_eq!(code.retry_count, MAX_CODE_ATTEMPTS);
    assert!(code.consumed_at.is_some());
    assert!(!code.is_active(now));
}

#[test]
fn test_successful_attempt_after_two_failures() {
    let now = Utc::now();
    let mut code = active_code("560001");

    for _ in 0..2 {
        let (updated, _) = code.register_attempt("999999", now);
        code = updated;
    }
    assert!(code.is_active(now));

    // The third attempt with the right value still wins.
    let (code, outcome) = code.register_attempt("560001", now);
    assert_eq!(outcome, CodeAttempt::Match);
    assert!(code.consumed_at.is_some());
}

#[test]
fn test_consumption_is_permanent() {
    // Consumed is consumed, whether by success or exhaustion; there is no
    // transition out of it.
    let now = Utc::now();
    let (consumed, _) = active_code("560001").register_attempt("560001", now);
    assert!(!consumed.is_active(now));
    assert!(!consumed.is_active(now + chrono::Duration::hours(48)));
}

// ============================================================================
// Pillar allocation
// ============================================================================

#[test]
fn test_partition_yields_distinct_codes_until_exhaustion() {
    let base = sub_pillar_base(5, 6);
    let mut tracker = fresh_tracker(base);
    let mut seen = std::collections::HashSet::new();

    while let Some((next, issued)) = tracker.clone().issue_next() {
        assert!(seen.insert(issued), "number {} issued twice", issued);
        tracker = next;
    }

    assert_eq!(seen.len(), PILLAR_CAPACITY as usize);
    assert!(tracker.is_exhausted());
}

#[tokio::test]
async fn test_concurrent_allocations_are_distinct() {
    // GIVEN: A shared tracker table guarded the way the row lock guards it
    let trackers: Arc<Mutex<HashMap<i32, PillarTracker>>> = Arc::new(Mutex::new(HashMap::new()));
    let mut handles = Vec::new();

    // WHEN: 200 tasks allocate concurrently across two partitions
    for i in 0..200u32 {
        let trackers = Arc::clone(&trackers);
        handles.push(tokio::spawn(async move {
            let base = if i % 2 == 0 {
                sub_pillar_base(1, 0)
            } else {
                sub_pillar_base(9, 9)
            };
            // Lock held only for the read-increment-write, as in the row lock.
            let mut table = trackers.lock().await;
            let tracker = table.remove(&base).unwrap_or_else(|| fresh_tracker(base));
            let (tracker, issued) = tracker.issue_next().expect("partition far from full");
            table.insert(base, tracker);
            issued
        }));
    }

    let mut issued = Vec::new();
    for handle in handles {
        issued.push(handle.await.expect("allocation task panicked"));
    }

    // THEN: All 200 codes are distinct
    let unique: std::collections::HashSet<_> = issued.iter().copied().collect();
    assert_eq!(unique.len(), issued.len());
}

// ============================================================================
// Secret-token lifecycle
// ============================================================================

#[test]
fn test_confirm_twice_fails() {
    // GIVEN: A valid external token
    let generated = secret::generate();
    let hash = secret::hash_secret(&generated.secret).expect("hashing should succeed");
    let token = reset_token(&hash);
    let external = secret::format_external(generated.token_id, &generated.secret);

    // WHEN: The first confirmation verifies and consumes it
    let now = Utc::now();
    let (_, supplied) = secret::parse_external(&external).expect("token should parse");
    assert!(token.is_usable(now));
    assert!(secret::verify_secret(supplied, &token.secret_hash).unwrap());
    let token = token.mark_used(now);

    // THEN: The second confirmation finds no usable row
    assert!(!token.is_usable(now));
}

#[test]
fn test_wrong_secret_is_indistinguishable_from_absent_row() {
    // Both paths must surface InvalidToken; here we check the verify half.
    let generated = secret::generate();
    let hash = secret::hash_secret(&generated.secret).unwrap();
    assert!(!secret::verify_secret("forged-secret", &hash).unwrap());

    // And the parse half for garbage input.
    assert!(matches!(
        secret::parse_external("garbage"),
        Err(IdentityError::InvalidToken)
    ));
}

#[test]
fn test_external_token_shape() {
    // Scenario: requestPasswordReset returns "T.S"
    let generated = secret::generate();
    let external = secret::format_external(generated.token_id, &generated.secret);

    let (id_part, secret_part) = external.split_once('.').expect("external token has a dot");
    assert_eq!(id_part, generated.token_id.to_string());
    assert_eq!(secret_part.len(), 43); // 32 bytes, URL-safe base64, no padding
}

// ============================================================================
// Credential gate
// ============================================================================

#[test]
fn test_login_scenarios() {
    let hash = password::hash_password(TEST_PASSWORD).expect("hashing should succeed");

    // Correct email, wrong password -> InvalidCredentials
    let mut account = student_account(true);
    account.password_hash = hash.clone();
    let matches = password::verify_password("WrongPassword123!", &account.password_hash).unwrap();
    assert!(matches!(
        account.gate_credentials(matches),
        Err(IdentityError::InvalidCredentials)
    ));

    // Correct password but unverified student -> NotVerified
    let mut unverified = student_account(false);
    unverified.password_hash = hash.clone();
    let matches = password::verify_password(TEST_PASSWORD, &unverified.password_hash).unwrap();
    assert!(matches!(
        unverified.gate_credentials(matches),
        Err(IdentityError::NotVerified)
    ));

    // Correct password, verified, but BLOCKED -> InvalidCredentials family
    let mut blocked = account_with_status(AccountStatus::Blocked);
    blocked.password_hash = hash.clone();
    let matches = password::verify_password(TEST_PASSWORD, &blocked.password_hash).unwrap();
    let err = blocked.gate_credentials(matches).unwrap_err();
    assert_eq!(err.kind(), "INVALID_CREDENTIALS");

    // Everything in order -> success
    let mut ok = student_account(true);
    ok.password_hash = hash;
    let matches = password::verify_password(TEST_PASSWORD, &ok.password_hash).unwrap();
    assert!(ok.gate_credentials(matches).is_ok());
}

#[test]
fn test_admin_login_skips_verification_gate() {
    let mut account = admin_account();
    account.is_verified = false;
    assert!(account.gate_credentials(true).is_ok());
}
