/// Verification-code repository.
///
/// Lookup always targets the most recently created active code for an
/// account+purpose; stale rows are left behind and age out by expiry.
use crate::error::Result;
use crate::models::{CodePurpose, VerificationCode, MAX_CODE_ATTEMPTS};
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Insert a fresh code row (retry_count 0, unconsumed).
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    code: &str,
    purpose: CodePurpose,
    expires_at: DateTime<Utc>,
) -> Result<VerificationCode> {
    let row = sqlx::query_as::<_, VerificationCode>(
        r#"
        INSERT INTO verification_codes (account_id, code, purpose, expires_at, retry_count)
        VALUES ($1, $2, $3, $4, 0)
        RETURNING *
        "#,
    )
    .bind(account_id)
    .bind(code)
    .bind(purpose)
    .bind(expires_at)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(row)
}

/// Fetch the newest active code for an account+purpose, locking the row so
/// concurrent verification attempts serialize on it.
pub async fn find_active_for_update(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    purpose: CodePurpose,
) -> Result<Option<VerificationCode>> {
    let row = sqlx::query_as::<_, VerificationCode>(
        r#"
        SELECT * FROM verification_codes
        WHERE account_id = $1
          AND purpose = $2
          AND consumed_at IS NULL
          AND expires_at > CURRENT_TIMESTAMP
          AND retry_count < $3
        ORDER BY created_at DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(account_id)
    .bind(purpose)
    .bind(MAX_CODE_ATTEMPTS)
    .fetch_optional(tx.as_mut())
    .await?;

    Ok(row)
}

/// Persist the outcome of `VerificationCode::register_attempt`.
pub async fn apply_attempt(
    tx: &mut Transaction<'_, Postgres>,
    code: &VerificationCode,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE verification_codes
        SET retry_count = $2, consumed_at = $3
        WHERE id = $1
        "#,
    )
    .bind(code.id)
    .bind(code.retry_count)
    .bind(code.consumed_at)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

/// Consume every outstanding code for an account+purpose (resend path).
pub async fn burn_active(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    purpose: CodePurpose,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE verification_codes
        SET consumed_at = CURRENT_TIMESTAMP
        WHERE account_id = $1
          AND purpose = $2
          AND consumed_at IS NULL
        "#,
    )
    .bind(account_id)
    .bind(purpose)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected())
}
