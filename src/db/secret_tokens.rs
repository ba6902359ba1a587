/// Secret-token repository.
///
/// Rows are found by the public token id, never by hash (the hash is Argon2,
/// non-deterministic per call). Expiry is evaluated at read time.
use crate::error::Result;
use crate::models::{SecretToken, TokenPurpose};
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Insert a new token row. Only the secret's hash is persisted.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    token_id: Uuid,
    account_id: Uuid,
    secret_hash: &str,
    purpose: TokenPurpose,
    new_email: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<SecretToken> {
    let row = sqlx::query_as::<_, SecretToken>(
        r#"
        INSERT INTO secret_tokens (id, account_id, secret_hash, purpose, new_email, expires_at, used)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        RETURNING *
        "#,
    )
    .bind(token_id)
    .bind(account_id)
    .bind(secret_hash)
    .bind(purpose)
    .bind(new_email)
    .bind(expires_at)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(row)
}

/// Fetch an unused, unexpired token by id, locking the row so two concurrent
/// confirmations cannot both succeed.
pub async fn find_usable_for_update(
    tx: &mut Transaction<'_, Postgres>,
    token_id: Uuid,
    purpose: TokenPurpose,
) -> Result<Option<SecretToken>> {
    let row = sqlx::query_as::<_, SecretToken>(
        r#"
        SELECT * FROM secret_tokens
        WHERE id = $1
          AND purpose = $2
          AND used = FALSE
          AND expires_at > CURRENT_TIMESTAMP
        FOR UPDATE
        "#,
    )
    .bind(token_id)
    .bind(purpose)
    .fetch_optional(tx.as_mut())
    .await?;

    Ok(row)
}

/// Mark a token used. Returns affected rows (0 when already used).
pub async fn mark_used(tx: &mut Transaction<'_, Postgres>, token_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE secret_tokens
        SET used = TRUE, used_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND used = FALSE
        "#,
    )
    .bind(token_id)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected())
}

/// Invalidate every outstanding token for an account+purpose: at most one
/// live reset-in-progress per account.
pub async fn burn_outstanding(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    purpose: TokenPurpose,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE secret_tokens
        SET used = TRUE, used_at = CURRENT_TIMESTAMP
        WHERE account_id = $1
          AND purpose = $2
          AND used = FALSE
        "#,
    )
    .bind(account_id)
    .bind(purpose)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected())
}
