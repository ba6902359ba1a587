/// Account repository. Every read path excludes soft-deleted rows.
use crate::error::Result;
use crate::models::Account;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Find account by email, case-insensitively (excluding soft-deleted)
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Find account by ID (excluding soft-deleted)
pub async fn find_by_id(pool: &PgPool, account_id: Uuid) -> Result<Option<Account>> {
    let account =
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1 AND deleted_at IS NULL")
            .bind(account_id)
            .fetch_optional(pool)
            .await?;

    Ok(account)
}

/// Find account by ID inside a transaction, locking the row so operations
/// on the same account linearize.
pub async fn find_by_id_for_update(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
) -> Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(account_id)
    .fetch_optional(tx.as_mut())
    .await?;

    Ok(account)
}

/// Check if email is taken (excluding soft-deleted)
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL)",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Insert a student account. Students start unverified, with the code number
/// the allocator just issued. Part of the registration transaction.
pub async fn create_student(
    tx: &mut Transaction<'_, Postgres>,
    full_name: &str,
    email: &str,
    password_hash: &str,
    code_number: i32,
) -> Result<Account> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (full_name, email, role, status, code_number, is_verified, password_hash)
        VALUES ($1, LOWER($2), 'student', 'active', $3, FALSE, $4)
        RETURNING *
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(code_number)
    .bind(password_hash)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(account)
}

/// Insert an admin account. Admins start verified and carry no code number.
pub async fn create_admin(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Account> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (full_name, email, role, status, is_verified, password_hash)
        VALUES ($1, LOWER($2), 'admin', 'active', TRUE, $3)
        RETURNING *
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

/// Flip the verification flag; runs in the same transaction as the code
/// consumption.
pub async fn mark_verified(tx: &mut Transaction<'_, Postgres>, account_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET is_verified = TRUE, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(account_id)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

/// Overwrite the public code number (resend draws a fresh one).
pub async fn update_code_number(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    code_number: i32,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET code_number = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(account_id)
    .bind(code_number)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

/// Replace the password hash. Returns affected rows so callers can detect a
/// vanished (deleted) account inside the transaction.
pub async fn update_password(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    password_hash: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET password_hash = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(account_id)
    .bind(password_hash)
    .execute(tx.as_mut())
    .await?;

    Ok(result.rows_affected())
}

/// Re-check email uniqueness inside a transaction (email-change confirm).
pub async fn email_exists_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL)",
    )
    .bind(email)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(exists)
}

/// Swap the email address (email-change confirmation).
pub async fn update_email(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    new_email: &str,
) -> Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET email = LOWER($2), updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(account_id)
    .bind(new_email)
    .fetch_optional(tx.as_mut())
    .await?;

    Ok(account)
}

/// Stamp a successful login
pub async fn touch_last_login(pool: &PgPool, account_id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE accounts SET last_login_at = CURRENT_TIMESTAMP WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(account_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update the display name
pub async fn update_full_name(
    pool: &PgPool,
    account_id: Uuid,
    full_name: &str,
) -> Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET full_name = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(account_id)
    .bind(full_name)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Soft delete. Accounts are never hard-deleted; returns affected rows.
pub async fn soft_delete(pool: &PgPool, account_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET deleted_at = CURRENT_TIMESTAMP,
            status = 'inactive',
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(account_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
