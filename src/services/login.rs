/// Credential gate.
use crate::db;
use crate::error::{IdentityError, Result};
use crate::models::{AccountPublic, LoginRequest};
use crate::security;
use crate::services::notifier::mask_email;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct CredentialGate {
    db: PgPool,
}

impl CredentialGate {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Validate login credentials.
    ///
    /// Absent account and wrong password are deliberately indistinguishable
    /// (`InvalidCredentials`); a non-active account stays in the same kind
    /// family; an unverified student gets the distinct `NotVerified`. On
    /// success, stamps `last_login_at` and returns the public view.
    pub async fn validate(&self, request: LoginRequest) -> Result<AccountPublic> {
        request.validate()?;

        let mut account = db::accounts::find_by_email(&self.db, &request.email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let password_matches =
            security::verify_password(&request.password, &account.password_hash)?;
        account.gate_credentials(password_matches)?;

        let now = Utc::now();
        if let Err(err) = db::accounts::touch_last_login(&self.db, account.id).await {
            warn!(
                account_id = %account.id,
                error = %err,
                "Failed to stamp last_login_at"
            );
        } else {
            account.last_login_at = Some(now);
        }

        info!(
            account_id = %account.id,
            email = %mask_email(&account.email),
            "Login successful"
        );

        Ok(account.into())
    }
}
