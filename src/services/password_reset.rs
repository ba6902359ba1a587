/// Password-reset flow of the secret-token engine.
use crate::config::TokenSettings;
use crate::db;
use crate::error::{IdentityError, Result};
use crate::models::{RequestPasswordResetRequest, ResetPasswordRequest, TokenPurpose};
use crate::security::{self, secret};
use crate::services::notifier::{self, Notifier, NotifyPurpose};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Acknowledgement returned regardless of whether the account exists.
pub const RESET_ACK: &str =
    "If the address is registered, a password reset message has been sent.";

/// Result of a reset request. The message shape is identical for known and
/// unknown addresses; the external token is present only when the account
/// exists, and only so the out-of-scope notifier can deliver it.
#[derive(Debug)]
pub struct PasswordResetRequested {
    pub acknowledgement: &'static str,
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct PasswordResetService {
    db: PgPool,
    notifier: Arc<dyn Notifier>,
    settings: TokenSettings,
}

impl PasswordResetService {
    pub fn new(db: PgPool, notifier: Arc<dyn Notifier>, settings: TokenSettings) -> Self {
        Self {
            db,
            notifier,
            settings,
        }
    }

    /// Request a password reset.
    ///
    /// Enumeration-safe: the acknowledgement never reveals whether the
    /// address is registered. Issuing a new token burns any outstanding one
    /// for the account, so at most one reset is ever in flight.
    pub async fn request(
        &self,
        request: RequestPasswordResetRequest,
    ) -> Result<PasswordResetRequested> {
        request.validate()?;

        let Some(account) = db::accounts::find_by_email(&self.db, &request.email).await? else {
            debug!(
                email = %notifier::mask_email(&request.email),
                "Password reset requested for unknown address"
            );
            return Ok(PasswordResetRequested {
                acknowledgement: RESET_ACK,
                token: None,
            });
        };

        let generated = secret::generate();
        let secret_hash = secret::hash_secret(&generated.secret)?;
        let expires_at = Utc::now() + Duration::minutes(self.settings.password_reset_ttl_minutes);

        let mut tx = self.db.begin().await?;
        db::secret_tokens::burn_outstanding(&mut tx, account.id, TokenPurpose::PasswordReset)
            .await?;
        db::secret_tokens::insert(
            &mut tx,
            generated.token_id,
            account.id,
            &secret_hash,
            TokenPurpose::PasswordReset,
            None,
            expires_at,
        )
        .await?;
        tx.commit().await?;

        let external = secret::format_external(generated.token_id, &generated.secret);

        info!(account_id = %account.id, "Password reset token issued");

        notifier::dispatch(
            self.notifier.as_ref(),
            account.id,
            &account.email,
            NotifyPurpose::PasswordReset,
            &external,
        )
        .await;

        Ok(PasswordResetRequested {
            acknowledgement: RESET_ACK,
            token: Some(external),
        })
    }

    /// Confirm a password reset with an external token.
    ///
    /// Absent row, expired row, used row and wrong secret all collapse into
    /// `InvalidToken`. The hash update, the token consumption and the sweep
    /// of any other outstanding tokens commit together.
    pub async fn confirm(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate()?;

        let (token_id, supplied_secret) = secret::parse_external(&request.token)?;

        let mut tx = self.db.begin().await?;
        let token = db::secret_tokens::find_usable_for_update(
            &mut tx,
            token_id,
            TokenPurpose::PasswordReset,
        )
        .await?
        .ok_or(IdentityError::InvalidToken)?;

        if !secret::verify_secret(supplied_secret, &token.secret_hash)? {
            return Err(IdentityError::InvalidToken);
        }

        let password_hash = security::hash_password(&request.new_password)?;
        let updated = db::accounts::update_password(&mut tx, token.account_id, &password_hash)
            .await?;
        if updated == 0 {
            // Account vanished (soft-deleted) since issuance.
            return Err(IdentityError::InvalidToken);
        }

        db::secret_tokens::mark_used(&mut tx, token.id).await?;
        db::secret_tokens::burn_outstanding(&mut tx, token.account_id, TokenPurpose::PasswordReset)
            .await?;
        tx.commit().await?;

        info!(account_id = %token.account_id, "Password reset confirmed");
        Ok(())
    }
}
