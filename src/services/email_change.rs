/// Email-change flow of the secret-token engine.
///
/// Unlike the anonymous password-reset request, this flow runs behind the
/// upstream authenticator, so an old-email mismatch surfaces `NotFound`
/// rather than a generic acknowledgement.
use crate::config::TokenSettings;
use crate::db;
use crate::error::{IdentityError, Result};
use crate::models::{
    AccountPublic, ConfirmEmailChangeRequest, RequestEmailChangeRequest, TokenPurpose,
};
use crate::security::secret;
use crate::services::notifier::{self, Notifier, NotifyPurpose};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Result of an email-change request: the external token destined for the
/// new address.
#[derive(Debug)]
pub struct EmailChangeRequested {
    pub token: String,
}

#[derive(Clone)]
pub struct EmailChangeService {
    db: PgPool,
    notifier: Arc<dyn Notifier>,
    settings: TokenSettings,
}

impl EmailChangeService {
    pub fn new(db: PgPool, notifier: Arc<dyn Notifier>, settings: TokenSettings) -> Self {
        Self {
            db,
            notifier,
            settings,
        }
    }

    /// Start an email change for an account.
    ///
    /// The caller-supplied old email must match the account's current one.
    /// Issuing a token burns any other active email-change token, so at most
    /// one change is ever in progress per account.
    pub async fn request(
        &self,
        account_id: Uuid,
        request: RequestEmailChangeRequest,
    ) -> Result<EmailChangeRequested> {
        request.validate()?;

        let account = db::accounts::find_by_id(&self.db, account_id)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Account".to_string()))?;

        if !account.email.eq_ignore_ascii_case(&request.old_email) {
            return Err(IdentityError::NotFound("Account".to_string()));
        }

        if account.email.eq_ignore_ascii_case(&request.new_email) {
            return Err(IdentityError::InvalidArgument(
                "new email is the same as the current one".to_string(),
            ));
        }

        if db::accounts::email_exists(&self.db, &request.new_email).await? {
            return Err(IdentityError::AlreadyExists("Email".to_string()));
        }

        let generated = secret::generate();
        let secret_hash = secret::hash_secret(&generated.secret)?;
        let expires_at = Utc::now() + Duration::minutes(self.settings.email_change_ttl_minutes);

        let mut tx = self.db.begin().await?;
        db::secret_tokens::burn_outstanding(&mut tx, account.id, TokenPurpose::EmailChange)
            .await?;
        db::secret_tokens::insert(
            &mut tx,
            generated.token_id,
            account.id,
            &secret_hash,
            TokenPurpose::EmailChange,
            Some(&request.new_email),
            expires_at,
        )
        .await?;
        tx.commit().await?;

        let external = secret::format_external(generated.token_id, &generated.secret);

        info!(
            account_id = %account.id,
            new_email = %notifier::mask_email(&request.new_email),
            "Email change token issued"
        );

        notifier::dispatch(
            self.notifier.as_ref(),
            account.id,
            &request.new_email,
            NotifyPurpose::EmailChange,
            &external,
        )
        .await;

        Ok(EmailChangeRequested { token: external })
    }

    /// Confirm an email change with an external token.
    ///
    /// Re-checks that the pending address is still unique before swapping;
    /// the swap and the token consumption commit together.
    pub async fn confirm(&self, request: ConfirmEmailChangeRequest) -> Result<AccountPublic> {
        request.validate()?;

        let (token_id, supplied_secret) = secret::parse_external(&request.token)?;

        let mut tx = self.db.begin().await?;
        let token = db::secret_tokens::find_usable_for_update(
            &mut tx,
            token_id,
            TokenPurpose::EmailChange,
        )
        .await?
        .ok_or(IdentityError::InvalidToken)?;

        if !secret::verify_secret(supplied_secret, &token.secret_hash)? {
            return Err(IdentityError::InvalidToken);
        }

        let new_email = token
            .new_email
            .as_deref()
            .ok_or_else(|| IdentityError::Internal("email-change token missing payload".into()))?;

        if db::accounts::email_exists_in_tx(&mut tx, new_email).await? {
            return Err(IdentityError::AlreadyExists("Email".to_string()));
        }

        let account = db::accounts::update_email(&mut tx, token.account_id, new_email)
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        db::secret_tokens::mark_used(&mut tx, token.id).await?;
        tx.commit().await?;

        info!(account_id = %account.id, "Email change confirmed");
        Ok(account.into())
    }
}
