/// Registration and verification-code engine.
///
/// Issues registration codes (the code value is the account's freshly
/// allocated pillar number), verifies supplied codes against the newest
/// active row, and handles resends.
use crate::config::VerificationSettings;
use crate::db;
use crate::error::{IdentityError, Result};
use crate::models::{AccountPublic, CodeAttempt, CodePurpose, RegisterRequest};
use crate::security;
use crate::services::notifier::{self, Notifier, NotifyPurpose};
use crate::services::pillar_allocator::PillarAllocator;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct RegistrationService {
    db: PgPool,
    allocator: PillarAllocator,
    notifier: Arc<dyn Notifier>,
    settings: VerificationSettings,
}

impl RegistrationService {
    pub fn new(
        db: PgPool,
        allocator: PillarAllocator,
        notifier: Arc<dyn Notifier>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            db,
            allocator,
            notifier,
            settings,
        }
    }

    /// Register a new student account.
    ///
    /// Allocates the account's code number and issues a verification code
    /// equal to it, in one transaction; the notification goes out only after
    /// commit.
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountPublic> {
        request.validate()?;

        if db::accounts::email_exists(&self.db, &request.email).await? {
            return Err(IdentityError::AlreadyExists("Email".to_string()));
        }

        let code_number = self.allocator.allocate().await?;
        let password_hash = security::hash_password(&request.password)?;
        let expires_at = Utc::now() + Duration::hours(self.settings.code_ttl_hours);

        let mut tx = self.db.begin().await?;
        let account = db::accounts::create_student(
            &mut tx,
            &request.full_name,
            &request.email,
            &password_hash,
            code_number,
        )
        .await?;
        db::verification_codes::insert(
            &mut tx,
            account.id,
            &code_number.to_string(),
            CodePurpose::Registration,
            expires_at,
        )
        .await?;
        tx.commit().await?;

        info!(
            account_id = %account.id,
            email = %notifier::mask_email(&account.email),
            "Student registered"
        );

        notifier::dispatch(
            self.notifier.as_ref(),
            account.id,
            &account.email,
            NotifyPurpose::RegistrationCode,
            &code_number.to_string(),
        )
        .await;

        Ok(account.into())
    }

    /// Verify a supplied registration code.
    ///
    /// Idempotent for already-verified accounts: returns success without
    /// touching any code row. Otherwise applies the retry state machine and
    /// flips the account flag in the same transaction as the consumption.
    pub async fn verify(&self, account_id: Uuid, supplied_code: &str) -> Result<AccountPublic> {
        // Lock the account row up front: concurrent verifies for the same
        // account serialize here, and the loser sees the verified flag
        // instead of a spurious missing-code failure.
        let mut tx = self.db.begin().await?;
        let mut account = db::accounts::find_by_id_for_update(&mut tx, account_id)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Account".to_string()))?;

        if account.is_verified {
            info!(account_id = %account.id, "Account already verified; verify is a no-op");
            return Ok(account.into());
        }

        let code = db::verification_codes::find_active_for_update(
            &mut tx,
            account.id,
            CodePurpose::Registration,
        )
        .await?
        .ok_or(IdentityError::NoActiveCode)?;

        let now = Utc::now();
        let (updated, outcome) = code.register_attempt(supplied_code, now);
        db::verification_codes::apply_attempt(&mut tx, &updated).await?;

        match outcome {
            CodeAttempt::Match => {
                db::accounts::mark_verified(&mut tx, account.id).await?;
                tx.commit().await?;

                info!(account_id = %account.id, "Account verified");
                account.is_verified = true;
                Ok(account.into())
            }
            CodeAttempt::Mismatch { exhausted } => {
                // The retry increment (and burn, on the final attempt) must
                // survive the failed call.
                tx.commit().await?;

                if exhausted {
                    warn!(
                        account_id = %account.id,
                        "Verification retries exhausted; code burned"
                    );
                    Err(IdentityError::RetriesExhausted)
                } else {
                    Err(IdentityError::InvalidCode)
                }
            }
        }
    }

    /// Invalidate any outstanding code and issue a fresh one.
    ///
    /// Draws a NEW permanent code number and overwrites the account's code
    /// field with it; the old number is abandoned for good. The fresh
    /// verification code equals the new number.
    pub async fn resend_code(&self, account_id: Uuid) -> Result<AccountPublic> {
        let mut account = db::accounts::find_by_id(&self.db, account_id)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Account".to_string()))?;

        if account.is_verified {
            return Err(IdentityError::InvalidArgument(
                "account is already verified".to_string(),
            ));
        }
        if !account.is_student() {
            return Err(IdentityError::InvalidArgument(
                "only student accounts carry a code number".to_string(),
            ));
        }

        let code_number = self.allocator.allocate().await?;
        let expires_at = Utc::now() + Duration::hours(self.settings.code_ttl_hours);

        let mut tx = self.db.begin().await?;
        db::verification_codes::burn_active(&mut tx, account.id, CodePurpose::Registration)
            .await?;
        db::accounts::update_code_number(&mut tx, account.id, code_number).await?;
        db::verification_codes::insert(
            &mut tx,
            account.id,
            &code_number.to_string(),
            CodePurpose::Registration,
            expires_at,
        )
        .await?;
        tx.commit().await?;

        info!(account_id = %account.id, "Verification code reissued");

        notifier::dispatch(
            self.notifier.as_ref(),
            account.id,
            &account.email,
            NotifyPurpose::RegistrationCode,
            &code_number.to_string(),
        )
        .await;

        account.code_number = Some(code_number);
        Ok(account.into())
    }
}
