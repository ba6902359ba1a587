/// Account-store operations: admin creation, authenticated password change,
/// profile update, soft delete.
use crate::db;
use crate::error::{IdentityError, Result};
use crate::models::{AccountPublic, AccountRole, ChangePasswordRequest, CreateAdminRequest, TokenPurpose};
use crate::security;
use crate::validators;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct AccountService {
    db: PgPool,
}

impl AccountService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an admin account. Admins start verified and carry no code
    /// number. Only the `Admin` role can be minted here; students go through
    /// registration, and the main admin is provisioned operationally.
    pub async fn create_admin(&self, request: CreateAdminRequest) -> Result<AccountPublic> {
        request.validate()?;

        match request.role {
            AccountRole::Admin => {}
            AccountRole::Student => {
                return Err(IdentityError::InvalidArgument(
                    "student accounts are created through registration".to_string(),
                ));
            }
            AccountRole::MainAdmin => {
                return Err(IdentityError::InvalidArgument(
                    "the main admin account cannot be created through this path".to_string(),
                ));
            }
        }

        if db::accounts::email_exists(&self.db, &request.email).await? {
            return Err(IdentityError::AlreadyExists("Email".to_string()));
        }

        let password_hash = security::hash_password(&request.password)?;
        let account =
            db::accounts::create_admin(&self.db, &request.full_name, &request.email, &password_hash)
                .await?;

        info!(account_id = %account.id, "Admin account created");
        Ok(account.into())
    }

    /// Change a password with the current one as proof.
    ///
    /// A successful change burns any outstanding reset tokens, so a stolen
    /// reset link cannot undo it.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<()> {
        request.validate()?;

        let account = db::accounts::find_by_id(&self.db, account_id)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Account".to_string()))?;

        if !security::verify_password(&request.current_password, &account.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        let password_hash = security::hash_password(&request.new_password)?;

        let mut tx = self.db.begin().await?;
        let updated = db::accounts::update_password(&mut tx, account.id, &password_hash).await?;
        if updated == 0 {
            return Err(IdentityError::NotFound("Account".to_string()));
        }
        db::secret_tokens::burn_outstanding(&mut tx, account.id, TokenPurpose::PasswordReset)
            .await?;
        tx.commit().await?;

        info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    /// Update the display name.
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        full_name: &str,
    ) -> Result<AccountPublic> {
        if !validators::validate_full_name(full_name) {
            return Err(IdentityError::Validation("invalid full name".to_string()));
        }

        let account = db::accounts::update_full_name(&self.db, account_id, full_name)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Account".to_string()))?;

        Ok(account.into())
    }

    /// Soft-delete an account. The row stays; every core read path excludes
    /// it from then on.
    pub async fn soft_delete(&self, account_id: Uuid) -> Result<()> {
        let affected = db::accounts::soft_delete(&self.db, account_id).await?;
        if affected == 0 {
            return Err(IdentityError::NotFound("Account".to_string()));
        }

        info!(account_id = %account_id, "Account soft-deleted");
        Ok(())
    }
}
