use crate::error::{IdentityError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Account role matching database account_role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "account_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Student,
    Admin,
    MainAdmin,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Student => "student",
            AccountRole::Admin => "admin",
            AccountRole::MainAdmin => "main_admin",
        }
    }
}

/// Account status matching database account_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "account_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
    Blocked,
}

/// Account - core identity entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: AccountRole,
    pub status: AccountStatus,
    /// Unique public code number, present only for students
    pub code_number: Option<i32>,
    pub is_verified: bool,
    pub password_hash: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Check if account is soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_student(&self) -> bool {
        self.role == AccountRole::Student
    }

    /// Credential-gate decision, given the outcome of the slow hash compare.
    ///
    /// Absent account and wrong password collapse into the same
    /// `InvalidCredentials`; a non-active status stays in that kind family
    /// with a distinguishable message; only the unverified-student gate is a
    /// distinct kind. Admins skip the verification gate.
    pub fn gate_credentials(&self, password_matches: bool) -> Result<()> {
        if !password_matches {
            return Err(IdentityError::InvalidCredentials);
        }

        if self.status != AccountStatus::Active {
            return Err(IdentityError::AccountNotActive);
        }

        if self.is_student() && !self.is_verified {
            return Err(IdentityError::NotVerified);
        }

        Ok(())
    }
}

/// Public projection of an account; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountPublic {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub code_number: Option<i32>,
    pub is_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountPublic {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            full_name: account.full_name,
            email: account.email,
            role: account.role,
            status: account.status,
            code_number: account.code_number,
            is_verified: account.is_verified,
            last_login_at: account.last_login_at,
            created_at: account.created_at,
        }
    }
}

/// Student registration request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = crate::validators::validate_full_name_validator))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Admin account creation request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(custom(function = crate::validators::validate_full_name_validator))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: AccountRole,
}

/// Authenticated password change request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 256))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}
