//! Configuration management for the identity core.
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Duration;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub verification: VerificationSettings,
    pub tokens: TokenSettings,
    pub email: EmailSettings,
}

impl Settings {
    /// Load settings from environment variables (and .env in development).
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            verification: VerificationSettings::from_env()?,
            tokens: TokenSettings::from_env()?,
            email: EmailSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }

    /// Build the connection pool from these settings.
    pub async fn connect_pool(&self) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout))
            .connect(&self.url)
            .await
            .context("Failed to connect to Postgres")
    }
}

/// Verification-code settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerificationSettings {
    /// Registration code lifetime in hours
    pub code_ttl_hours: i64,
}

impl VerificationSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            code_ttl_hours: env::var("VERIFICATION_CODE_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("Invalid VERIFICATION_CODE_TTL_HOURS")?,
        })
    }
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self { code_ttl_hours: 24 }
    }
}

/// Secret-token settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Password-reset token lifetime in minutes
    pub password_reset_ttl_minutes: i64,
    /// Email-change token lifetime in minutes
    pub email_change_ttl_minutes: i64,
}

impl TokenSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            password_reset_ttl_minutes: env::var("PASSWORD_RESET_TTL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid PASSWORD_RESET_TTL_MINUTES")?,
            email_change_ttl_minutes: env::var("EMAIL_CHANGE_TTL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid EMAIL_CHANGE_TTL_MINUTES")?,
        })
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            password_reset_ttl_minutes: 60,
            email_change_ttl_minutes: 60,
        }
    }
}

/// Email delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
    pub password_reset_base_url: Option<String>,
    pub email_change_base_url: Option<String>,
}

impl EmailSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@campus.local".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            password_reset_base_url: env::var("PASSWORD_RESET_BASE_URL").ok(),
            email_change_base_url: env::var("EMAIL_CHANGE_BASE_URL").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_settings_default() {
        let settings = VerificationSettings::default();
        assert_eq!(settings.code_ttl_hours, 24);
    }

    #[test]
    fn test_token_settings_from_env() {
        env::set_var("PASSWORD_RESET_TTL_MINUTES", "30");

        let settings = TokenSettings::from_env().unwrap();

        assert_eq!(settings.password_reset_ttl_minutes, 30);
        assert_eq!(settings.email_change_ttl_minutes, 60); // Default

        env::remove_var("PASSWORD_RESET_TTL_MINUTES");
    }

    #[test]
    fn test_database_settings_from_env() {
        env::set_var("DATABASE_URL", "postgres://localhost/identity_test");
        env::set_var("DATABASE_MAX_CONNECTIONS", "40");

        let settings = DatabaseSettings::from_env().unwrap();

        assert_eq!(settings.url, "postgres://localhost/identity_test");
        assert_eq!(settings.max_connections, 40);
        assert_eq!(settings.min_connections, 2); // Default

        env::remove_var("DATABASE_URL");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
    }
}
