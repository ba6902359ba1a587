/// SMTP notifier implementation.
use crate::config::EmailSettings;
use crate::error::{IdentityError, Result};
use crate::services::notifier::{mask_email, Notifier, NotifyPurpose};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailNotifier {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    password_reset_base_url: Option<String>,
    email_change_base_url: Option<String>,
}

impl EmailNotifier {
    /// Build the notifier from configuration.
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only). Useful for
    /// development and testing without email infrastructure.
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| IdentityError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email notifier will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| {
                IdentityError::Internal(format!("Failed to configure SMTP transport: {}", e))
            })?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            password_reset_base_url: config.password_reset_base_url.clone(),
            email_change_base_url: config.email_change_base_url.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    fn build_link(base_url: &Option<String>, token: &str) -> String {
        match base_url {
            Some(base) => format!("{}?token={}", base.trim_end_matches('/'), token),
            None => token.to_string(),
        }
    }

    fn compose(&self, purpose: NotifyPurpose, value: &str) -> (&'static str, String) {
        match purpose {
            NotifyPurpose::RegistrationCode => (
                "Your verification code",
                format!(
                    "Welcome!\n\nYour verification code is: {}\n\nEnter it to activate your account. \
                    If you did not register, please ignore this email.",
                    value
                ),
            ),
            NotifyPurpose::PasswordReset => {
                let link = Self::build_link(&self.password_reset_base_url, value);
                (
                    "Password reset request",
                    format!(
                        "We received your password reset request.\n\n\
                        Use the following link to choose a new password:\n{}\n\n\
                        The link expires shortly. If you did not request this, \
                        please ignore this email.",
                        link
                    ),
                )
            }
            NotifyPurpose::EmailChange => {
                let link = Self::build_link(&self.email_change_base_url, value);
                (
                    "Confirm your new email address",
                    format!(
                        "A request was made to move an account to this address.\n\n\
                        Confirm the change with the following link:\n{}\n\n\
                        If you did not request this, please ignore this email.",
                        link
                    ),
                )
            }
        }
    }

    async fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(
                recipient = %mask_email(recipient),
                subject = subject,
                "SMTP disabled; email not sent"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| IdentityError::Internal(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| IdentityError::Internal(format!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| IdentityError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(
        &self,
        account_id: Uuid,
        recipient: &str,
        purpose: NotifyPurpose,
        value: &str,
    ) -> Result<()> {
        let (subject, body) = self.compose(purpose, value);
        self.send_mail(recipient, subject, &body).await?;

        info!(
            account_id = %account_id,
            recipient = %mask_email(recipient),
            purpose = purpose.as_str(),
            "Notification dispatched"
        );

        Ok(())
    }
}
