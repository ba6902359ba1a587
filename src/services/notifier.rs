/// Outbound notification contract.
///
/// The notifier is invoked only after the owning transaction commits; a
/// failed delivery never rolls back a successful state change, and a failed
/// state change never triggers a spurious notification.
use crate::error::Result;
use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

/// What a notification carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPurpose {
    RegistrationCode,
    PasswordReset,
    EmailChange,
}

impl NotifyPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyPurpose::RegistrationCode => "registration_code",
            NotifyPurpose::PasswordReset => "password_reset",
            NotifyPurpose::EmailChange => "email_change",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a code or external token to the recipient address.
    async fn notify(
        &self,
        account_id: Uuid,
        recipient: &str,
        purpose: NotifyPurpose,
        value: &str,
    ) -> Result<()>;
}

/// Post-commit dispatch: failures are logged, never propagated to the caller.
pub async fn dispatch(
    notifier: &dyn Notifier,
    account_id: Uuid,
    recipient: &str,
    purpose: NotifyPurpose,
    value: &str,
) {
    if let Err(err) = notifier.notify(account_id, recipient, purpose, value).await {
        error!(
            account_id = %account_id,
            recipient = %mask_email(recipient),
            purpose = purpose.as_str(),
            error = %err,
            "Notification delivery failed"
        );
    }
}

/// Mask an email address for logging
pub(crate) fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let local = &email[..at_pos];
        let domain = &email[at_pos..];
        if local.len() <= 2 {
            format!("**{}", domain)
        } else {
            format!("{}***{}", &local[..1], domain)
        }
    } else {
        "***@***".to_string()
    }
}

/// Log-only notifier for development and tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(
        &self,
        account_id: Uuid,
        recipient: &str,
        purpose: NotifyPurpose,
        _value: &str,
    ) -> Result<()> {
        info!(
            account_id = %account_id,
            recipient = %mask_email(recipient),
            purpose = purpose.as_str(),
            "Notifier not configured; delivery skipped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("student@example.com"), "s***@example.com");
        assert_eq!(mask_email("ab@example.com"), "**@example.com");
        assert_eq!(mask_email("not-an-email"), "***@***");
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        struct FailingNotifier;

        #[async_trait]
        impl Notifier for FailingNotifier {
            async fn notify(
                &self,
                _account_id: Uuid,
                _recipient: &str,
                _purpose: NotifyPurpose,
                _value: &str,
            ) -> Result<()> {
                Err(crate::error::IdentityError::Internal("smtp down".into()))
            }
        }

        // Must not panic or propagate.
        dispatch(
            &FailingNotifier,
            Uuid::new_v4(),
            "student@example.com",
            NotifyPurpose::RegistrationCode,
            "560001",
        )
        .await;
    }
}
