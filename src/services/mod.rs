/// Service layer for the identity core
///
/// Business logic over the repositories:
/// - Pillar allocator (unique code numbers under concurrency)
/// - Registration + verification-code engine
/// - Secret-token engine (password reset, email change)
/// - Credential gate (login)
/// - Account-store operations (admin creation, password change, profile,
///   soft delete)
/// - Notifier contract + SMTP implementation
pub mod accounts;
pub mod email;
pub mod email_change;
pub mod login;
pub mod notifier;
pub mod password_reset;
pub mod pillar_allocator;
pub mod registration;

pub use accounts::AccountService;
pub use email::EmailNotifier;
pub use email_change::{EmailChangeRequested, EmailChangeService};
pub use login::CredentialGate;
pub use notifier::{NoopNotifier, Notifier, NotifyPurpose};
pub use password_reset::{PasswordResetRequested, PasswordResetService, RESET_ACK};
pub use pillar_allocator::{PillarAllocator, MAX_ALLOCATION_ATTEMPTS};
pub use registration::RegistrationService;
